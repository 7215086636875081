use crate::interceptor::{fold_response, ResponseChain, ResponseInterceptor};
use crate::{Error, RequestSpec, ResponseEnvelope};
use std::future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

/// Applies the response interceptors, then the success-range check, to
/// whatever the inner service returns. Errors from the inner service pass
/// through untouched.
#[derive(Clone)]
pub struct Layer {
    interceptors: ResponseChain,
}

impl Layer {
    pub fn new<I>(interceptors: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ResponseInterceptor>>,
    {
        Self {
            interceptors: interceptors.into_iter().collect(),
        }
    }
}

impl<S> tower::Layer<S> for Layer {
    type Service = Service<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Service {
            inner,
            interceptors: self.interceptors.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Service<S> {
    inner: S,
    interceptors: ResponseChain,
}

impl<S> tower::Service<RequestSpec> for Service<S>
where
    S: tower::Service<RequestSpec, Response = ResponseEnvelope, Error = Error>,
{
    type Response = ResponseEnvelope;
    type Error = Error;
    type Future = Future<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: RequestSpec) -> Self::Future {
        Future {
            f: self.inner.call(request),
            interceptors: self.interceptors.clone(),
        }
    }
}

#[pin_project::pin_project]
pub struct Future<F> {
    #[pin]
    f: F,
    interceptors: ResponseChain,
}

impl<F> future::Future for Future<F>
where
    F: future::Future<Output = Result<ResponseEnvelope, Error>>,
{
    type Output = Result<ResponseEnvelope, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let response = ready!(this.f.poll(cx))?;
        Poll::Ready(fold_response(this.interceptors, response))
    }
}

#[cfg(test)]
mod tests {
    use super::Layer;
    use crate::interceptor::{OnUnauthorized, ResponseInterceptor};
    use crate::{Error, RequestSpec, ResponseEnvelope};
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::{Layer as _, ServiceExt};

    fn respond(
        status: StatusCode,
        body: &'static str,
    ) -> impl tower::Service<RequestSpec, Response = ResponseEnvelope, Error = Error> {
        tower::service_fn(move |_: RequestSpec| async move {
            Ok::<_, Error>(ResponseEnvelope::new(
                status,
                HeaderMap::new(),
                Bytes::from_static(body.as_bytes()),
            ))
        })
    }

    #[tokio::test]
    async fn test_response_layer_unauthorized_signals_then_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));
        let hook: Arc<dyn ResponseInterceptor> = Arc::new(OnUnauthorized::new({
            let calls = calls.clone();
            move |_: &ResponseEnvelope| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let later: Arc<dyn ResponseInterceptor> = Arc::new({
            let seen = seen.clone();
            move |response: ResponseEnvelope| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(response)
            }
        });
        let service =
            Layer::new([hook, later]).layer(respond(StatusCode::UNAUTHORIZED, "expired"));
        let e = service
            .oneshot(RequestSpec::get("https://example.com"))
            .await
            .unwrap_err();
        assert_eq!(e.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_layer_checks_status_without_interceptors() {
        let service = Layer::new([]).layer(respond(StatusCode::INTERNAL_SERVER_ERROR, ""));
        let e = service
            .oneshot(RequestSpec::get("https://example.com"))
            .await
            .unwrap_err();
        assert_eq!(e.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(matches!(e, Error::Http { ref message, .. } if message == "Unknown API Error"));
    }

    #[tokio::test]
    async fn test_response_layer_passes_inner_error() {
        let service = Layer::new([]).layer(tower::service_fn(|_: RequestSpec| async move {
            Err::<ResponseEnvelope, _>(Error::network("connection reset"))
        }));
        let e = service
            .oneshot(RequestSpec::get("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(e, Error::Network(_)));
    }
}
