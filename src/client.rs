use super::cache::ResultCache;
use super::credential::CredentialSource;
use super::interceptor::{DefaultHeaders, OnUnauthorized, RequestInterceptor, ResponseInterceptor};
use super::middleware;
use super::transport::Transport;
use super::{Error, RequestSpec, ResponseEnvelope};
use bytes::Bytes;
use http_body_util::Full;
use serde::de::DeserializeOwned;
use std::future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tower::util::Oneshot;
use tower::{ServiceBuilder, ServiceExt};

/// The service stack assembled by [`Builder::build`] around a transport `S`.
pub type Stack<S, T = Full<Bytes>> =
    middleware::request::Service<middleware::response::Service<Transport<S, T>>>;

pub fn builder() -> Builder {
    Builder::default()
}

#[derive(Clone, Default)]
pub struct Builder {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Builder {
    /// Appends to the request chain. Interceptors run in registration order.
    pub fn request_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: RequestInterceptor + 'static,
    {
        self.request.push(Arc::new(interceptor));
        self
    }

    /// Appends to the response chain. Interceptors run in registration order,
    /// and the status check always runs after the last one.
    pub fn response_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: ResponseInterceptor + 'static,
    {
        self.response.push(Arc::new(interceptor));
        self
    }

    pub fn credentials<C>(self, credentials: C) -> Self
    where
        C: CredentialSource + 'static,
    {
        self.request_interceptor(DefaultHeaders::new(credentials))
    }

    pub fn on_unauthorized<F>(self, hook: F) -> Self
    where
        F: Fn(&ResponseEnvelope) + Send + Sync + 'static,
    {
        self.response_interceptor(OnUnauthorized::new(hook))
    }

    pub fn build<S>(self, transport: S) -> ApiClient<Stack<S>> {
        let Self { request, response } = self;
        let service = ServiceBuilder::new()
            .layer(middleware::request::Layer::new(request))
            .layer(middleware::response::Layer::new(response))
            .service(Transport::<S, Full<Bytes>>::new(transport));
        ApiClient { service }
    }
}

/// Sends [`RequestSpec`]s through the interceptor chains and decodes the
/// JSON body of each successful response.
#[derive(Clone)]
pub struct ApiClient<S> {
    service: S,
}

impl<S> ApiClient<Stack<S>> {
    /// A client with the default request headers (JSON content type, bearer
    /// token from `credentials`) and a logging-only unauthorized hook.
    pub fn new<C>(transport: S, credentials: C) -> Self
    where
        C: CredentialSource + 'static,
    {
        builder()
            .credentials(credentials)
            .response_interceptor(OnUnauthorized::default())
            .build(transport)
    }
}

impl<S> ApiClient<S>
where
    S: tower::Service<RequestSpec, Response = ResponseEnvelope, Error = Error> + Clone,
{
    /// Performs exactly one exchange with the transport.
    pub fn send<V>(&self, request: RequestSpec) -> Future<S, V>
    where
        V: DeserializeOwned,
    {
        Future {
            f: self.service.clone().oneshot(request),
            _value: PhantomData,
        }
    }

    /// Like [`ApiClient::send`], but the result is memoized in `cache` under
    /// `key`. A hit performs no exchange at all.
    pub async fn send_cached<K, V>(
        &self,
        cache: &ResultCache,
        key: K,
        request: RequestSpec,
    ) -> Result<Arc<V>, Error>
    where
        K: Into<String>,
        V: DeserializeOwned + Send + Sync + 'static,
    {
        cache.fetch_or_compute(key, || self.send(request)).await
    }
}

#[pin_project::pin_project]
pub struct Future<S, V>
where
    S: tower::Service<RequestSpec>,
{
    #[pin]
    f: Oneshot<S, RequestSpec>,
    _value: PhantomData<fn() -> V>,
}

impl<S, V> future::Future for Future<S, V>
where
    S: tower::Service<RequestSpec, Response = ResponseEnvelope, Error = Error>,
    V: DeserializeOwned,
{
    type Output = Result<V, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let response = ready!(self.project().f.poll(cx))?;
        Poll::Ready(response.json())
    }
}
