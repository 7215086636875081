use crate::interceptor::{fold_request, RequestChain, RequestInterceptor};
use crate::{Error, RequestSpec};
use futures::future::Either;
use futures::FutureExt;
use std::future::{self, Ready};
use std::mem;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::util::Oneshot;
use tower::ServiceExt;

#[derive(Clone)]
pub struct Layer {
    interceptors: RequestChain,
}

impl Layer {
    pub fn new<I>(interceptors: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn RequestInterceptor>>,
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
    interceptors: RequestChain,
}

impl<S> tower::Service<RequestSpec> for Service<S>
where
    S: Clone + tower::Service<RequestSpec, Error = Error>,
{
    type Response = S::Response;
    type Error = Error;
    type Future = Future<S>;

    // The inner service is polled for readiness by the returned future, once
    // the chain has produced the final request.
    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: RequestSpec) -> Self::Future {
        match fold_request(&self.interceptors, request) {
            Ok(request) => {
                let inner = self.inner.clone();
                let inner = mem::replace(&mut self.inner, inner);
                inner.oneshot(request).left_future()
            }
            Err(e) => future::ready(Err(e)).right_future(),
        }
    }
}

pub type Future<S> = Either<
    Oneshot<S, RequestSpec>,
    Ready<Result<<S as tower::Service<RequestSpec>>::Response, Error>>,
>;
