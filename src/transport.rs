use super::{BoxError, Error, RequestSpec, ResponseEnvelope};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use std::future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Drives an HTTP service with [`RequestSpec`]s and collects each response
/// into a [`ResponseEnvelope`].
///
/// Any failure of the wrapped service, including one while reading the
/// response body, is reported as [`Error::Network`].
pub struct Transport<S, T = Full<Bytes>> {
    inner: S,
    _body: PhantomData<fn() -> T>,
}

impl<S, T> Transport<S, T> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            _body: PhantomData,
        }
    }
}

impl<S, T> Clone for Transport<S, T>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S, T, U> tower::Service<RequestSpec> for Transport<S, T>
where
    S: tower::Service<http::Request<T>, Response = http::Response<U>>,
    S::Error: Into<BoxError>,
    T: From<Bytes>,
    U: http_body::Body,
    U::Error: Into<BoxError>,
{
    type Response = ResponseEnvelope;
    type Error = Error;
    type Future = Future<S, T, U>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Error::network)
    }

    fn call(&mut self, request: RequestSpec) -> Self::Future {
        tracing::debug!(method = %request.method(), url = request.url(), "sending request");
        match request.into_http() {
            Ok(request) => Future(State::S0(self.inner.call(request))),
            Err(e) => Future(State::S1(Some(Error::unexpected(e)))),
        }
    }
}

#[pin_project::pin_project]
pub struct Future<S, T, U>(#[pin] State<S, T, U>)
where
    S: tower::Service<http::Request<T>>,
    U: http_body::Body;

#[pin_project::pin_project(project = StateProj)]
#[allow(clippy::large_enum_variant)]
enum State<S, T, U>
where
    S: tower::Service<http::Request<T>>,
    U: http_body::Body,
{
    S0(#[pin] S::Future),
    S1(Option<Error>),
    S2(
        #[pin] http_body_util::combinators::Collect<U>,
        Option<http::response::Parts>,
    ),
}

impl<S, T, U> future::Future for Future<S, T, U>
where
    S: tower::Service<http::Request<T>, Response = http::Response<U>>,
    S::Error: Into<BoxError>,
    U: http_body::Body,
    U::Error: Into<BoxError>,
{
    type Output = Result<ResponseEnvelope, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        loop {
            match this.0.as_mut().project() {
                StateProj::S0(f) => {
                    let response = ready!(f.poll(cx)).map_err(Error::network)?;
                    tracing::debug!(status = response.status().as_u16(), "received response");
                    let (parts, body) = response.into_parts();
                    this.0.set(State::S2(body.collect(), Some(parts)));
                }
                StateProj::S1(state) => {
                    let e = state.take().expect("polled after completion");
                    break Poll::Ready(Err(e));
                }
                StateProj::S2(f, state) => {
                    let body = ready!(f.poll(cx)).map_err(Error::network)?;
                    let parts = state.take().expect("polled after completion");
                    break Poll::Ready(Ok(ResponseEnvelope::from(http::Response::from_parts(
                        parts,
                        body.to_bytes(),
                    ))));
                }
            }
        }
    }
}
