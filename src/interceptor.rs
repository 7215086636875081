use super::credential::CredentialSource;
use super::{Error, RequestSpec, ResponseEnvelope, UNKNOWN_API_ERROR};
use headers::{Authorization, ContentType, HeaderMapExt};
use http::{HeaderMap, StatusCode};
use std::sync::Arc;

pub trait RequestInterceptor: Send + Sync {
    fn apply(&self, request: RequestSpec) -> Result<RequestSpec, Error>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(RequestSpec) -> Result<RequestSpec, Error> + Send + Sync,
{
    fn apply(&self, request: RequestSpec) -> Result<RequestSpec, Error> {
        self(request)
    }
}

pub trait ResponseInterceptor: Send + Sync {
    fn apply(&self, response: ResponseEnvelope) -> Result<ResponseEnvelope, Error>;
}

impl<F> ResponseInterceptor for F
where
    F: Fn(ResponseEnvelope) -> Result<ResponseEnvelope, Error> + Send + Sync,
{
    fn apply(&self, response: ResponseEnvelope) -> Result<ResponseEnvelope, Error> {
        self(response)
    }
}

pub type RequestChain = Arc<[Arc<dyn RequestInterceptor>]>;
pub type ResponseChain = Arc<[Arc<dyn ResponseInterceptor>]>;

/// Runs `request` through `chain` left to right, stopping at the first error.
pub fn fold_request(
    chain: &[Arc<dyn RequestInterceptor>],
    request: RequestSpec,
) -> Result<RequestSpec, Error> {
    chain
        .iter()
        .try_fold(request, |request, interceptor| interceptor.apply(request))
}

/// Runs `response` through `chain` left to right, then through
/// [`check_status`].
pub fn fold_response(
    chain: &[Arc<dyn ResponseInterceptor>],
    response: ResponseEnvelope,
) -> Result<ResponseEnvelope, Error> {
    let response = chain
        .iter()
        .try_fold(response, |response, interceptor| interceptor.apply(response))?;
    check_status(response)
}

pub fn check_status(response: ResponseEnvelope) -> Result<ResponseEnvelope, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let text = response.text();
    let message = if text.is_empty() {
        UNKNOWN_API_ERROR.to_owned()
    } else {
        text.into_owned()
    };
    Err(Error::Http {
        status: response.status(),
        message,
    })
}

/// Sets `Content-Type: application/json` and, when the credential source has
/// a token, `Authorization: Bearer <token>`. Headers already on the request
/// take precedence over both.
#[derive(Clone, Debug)]
pub struct DefaultHeaders<C> {
    credentials: C,
}

impl<C> DefaultHeaders<C> {
    pub fn new(credentials: C) -> Self {
        Self { credentials }
    }
}

impl<C> RequestInterceptor for DefaultHeaders<C>
where
    C: CredentialSource,
{
    fn apply(&self, request: RequestSpec) -> Result<RequestSpec, Error> {
        let mut headers = HeaderMap::new();
        headers.typed_insert(ContentType::json());
        if let Some(token) = self
            .credentials
            .current_token()
            .filter(|token| !token.is_empty())
        {
            let authorization = Authorization::bearer(&token).map_err(Error::unexpected)?;
            headers.typed_insert(authorization);
        }
        for name in request.headers().keys() {
            headers.remove(name);
        }
        for (name, value) in request.headers() {
            headers.append(name.clone(), value.clone());
        }
        Ok(request.with_headers(headers))
    }
}

fn ignore(_: &ResponseEnvelope) {}

/// Signals a 401 without failing the call. The status check that follows
/// still turns the response into [`Error::Http`].
#[derive(Clone)]
pub struct OnUnauthorized<F = fn(&ResponseEnvelope)> {
    hook: F,
}

impl<F> OnUnauthorized<F> {
    pub fn new(hook: F) -> Self {
        Self { hook }
    }
}

impl Default for OnUnauthorized {
    fn default() -> Self {
        Self::new(ignore)
    }
}

impl<F> ResponseInterceptor for OnUnauthorized<F>
where
    F: Fn(&ResponseEnvelope) + Send + Sync,
{
    fn apply(&self, response: ResponseEnvelope) -> Result<ResponseEnvelope, Error> {
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("unauthorized, credentials need to be renewed");
            (self.hook)(&response);
        }
        Ok(response)
    }
}
