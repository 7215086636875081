use super::Error;
use bytes::Bytes;
use headers::{Header, HeaderMapExt};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

/// An outgoing request as seen by the interceptor chain.
///
/// Every `with_*` method consumes the value and returns a new one, so an
/// interceptor can only hand a modified copy forward.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestSpec {
    pub fn new<U>(method: Method, url: U) -> Self
    where
        U: Into<String>,
    {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get<U>(url: U) -> Self
    where
        U: Into<String>,
    {
        Self::new(Method::GET, url)
    }

    pub fn post<U>(url: U) -> Self
    where
        U: Into<String>,
    {
        Self::new(Method::POST, url)
    }

    pub fn put<U>(url: U) -> Self
    where
        U: Into<String>,
    {
        Self::new(Method::PUT, url)
    }

    pub fn patch<U>(url: U) -> Self
    where
        U: Into<String>,
    {
        Self::new(Method::PATCH, url)
    }

    pub fn delete<U>(url: U) -> Self
    where
        U: Into<String>,
    {
        Self::new(Method::DELETE, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_typed_header<H>(mut self, header: H) -> Self
    where
        H: Header,
    {
        self.headers.typed_insert(header);
        self
    }

    /// Replaces the whole header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body<B>(mut self, body: B) -> Self
    where
        B: Into<Bytes>,
    {
        self.body = Some(body.into());
        self
    }

    pub fn with_json<V>(self, value: &V) -> Result<Self, Error>
    where
        V: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(value).map_err(Error::unexpected)?;
        Ok(self.with_body(body))
    }

    pub(crate) fn into_http<T>(self) -> Result<http::Request<T>, http::Error>
    where
        T: From<Bytes>,
    {
        let Self {
            method,
            url,
            headers,
            body,
        } = self;
        let mut builder = http::Request::builder().method(method).uri(url);
        if let Some(h) = builder.headers_mut() {
            *h = headers;
        }
        builder.body(T::from(body.unwrap_or_default()))
    }
}
