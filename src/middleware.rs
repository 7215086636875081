//! The interceptor chains as tower middleware.
//!
//! A client stack is `request::Service<response::Service<Transport<S>>>`:
//! request interceptors run before the transport is called, response
//! interceptors run on the collected response.

pub mod request;
pub mod response;
