use std::env;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

pub const DEFAULT_TOKEN_VAR: &str = "API_AUTH_TOKEN";

/// Supplies the bearer token attached to outgoing requests.
///
/// Consulted once per request. `None` and `Some("")` both mean no token.
pub trait CredentialSource: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

impl<F> CredentialSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn current_token(&self) -> Option<String> {
        self()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn current_token(&self) -> Option<String> {
        None
    }
}

#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new<T>(token: T) -> Self
    where
        T: Into<String>,
    {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<secret>)")
    }
}

impl CredentialSource for StaticToken {
    fn current_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the token from an environment variable on every request.
#[derive(Clone, Debug)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new<V>(var: V) -> Self
    where
        V: Into<String>,
    {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VAR)
    }
}

impl CredentialSource for EnvToken {
    fn current_token(&self) -> Option<String> {
        env::var(&self.var).ok()
    }
}

/// A token slot shared between the request side and whoever refreshes or
/// revokes the token (e.g. an unauthorized hook).
#[derive(Clone, Default)]
pub struct TokenStore(Arc<RwLock<Option<String>>>);

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T>(&self, token: T)
    where
        T: Into<String>,
    {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("TokenStore")
            .field("present", &present)
            .finish()
    }
}

impl CredentialSource for TokenStore {
    fn current_token(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialSource, EnvToken, StaticToken, TokenStore};
    use std::env;

    #[test]
    fn test_token_store() {
        let store = TokenStore::new();
        assert_eq!(store.current_token(), None);
        store.set("abc");
        assert_eq!(store.clone().current_token().as_deref(), Some("abc"));
        store.clear();
        assert_eq!(store.current_token(), None);
    }

    #[test]
    fn test_env_token_missing() {
        let source = EnvToken::new("API_PIPELINE_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert_eq!(source.current_token(), None);
    }

    #[test]
    fn test_env_token_is_read_on_every_call() {
        const VAR: &str = "API_PIPELINE_TEST_ENV_TOKEN_IS_READ_ON_EVERY_CALL";
        let source = EnvToken::new(VAR);
        env::set_var(VAR, "abc");
        assert_eq!(source.current_token().as_deref(), Some("abc"));
        env::set_var(VAR, "def");
        assert_eq!(source.current_token().as_deref(), Some("def"));
        env::remove_var(VAR);
        assert_eq!(source.current_token(), None);
    }

    #[test]
    fn test_static_token_debug_is_redacted() {
        let source = StaticToken::new("hunter2");
        assert!(!format!("{source:?}").contains("hunter2"));
        assert_eq!(source.current_token().as_deref(), Some("hunter2"));
    }
}
