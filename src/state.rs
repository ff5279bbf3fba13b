//! Auth configuration and the shared state threaded through every flow.
//!
//! No hidden globals: the signing secret, store client and clock are all
//! held here and passed explicitly.

use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::directory::UserDirectory;
use crate::storage::SessionStore;
use crate::token::TokenCodec;

pub(crate) const DEFAULT_COOKIE_NAME: &str = "access-token";
const DEFAULT_ACCESS_TTL_MINS: i64 = 30;
const DEFAULT_REFRESH_TTL_MINS: i64 = 60;
const DEFAULT_LOCKOUT_MINS: i64 = 30;
const DEFAULT_LEEWAY_MINS: i64 = 10;

/// Policy knobs for the session guard.
#[derive(Debug)]
pub struct AuthConfig {
    cookie_name: String,
    signing_secret: SecretString,
    algorithm: Algorithm,
    access_ttl_minutes: i64,
    refresh_ttl_minutes: i64,
    lockout_minutes: i64,
    leeway_minutes: i64,
    secure_cookies: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(signing_secret: SecretString) -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            signing_secret,
            algorithm: Algorithm::HS256,
            access_ttl_minutes: DEFAULT_ACCESS_TTL_MINS,
            refresh_ttl_minutes: DEFAULT_REFRESH_TTL_MINS,
            lockout_minutes: DEFAULT_LOCKOUT_MINS,
            leeway_minutes: DEFAULT_LEEWAY_MINS,
            secure_cookies: true,
        }
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: String) -> Self {
        self.cookie_name = name;
        self
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_access_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_minutes(mut self, minutes: i64) -> Self {
        self.refresh_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_lockout_minutes(mut self, minutes: i64) -> Self {
        self.lockout_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_leeway_minutes(mut self, minutes: i64) -> Self {
        self.leeway_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn access_ttl_minutes(&self) -> i64 {
        self.access_ttl_minutes
    }

    #[must_use]
    pub fn refresh_ttl_minutes(&self) -> i64 {
        self.refresh_ttl_minutes
    }

    /// Maximum inactivity before a session stops being silently
    /// refreshable.
    #[must_use]
    pub fn lockout_minutes(&self) -> i64 {
        self.lockout_minutes
    }

    #[must_use]
    pub fn leeway_minutes(&self) -> i64 {
        self.leeway_minutes
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub(crate) fn signing_secret(&self) -> &SecretString {
        &self.signing_secret
    }

    pub(crate) fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

/// Everything a flow needs: config, codec, and the persistence seams.
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
    store: Arc<dyn SessionStore>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn SessionStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self::with_clock(config, store, directory, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        config: AuthConfig,
        store: Arc<dyn SessionStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = TokenCodec::new(
            config.signing_secret(),
            config.algorithm(),
            config.leeway_minutes(),
        );
        Self {
            config,
            codec,
            store,
            directory,
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub(crate) fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub(crate) fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthConfig, AuthState};
    use crate::directory::MemoryDirectory;
    use crate::storage::MemoryStore;
    use jsonwebtoken::Algorithm;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn secret() -> SecretString {
        SecretString::from("test-signing-secret".to_string())
    }

    #[test]
    fn config_defaults_and_overrides() {
        let config = AuthConfig::new(secret());
        assert_eq!(config.cookie_name(), super::DEFAULT_COOKIE_NAME);
        assert_eq!(config.access_ttl_minutes(), 30);
        assert_eq!(config.refresh_ttl_minutes(), 60);
        assert_eq!(config.lockout_minutes(), 30);
        assert_eq!(config.leeway_minutes(), 10);
        assert!(config.secure_cookies());

        let config = config
            .with_cookie_name("session".to_string())
            .with_algorithm(Algorithm::HS384)
            .with_access_ttl_minutes(5)
            .with_refresh_ttl_minutes(15)
            .with_lockout_minutes(10)
            .with_leeway_minutes(1)
            .with_secure_cookies(false);

        assert_eq!(config.cookie_name(), "session");
        assert_eq!(config.algorithm(), Algorithm::HS384);
        assert_eq!(config.access_ttl_minutes(), 5);
        assert_eq!(config.refresh_ttl_minutes(), 15);
        assert_eq!(config.lockout_minutes(), 10);
        assert_eq!(config.leeway_minutes(), 1);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn debug_redacts_the_signing_secret() {
        let config = AuthConfig::new(secret());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("test-signing-secret"));
    }

    #[test]
    fn state_uses_the_system_clock_by_default() {
        let state = AuthState::new(
            AuthConfig::new(secret()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryDirectory::new()),
        );
        assert!(state.now_ms() > 1_577_836_800_000);
    }
}
