//! Session authentication guard with rotating access/refresh tokens.
//!
//! `custode` sits in front of a request-handling pipeline. It verifies
//! credentials at login, issues a rotating pair of signed tokens (a
//! short-lived access token and a longer-lived refresh token), persists
//! session state in a key-value store keyed by an opaque session id, and on
//! every subsequent request decides whether to admit, silently refresh, or
//! reject the caller.
//!
//! The crate owns no routes. The surrounding request layer calls
//! [`login()`]/[`logout()`] from its endpoints and [`authenticate()`] from its
//! middleware, applying the returned cookie mutation to the response.
//! Persistence plugs in through the [`SessionStore`] and [`UserDirectory`]
//! seams; [`RedisSessionStore`] and the in-memory implementations ship with
//! the crate.
//!
//! A session whose access token has expired is refreshed in place (same
//! session id, new token pair) as long as the refresh token validates and
//! the session has not been idle past the lockout window. Idle sessions are
//! rejected even when the refresh token's signature is still good, which
//! bounds what a stolen refresh token is worth.

pub mod clock;
pub mod directory;
pub mod error;
pub mod guard;
pub mod issuer;
pub mod login;
pub mod password;
pub mod redis_store;
pub mod state;
pub mod storage;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{MemoryDirectory, UserAccount, UserDirectory};
pub use error::{AuthError, TokenError};
pub use guard::{Authenticated, authenticate, session_cookie};
pub use issuer::{IssueRequest, issue_tokens};
pub use login::{IdentityClaims, login, logout};
pub use password::{hash_password, verify_password};
pub use redis_store::RedisSessionStore;
pub use state::{AuthConfig, AuthState};
pub use storage::{MemoryStore, SessionRecord, SessionStore};
pub use token::{TokenCodec, TokenPayload};
