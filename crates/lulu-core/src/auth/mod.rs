//! Authentication module for the admin session.
//!
//! This module provides:
//! - `TokenStore`: the single bearer-token slot, persisted through a
//!   `TokenBackend` (session file, OS keychain or memory)
//! - `SessionContext`: session-wide login state, login/logout, and the
//!   guard protected views consult
//!
//! Tokens are issued by `/auth/login` and expire after 24 hours.

pub mod session;
pub mod token_store;

pub use session::{
    Access, LoginOutcome, Redirect, RedirectReason, SessionContext, SessionPhase, LOGIN_PATH,
};
pub use token_store::{
    FileBackend, KeyringBackend, MemoryBackend, StoredToken, TokenBackend, TokenStore,
};
