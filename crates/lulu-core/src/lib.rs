//! Core library for the LuLu farm client.
//!
//! Talks to the farm's backend API for the public site (site info,
//! services, reviews, gallery, bookings) and the admin panel, and keeps the
//! admin session: token persistence, login/logout, and access gating for
//! protected views. `hooks` holds the fetch and mutation state machines
//! views are built on.

pub mod api;
pub mod auth;
pub mod config;
pub mod hooks;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{Access, LoginOutcome, SessionContext, SessionPhase, TokenStore};
pub use config::{ClientConfig, Config};
pub use hooks::{Fetch, FetchState, Mutation, MutationCallbacks, MutationState};
