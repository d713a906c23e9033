//! REST API client module for the farm backend.
//!
//! This module provides the `ApiClient` for the public site endpoints
//! (site info, services, blog, reviews, news, gallery, bookings) and the
//! admin panel endpoints under `/admin`.
//!
//! The admin endpoints use bearer token authentication obtained from
//! `/auth/login`.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, AuthHooks, NoAuth};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
