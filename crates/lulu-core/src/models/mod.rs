//! Data models for the farm backend's JSON payloads.
//!
//! This module contains the request and response types used by the
//! endpoint catalogue:
//!
//! - `User`, `Credentials`, `LoginResponse`: admin authentication
//! - `SiteInfo`, `Statistics`: site contacts and dashboard counters
//! - `Service`, `BlogPost`, `NewsItem`, `GalleryImage`, `Review`: site content
//! - `Booking`, `BookingRequest`, `BookingStatus`: visit requests
//!
//! Backend timestamps are naive UTC (`2024-05-01T10:00:00.123456`), so they
//! are modelled as `chrono::NaiveDateTime`.

pub mod booking;
pub mod content;
pub mod site;
pub mod user;

use serde::{Deserialize, Serialize};

pub use booking::{Booking, BookingRequest, BookingStatus};
pub use content::{
    BlogPost, BlogPostDraft, GalleryImage, NewsDraft, NewsItem, Review, ReviewDraft, Service,
    ServiceDraft,
};
pub use site::{SiteInfo, Statistics};
pub use user::{Credentials, LoginResponse, User, UserRole};

/// Acknowledgement returned by create/update/delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MessageResponse {
    pub message: String,
    /// Id of the created document, for create endpoints
    #[serde(default)]
    pub id: Option<String>,
}
