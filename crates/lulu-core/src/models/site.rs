use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Contact and location details shown in the site header and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SiteInfo {
    pub name: String,
    pub location: String,
    pub distance: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub description: String,
    pub working_hours: String,
    #[serde(default)]
    pub social_media: HashMap<String, String>,
}

/// Admin dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Statistics {
    #[serde(default)]
    pub total_bookings: u32,
    #[serde(default)]
    pub pending_bookings: u32,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub pending_reviews: u32,
    #[serde(default)]
    pub total_services: u32,
    #[serde(default)]
    pub total_blog_posts: u32,
    #[serde(default)]
    pub total_gallery_images: u32,
}
