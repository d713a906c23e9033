//! Typed wrappers for every backend route the site and admin panel use.

use crate::models::{
    BlogPost, BlogPostDraft, Booking, BookingRequest, BookingStatus, Credentials, GalleryImage,
    LoginResponse, MessageResponse, NewsDraft, NewsItem, Review, ReviewDraft, Service,
    ServiceDraft, SiteInfo, Statistics, User,
};

use super::{ApiClient, ApiError};

/// Default page size for the public blog listing
pub const DEFAULT_BLOG_LIMIT: u32 = 10;

/// Default number of approved reviews shown on the home page
pub const DEFAULT_REVIEW_LIMIT: u32 = 20;

/// Default number of news items shown on the home page
pub const DEFAULT_NEWS_LIMIT: u32 = 10;

/// Check an id or slug before it goes into a route.
///
/// Values that contain a separator or are a dot segment would be rewritten
/// into a different route by URL normalisation, so they are rejected.
fn segment(value: &str) -> Result<&str, ApiError> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '?', '#', '%']);
    if invalid {
        return Err(ApiError::InvalidPathSegment(value.to_string()));
    }
    Ok(value)
}

impl ApiClient {
    // ===== Public site =====

    pub async fn site_info(&self) -> Result<SiteInfo, ApiError> {
        self.get("/site-info").await
    }

    pub async fn services(&self) -> Result<Vec<Service>, ApiError> {
        self.get("/services").await
    }

    pub async fn service_by_slug(&self, slug: &str) -> Result<Service, ApiError> {
        self.get(&format!("/services/{}", segment(slug)?)).await
    }

    pub async fn blog_posts(&self, limit: u32, skip: u32) -> Result<Vec<BlogPost>, ApiError> {
        self.get_with_params(
            "/blog/posts",
            &[("limit", limit.to_string()), ("skip", skip.to_string())],
        )
        .await
    }

    pub async fn blog_post_by_slug(&self, slug: &str) -> Result<BlogPost, ApiError> {
        self.get(&format!("/blog/posts/{}", segment(slug)?)).await
    }

    pub async fn reviews(&self, limit: u32) -> Result<Vec<Review>, ApiError> {
        self.get_with_params("/reviews", &[("limit", limit.to_string())])
            .await
    }

    /// Submit a visitor review; it stays hidden until approved.
    pub async fn create_review(&self, review: &ReviewDraft) -> Result<MessageResponse, ApiError> {
        self.post("/reviews", review).await
    }

    pub async fn news(&self, limit: u32) -> Result<Vec<NewsItem>, ApiError> {
        self.get_with_params("/news", &[("limit", limit.to_string())])
            .await
    }

    pub async fn gallery(&self) -> Result<Vec<GalleryImage>, ApiError> {
        self.get("/gallery").await
    }

    pub async fn create_booking(
        &self,
        booking: &BookingRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.post("/bookings", booking).await
    }

    // ===== Authentication =====

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.post("/auth/login", credentials).await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/auth/me").await
    }

    // ===== Admin: dashboard =====

    pub async fn admin_stats(&self) -> Result<Statistics, ApiError> {
        self.get("/admin/stats").await
    }

    // ===== Admin: services =====

    pub async fn admin_services(&self) -> Result<Vec<Service>, ApiError> {
        self.get("/admin/services").await
    }

    pub async fn create_service(&self, draft: &ServiceDraft) -> Result<MessageResponse, ApiError> {
        self.post("/admin/services", draft).await
    }

    pub async fn update_service(
        &self,
        id: &str,
        draft: &ServiceDraft,
    ) -> Result<MessageResponse, ApiError> {
        self.put(&format!("/admin/services/{}", segment(id)?), Some(draft), &[])
            .await
    }

    pub async fn delete_service(&self, id: &str) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("/admin/services/{}", segment(id)?)).await
    }

    // ===== Admin: blog =====

    pub async fn admin_blog_posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        self.get("/admin/blog/posts").await
    }

    pub async fn create_blog_post(
        &self,
        draft: &BlogPostDraft,
    ) -> Result<MessageResponse, ApiError> {
        self.post("/admin/blog/posts", draft).await
    }

    pub async fn update_blog_post(
        &self,
        id: &str,
        draft: &BlogPostDraft,
    ) -> Result<MessageResponse, ApiError> {
        self.put(&format!("/admin/blog/posts/{}", segment(id)?), Some(draft), &[])
            .await
    }

    pub async fn delete_blog_post(&self, id: &str) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("/admin/blog/posts/{}", segment(id)?)).await
    }

    // ===== Admin: news =====

    pub async fn create_news(&self, draft: &NewsDraft) -> Result<MessageResponse, ApiError> {
        self.post("/admin/news", draft).await
    }

    pub async fn update_news(
        &self,
        id: &str,
        draft: &NewsDraft,
    ) -> Result<MessageResponse, ApiError> {
        self.put(&format!("/admin/news/{}", segment(id)?), Some(draft), &[])
            .await
    }

    pub async fn delete_news(&self, id: &str) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("/admin/news/{}", segment(id)?)).await
    }

    // ===== Admin: reviews =====

    pub async fn pending_reviews(&self) -> Result<Vec<Review>, ApiError> {
        self.get("/admin/reviews/pending").await
    }

    pub async fn approve_review(&self, id: &str) -> Result<MessageResponse, ApiError> {
        self.put::<_, ()>(&format!("/admin/reviews/{}/approve", segment(id)?), None, &[])
            .await
    }

    pub async fn delete_review(&self, id: &str) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("/admin/reviews/{}", segment(id)?)).await
    }

    // ===== Admin: bookings =====

    pub async fn admin_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.get("/admin/bookings").await
    }

    /// Change a booking's status. The backend reads `status` and
    /// `admin_notes` from the query string, not the body.
    pub async fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
        admin_notes: Option<&str>,
    ) -> Result<MessageResponse, ApiError> {
        let mut query = vec![("status", status.as_str().to_string())];
        if let Some(notes) = admin_notes {
            query.push(("admin_notes", notes.to_string()));
        }
        self.put::<_, ()>(&format!("/admin/bookings/{}/status", segment(id)?), None, &query)
            .await
    }
}
