//! Site content: services, blog posts, news, gallery images and reviews.
//!
//! Each content type has a response struct (what the backend returns) and a
//! draft struct (what the admin panel sends on create/update).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Service {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: String,
    pub image: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub max_people: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ServiceDraft {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub max_people: Option<u32>,
    pub is_active: bool,
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub publish_date: NaiveDateTime,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: String,
    #[serde(default)]
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BlogPostDraft {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub tags: Vec<String>,
    pub image: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image: String,
    pub publish_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewsDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GalleryImage {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub image: String,
    pub alt_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Review {
    pub id: String,
    pub name: String,
    pub text: String,
    pub rating: u8,
    pub date: NaiveDateTime,
    /// Reply from the farm, if any
    #[serde(default)]
    pub response: Option<String>,
}

impl Review {
    /// Rating rendered as filled/empty stars, clamped to 1..=5
    pub fn stars(&self) -> String {
        let filled = usize::from(self.rating.clamp(1, 5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

/// A visitor review submitted from the public site; held for moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ReviewDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub text: String,
    pub rating: u8,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review_list() {
        let json = r#"[{
            "id": "r1",
            "name": "Анна",
            "text": "Отличная ферма!",
            "rating": 5,
            "date": "2024-06-12T09:30:00",
            "response": null
        }]"#;
        let reviews: Vec<Review> = serde_json::from_str(json).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].stars(), "★★★★★");
        assert!(reviews[0].response.is_none());
    }

    #[test]
    fn test_review_stars_are_clamped() {
        let mut review = Review {
            id: "r".into(),
            name: "n".into(),
            text: "t".into(),
            rating: 0,
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            response: None,
        };
        assert_eq!(review.stars(), "★☆☆☆☆");
        review.rating = 9;
        assert_eq!(review.stars(), "★★★★★");
    }

    #[test]
    fn test_service_defaults() {
        let json = r#"{
            "id": "s1",
            "title": "Контактный зоопарк",
            "slug": "contact-zoo",
            "description": "Покормить альпак",
            "price": "500 ₽",
            "image": "/img/zoo.jpg"
        }"#;
        let service: Service = serde_json::from_str(json).unwrap();
        assert!(service.is_active);
        assert!(service.max_people.is_none());
    }
}
