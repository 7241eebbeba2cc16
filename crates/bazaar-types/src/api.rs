use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Built-in chat channels.
pub const CHANNELS: [&str; 4] = ["general", "showcase", "help", "off-topic"];

/// Catalog categories offered by the upload form.
pub const CATEGORIES: [&str; 10] = [
    "Environment",
    "Weapons",
    "UI",
    "Scripts",
    "Animations",
    "Models",
    "Audio",
    "Particles",
    "Plugins",
    "Other",
];

// -- Accounts --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

// -- Catalog --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub price: f64,
    pub is_free: bool,
    pub file_size: String,
    pub thumbnail: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceFilter {
    #[default]
    All,
    Free,
    Paid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// `created_at` descending.
    #[default]
    Newest,
    /// `download_count` descending.
    Popular,
    /// `rating` descending.
    Rating,
}

/// Filter for the public catalog listing. The default value selects every
/// approved asset, newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    /// Case-insensitive substring match on title or description.
    pub query: Option<String>,
    pub category: Option<String>,
    pub price: PriceFilter,
    pub sort: SortBy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationDecision {
    Approve,
    Reject { reason: Option<String> },
}
