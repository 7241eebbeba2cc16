use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Creator,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Creator => "creator",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "creator" => Some(Role::Creator),
            "admin" => Some(Role::Admin),
            "owner" => Some(Role::Owner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Approved,
    Rejected,
}

impl AssetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::Pending => "pending",
            AssetStatus::Approved => "approved",
            AssetStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AssetStatus::Pending),
            "approved" => Some(AssetStatus::Approved),
            "rejected" => Some(AssetStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Warning,
    Notification,
    System,
    Chat,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Info => "info",
            MessageKind::Warning => "warning",
            MessageKind::Notification => "notification",
            MessageKind::System => "system",
            MessageKind::Chat => "chat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(MessageKind::Info),
            "warning" => Some(MessageKind::Warning),
            "notification" => Some(MessageKind::Notification),
            "system" => Some(MessageKind::System),
            "chat" => Some(MessageKind::Chat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TicketStatus::Open),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

/// Free-form presentation fields attached to every account. Stored as a
/// single JSON column; the store never inspects individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub display_name: String,
    pub bio: String,
    pub avatar: String,
    pub banner: String,
    pub banner_color: String,
    pub accent_color: String,
    pub discord_link: String,
    pub twitter_link: String,
    pub youtube_link: String,
    pub website_link: String,
    pub pronouns: String,
    pub location: String,
    pub custom_status: String,
    pub status_emoji: String,
    pub about_me: String,
    pub showcase_assets: Vec<Uuid>,
    pub theme: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            bio: String::new(),
            avatar: String::new(),
            banner: String::new(),
            banner_color: "#1a1a2e".to_string(),
            accent_color: "#e2231a".to_string(),
            discord_link: String::new(),
            twitter_link: String::new(),
            youtube_link: String::new(),
            website_link: String::new(),
            pronouns: String::new(),
            location: String::new(),
            custom_status: String::new(),
            status_emoji: String::new(),
            about_me: String::new(),
            showcase_assets: Vec::new(),
            theme: "default".to_string(),
        }
    }
}

/// An account. Set-valued fields are id relations hydrated from the
/// relation tables; uniqueness is guaranteed by their primary keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Stored and compared in plaintext.
    pub password: String,
    pub role: Role,
    pub profile: UserProfile,
    pub tags: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub purchased_assets: Vec<Uuid>,
    pub balance: f64,
    pub join_date: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_online: bool,
    pub blacklisted_by: Vec<Uuid>,
    pub customer_of: Vec<Uuid>,
}

/// One user's review of one asset. At most one per (asset, user) pair;
/// re-rating replaces the entry in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: Uuid,
    pub score: u8,
    pub comment: String,
}

/// A downloadable catalog item.
///
/// `rating` and `rating_count` are derived from `ratings` and recomputed by
/// the rating transition, never anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub creator_id: Uuid,
    pub price: f64,
    pub is_free: bool,
    pub download_count: i64,
    pub rating: f64,
    pub rating_count: i64,
    pub ratings: Vec<Rating>,
    pub status: AssetStatus,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub file_size: String,
    pub thumbnail: String,
    pub images: Vec<String>,
}

/// A label assignable to users (many-to-many via `user_tags`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub text_color: String,
    pub icon: Option<String>,
    pub created_by: Uuid,
}

/// A direct message. Created unread; `read` flips to true at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub content: String,
    pub kind: MessageKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// An entry in a channel's append-only broadcast log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessage {
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A support conversation between an opener and a target user. The message
/// list is append-only and only grows while the ticket is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub subject: String,
    pub status: TicketStatus,
    pub messages: Vec<TicketMessage>,
    pub created_at: DateTime<Utc>,
}
