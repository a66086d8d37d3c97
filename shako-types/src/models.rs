use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An image with alternative text, as used for avatars, banners and
/// post media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(default)]
    pub alt: String,
}

/// Denormalized author identity attached to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<Media>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCounts {
    pub comments: i64,
    pub reactions: i64,
}

/// A post as returned by the service. The `author`, `reactions` and
/// `comments` fields are only populated when the corresponding
/// expansion flags were sent with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: Option<Media>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(rename = "_count", default)]
    pub counts: PostCounts,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub reactions: Option<Vec<Reaction>>,
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
}

/// A comment on a post. `reply_to_id` references another comment's
/// `id` within the same post; `None` means the comment is top-level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub body: String,
    #[serde(default)]
    pub reply_to_id: Option<i64>,
    pub post_id: String,
    pub owner: String,
    pub created: DateTime<Utc>,
    pub author: Author,
}

/// An aggregated reaction on a post: one entry per distinct symbol.
///
/// `count` must equal `reactors.len()`; [`Reaction::normalize`]
/// re-establishes that after deserializing an untrusted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub symbol: String,
    pub count: i64,
    #[serde(default)]
    pub reactors: Vec<String>,
}

impl Reaction {
    /// Sanitize a service-provided entry: dedupe reactors (first
    /// occurrence wins) and recompute `count` from the reactor list.
    pub fn normalize(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.reactors.retain(|name| seen.insert(name.clone()));
        self.count = self.reactors.len() as i64;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCounts {
    pub posts: i64,
    pub followers: i64,
    pub following: i64,
}

/// A profile entry inside a followers/following expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUser {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
}

/// A full user profile, with optional follower/following expansions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
    #[serde(rename = "_count", default)]
    pub counts: ProfileCounts,
    #[serde(default)]
    pub followers: Option<Vec<FollowUser>>,
    #[serde(default)]
    pub following: Option<Vec<FollowUser>>,
}

impl Profile {
    /// Whether `name` appears in the loaded followers expansion.
    /// Returns `false` when followers were not requested.
    pub fn is_followed_by(&self, name: &str) -> bool {
        self.followers
            .as_deref()
            .map(|followers| followers.iter().any(|f| f.name == name))
            .unwrap_or(false)
    }
}

/// Pagination metadata returned alongside every list response.
///
/// `current_page` and `page_count` are 1-indexed. Consumers must gate
/// previous/next navigation on the boolean flags rather than
/// recomputing bounds from the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub current_page: u32,
    #[serde(default)]
    pub previous_page: Option<u32>,
    #[serde(default)]
    pub next_page: Option<u32>,
    pub page_count: u32,
    pub total_count: u64,
}

/// Envelope for paginated list responses.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub data: T,
    pub meta: Meta,
}

/// Envelope for single-object responses.
#[derive(Debug, Clone, Deserialize)]
pub struct Single<T> {
    pub data: T,
}

/// One entry of the service's error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
    #[serde(default)]
    pub path: Vec<String>,
}

/// The service's error envelope, returned on any non-2xx status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: u16,
}

impl ErrorBody {
    /// The first service-provided message, if any.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

// Request/response types for the API

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Profile fields plus the bearer token, as returned by a successful
/// login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Media>,
}
