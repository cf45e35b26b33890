//! # Domain Models
//!
//! These structs represent the core entities of Hushpost.
//! We use UUID v7 for time-ordered, globally unique identification of
//! everything the store owns. Users are owned by an external identity
//! provider and are only ever referenced by an opaque [`UserId`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, Result};

/// Display name used whenever an author cannot be resolved.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Stable opaque identifier of a verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed set of feed categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Government,
    Education,
    Social,
    #[default]
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Politics,
        Category::Government,
        Category::Education,
        Category::Social,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Government => "government",
            Category::Education => "education",
            Category::Social => "social",
            Category::General => "general",
        }
    }

    /// Category for a new post: anything missing or unknown falls back to the default.
    pub fn from_submission(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }

    /// Feed filter from the `category` query parameter. Absent, empty or
    /// `all` (any case) means no restriction; names outside the fixed set
    /// match nothing.
    pub fn filter_from_query(raw: Option<&str>) -> CategoryFilter {
        match raw.map(str::trim) {
            None => CategoryFilter::Any,
            Some(s) if s.is_empty() || s.eq_ignore_ascii_case("all") => CategoryFilter::Any,
            Some(s) => s
                .parse()
                .map(CategoryFilter::Only)
                .unwrap_or(CategoryFilter::Unknown),
        }
    }
}

/// Feed restriction requested by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    Any,
    Only(Category),
    /// A category name no post can carry.
    Unknown,
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::invalid("Invalid category"))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two reactions a user can hold on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }

    /// The post counter this reaction contributes to.
    pub fn counter(self) -> CounterField {
        match self {
            ReactionKind::Like => CounterField::Likes,
            ReactionKind::Dislike => CounterField::Dislikes,
        }
    }
}

impl FromStr for ReactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            _ => Err(DomainError::invalid("Invalid reaction type")),
        }
    }
}

/// Denormalized counters kept on the post document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    Likes,
    Dislikes,
    CommentCount,
    RepostCount,
}

impl CounterField {
    /// Storage column / field name.
    pub fn as_str(self) -> &'static str {
        match self {
            CounterField::Likes => "likes",
            CounterField::Dislikes => "dislikes",
            CounterField::CommentCount => "comment_count",
            CounterField::RepostCount => "repost_count",
        }
    }
}

/// The fundamental unit of conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: UserId,
    pub content: String,
    pub category: Category,
    pub likes: i64,
    pub dislikes: i64,
    pub comment_count: i64,
    pub repost_count: i64,
    pub is_repost: bool,
    /// Always set for reposts, never for originals.
    pub original_post_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: UserId, content: String, category: Category) -> Self {
        Self {
            id: Uuid::now_v7(),
            author_id,
            content,
            category,
            likes: 0,
            dislikes: 0,
            comment_count: 0,
            repost_count: 0,
            is_repost: false,
            original_post_id: None,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    /// A repost copies content and category and points back at its source.
    pub fn repost_of(author_id: UserId, source: &Post) -> Self {
        Self {
            is_repost: true,
            original_post_id: Some(source.id),
            ..Self::new(author_id, source.content.clone(), source.category)
        }
    }

    pub fn counter(&self, field: CounterField) -> i64 {
        match field {
            CounterField::Likes => self.likes,
            CounterField::Dislikes => self.dislikes,
            CounterField::CommentCount => self.comment_count,
            CounterField::RepostCount => self.repost_count,
        }
    }

    /// Applies a delta to one counter, flooring at zero. Returns the new value.
    pub fn apply_delta(&mut self, field: CounterField, delta: i64) -> i64 {
        let slot = match field {
            CounterField::Likes => &mut self.likes,
            CounterField::Dislikes => &mut self.dislikes,
            CounterField::CommentCount => &mut self.comment_count,
            CounterField::RepostCount => &mut self.repost_count,
        };
        *slot = (*slot + delta).max(0);
        *slot
    }
}

/// A comment on a post, or a reply to a top-level comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: UserId,
    pub post_id: Uuid,
    /// `None` for top-level comments.
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub likes: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        author_id: UserId,
        post_id: Uuid,
        parent_comment_id: Option<Uuid>,
        content: String,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            author_id,
            post_id,
            parent_comment_id,
            content,
            likes: 0,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

/// One user's reaction to one post. Unique per (user, post).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: UserId,
    pub post_id: Uuid,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}

/// Why something was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Harassment,
    HateSpeech,
    Violence,
    Misinformation,
    Other,
}

impl ReportReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportReason::Spam => "spam",
            ReportReason::Harassment => "harassment",
            ReportReason::HateSpeech => "hate_speech",
            ReportReason::Violence => "violence",
            ReportReason::Misinformation => "misinformation",
            ReportReason::Other => "other",
        }
    }
}

impl FromStr for ReportReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spam" => Ok(ReportReason::Spam),
            "harassment" => Ok(ReportReason::Harassment),
            "hate_speech" => Ok(ReportReason::HateSpeech),
            "violence" => Ok(ReportReason::Violence),
            "misinformation" => Ok(ReportReason::Misinformation),
            "other" => Ok(ReportReason::Other),
            _ => Err(DomainError::invalid("Invalid report reason")),
        }
    }
}

/// Write-only audit record of an abuse report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: UserId,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub reason: ReportReason,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ── Read models ─────────────────────────────────────────────────────────────

/// The original of a repost, as embedded in the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalPostView {
    pub id: Uuid,
    pub content: String,
    pub author: String,
}

/// A post with its author, original and the caller's reaction resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub author: String,
    pub category: Category,
    pub likes: i64,
    pub dislikes: i64,
    pub comment_count: i64,
    pub repost_count: i64,
    pub is_repost: bool,
    pub original_post_id: Option<Uuid>,
    pub original_post: Option<OriginalPostView>,
    pub user_reaction: Option<ReactionKind>,
    pub created_at: DateTime<Utc>,
}

/// A single comment or reply as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub id: Uuid,
    pub content: String,
    pub author: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

/// A top-level comment with its replies, oldest reply first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentSummary,
    pub replies: Vec<CommentSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_submission_defaults_to_general() {
        assert_eq!(Category::from_submission(None), Category::General);
        assert_eq!(Category::from_submission(Some("nonsense")), Category::General);
        assert_eq!(Category::from_submission(Some("Politics")), Category::Politics);
    }

    #[test]
    fn category_filter_treats_all_as_unrestricted() {
        assert_eq!(Category::filter_from_query(None), CategoryFilter::Any);
        assert_eq!(Category::filter_from_query(Some("all")), CategoryFilter::Any);
        assert_eq!(Category::filter_from_query(Some("All")), CategoryFilter::Any);
        assert_eq!(Category::filter_from_query(Some(" ")), CategoryFilter::Any);
        assert_eq!(
            Category::filter_from_query(Some("Education")),
            CategoryFilter::Only(Category::Education)
        );
    }

    #[test]
    fn unknown_category_filter_matches_nothing() {
        assert_eq!(Category::filter_from_query(Some("sports")), CategoryFilter::Unknown);
    }

    #[test]
    fn reaction_kind_rejects_unknown_values() {
        assert_eq!("like".parse::<ReactionKind>().unwrap(), ReactionKind::Like);
        let err = "love".parse::<ReactionKind>().unwrap_err();
        assert_eq!(err, DomainError::invalid("Invalid reaction type"));
    }

    #[test]
    fn repost_points_at_source() {
        let source = Post::new(UserId::new("alice"), "hello".into(), Category::Social);
        let repost = Post::repost_of(UserId::new("bob"), &source);

        assert!(repost.is_repost);
        assert_eq!(repost.original_post_id, Some(source.id));
        assert_eq!(repost.content, "hello");
        assert_eq!(repost.category, Category::Social);
        assert_ne!(repost.id, source.id);
        assert!(!source.is_repost && source.original_post_id.is_none());
    }

    #[test]
    fn counters_floor_at_zero() {
        let mut post = Post::new(UserId::new("alice"), "hi".into(), Category::General);
        assert_eq!(post.apply_delta(CounterField::Likes, 1), 1);
        assert_eq!(post.apply_delta(CounterField::Likes, -1), 0);
        assert_eq!(post.apply_delta(CounterField::Likes, -1), 0);
        assert_eq!(post.apply_delta(CounterField::CommentCount, -3), 0);
    }

    #[test]
    fn report_reason_uses_snake_case() {
        assert_eq!(
            "hate_speech".parse::<ReportReason>().unwrap(),
            ReportReason::HateSpeech
        );
        assert_eq!(
            serde_json::to_value(ReportReason::HateSpeech).unwrap(),
            serde_json::json!("hate_speech")
        );
    }

    #[test]
    fn comment_thread_flattens_summary() {
        let summary = CommentSummary {
            id: Uuid::nil(),
            content: "first".into(),
            author: ANONYMOUS_AUTHOR.into(),
            likes: 0,
            created_at: Utc::now(),
        };
        let thread = CommentThread { comment: summary, replies: vec![] };
        let json = serde_json::to_value(&thread).unwrap();

        assert_eq!(json["content"], "first");
        assert_eq!(json["author"], "Anonymous");
        assert!(json["createdAt"].is_string());
        assert_eq!(json["replies"], serde_json::json!([]));
    }
}
