//! # Core Traits (Ports)
//!
//! Any storage, identity or moderation adapter must implement these traits
//! to be wired into the binary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Category, Comment, CounterField, Post, Reaction, Report, UserId};
use crate::reaction::{ReactionCounts, ReactionTransition};

/// Persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: Post) -> Result<()>;
    /// Returns soft-deleted posts too; callers decide how to treat them.
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;
    /// Batched lookup. Missing ids are simply absent from the result.
    async fn find_posts(&self, ids: &[Uuid]) -> Result<Vec<Post>>;
    /// Non-deleted posts, newest first.
    async fn list_posts(
        &self,
        category: Option<Category>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>>;
    async fn count_posts(&self, category: Option<Category>) -> Result<u64>;
    /// Returns `true` only if this call flipped the flag.
    async fn soft_delete_post(&self, id: Uuid) -> Result<bool>;
}

/// Atomic delta updates of the denormalized post counters.
///
/// Implementations must never read the whole post, change it and write it
/// back; the delta is applied by the store and floored at zero there.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Returns the counter value after the update.
    async fn incr(&self, post_id: Uuid, field: CounterField, delta: i64) -> Result<i64>;
}

/// Persistence contract for comments and replies.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> Result<()>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>>;
    /// Non-deleted top-level comments of a post, newest first.
    async fn list_top_level(&self, post_id: Uuid, offset: u64, limit: u64)
        -> Result<Vec<Comment>>;
    async fn count_top_level(&self, post_id: Uuid) -> Result<u64>;
    /// Non-deleted replies to any of `parent_ids`, oldest first.
    async fn list_replies(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>>;
    /// Returns `true` only if this call flipped the flag.
    async fn soft_delete_comment(&self, id: Uuid) -> Result<bool>;
}

/// Persistence contract for the unique (user, post) reaction records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    async fn find_reaction(&self, user_id: &UserId, post_id: Uuid) -> Result<Option<Reaction>>;
    async fn find_reactions(&self, user_id: &UserId, post_ids: &[Uuid]) -> Result<Vec<Reaction>>;
    /// Applies the record change and the post counter deltas as one unit.
    ///
    /// Fails with `Conflict` when the record no longer matches
    /// `transition.expected()`, e.g. a second `Add` for the same pair.
    async fn apply_transition(
        &self,
        user_id: &UserId,
        post_id: Uuid,
        transition: ReactionTransition,
    ) -> Result<ReactionCounts>;
}

/// Write-only sink for abuse reports.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn insert_report(&self, report: Report) -> Result<()>;
}

/// Read-only view of the external account system.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Anonymous display names for the given users. Unknown users are absent.
    async fn display_names(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>>;
}

/// Pre-submission content filter.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ContentPolicy: Send + Sync {
    fn is_allowed(&self, text: &str) -> bool;
}

/// Turns a request credential into a verified caller identity.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityResolver: Send + Sync {
    /// Fails with `Unauthorized` when the credential cannot be verified.
    fn resolve(&self, credential: &str) -> Result<UserId>;
}

/// Every storage port a service may need, usually backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub counters: Arc<dyn CounterStore>,
    pub comments: Arc<dyn CommentRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub users: Arc<dyn UserDirectory>,
}

impl Repositories {
    /// Uses a single store for every port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PostRepository
            + CounterStore
            + CommentRepository
            + ReactionRepository
            + ReportRepository
            + UserDirectory
            + 'static,
    {
        Self {
            posts: store.clone(),
            counters: store.clone(),
            comments: store.clone(),
            reactions: store.clone(),
            reports: store.clone(),
            users: store,
        }
    }
}
