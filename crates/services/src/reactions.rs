//! The reaction engine: like/dislike toggling on posts.

use std::sync::Arc;

use domains::{
    DomainError, PostRepository, ReactionKind, ReactionOutcome, ReactionRepository,
    ReactionTransition, Result, UserId,
};
use tracing::{debug, instrument};
use uuid::Uuid;

pub struct ReactionService {
    posts: Arc<dyn PostRepository>,
    reactions: Arc<dyn ReactionRepository>,
}

impl ReactionService {
    pub fn new(posts: Arc<dyn PostRepository>, reactions: Arc<dyn ReactionRepository>) -> Self {
        Self { posts, reactions }
    }

    /// Adds, removes or switches the caller's reaction on a live post.
    ///
    /// The record change and the counter deltas are applied by the store in
    /// one step; if another request changed the record since it was read,
    /// the store answers `Conflict` and nothing is applied.
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn apply_reaction(
        &self,
        user_id: &UserId,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionOutcome> {
        match self.posts.find_post(post_id).await? {
            Some(post) if !post.is_deleted => {}
            _ => return Err(DomainError::NotFound("Post")),
        }

        let existing = self
            .reactions
            .find_reaction(user_id, post_id)
            .await?
            .map(|r| r.kind);
        let transition = ReactionTransition::plan(existing, kind);
        let counts = self
            .reactions
            .apply_transition(user_id, post_id, transition)
            .await?;

        debug!(?transition, likes = counts.likes, dislikes = counts.dislikes, "reaction applied");
        Ok(ReactionOutcome {
            transition,
            counts,
            user_reaction: transition.resulting(),
        })
    }

    /// The caller's current reaction, if any.
    pub async fn get_reaction(&self, user_id: &UserId, post_id: Uuid) -> Result<Option<ReactionKind>> {
        Ok(self
            .reactions
            .find_reaction(user_id, post_id)
            .await?
            .map(|r| r.kind))
    }
}
