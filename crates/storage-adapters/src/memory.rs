//! # In-memory store
//!
//! A `dashmap`-backed implementation of every storage port. Each map entry
//! is guarded by its shard lock, which gives the same guarantees the
//! Postgres adapter gets from unique indexes and `UPDATE ... SET x = x + d`:
//! one live reaction per (user, post) and no lost counter updates.
//!
//! Lock order is always reactions → posts; nothing takes them the other way.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Category, Comment, CommentRepository, CounterField, CounterStore, DomainError, Post,
    PostRepository, Reaction, ReactionCounts, ReactionRepository, ReactionTransition, Report,
    ReportRepository, Result, UserDirectory, UserId,
};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    posts: DashMap<Uuid, Post>,
    comments: DashMap<Uuid, Comment>,
    reactions: DashMap<(UserId, Uuid), Reaction>,
    reports: DashMap<Uuid, Report>,
    users: DashMap<UserId, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stands in for the external account system.
    pub fn register_user(&self, id: UserId, display_name: impl Into<String>) {
        self.users.insert(id, display_name.into());
    }

    /// Every reaction record held on a post.
    pub fn reactions_on(&self, post_id: Uuid) -> Vec<Reaction> {
        self.reactions
            .iter()
            .filter(|r| r.post_id == post_id)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Every stored report, oldest first.
    pub fn reports(&self) -> Vec<Report> {
        let mut reports: Vec<Report> = self.reports.iter().map(|r| r.value().clone()).collect();
        reports.sort_by_key(|r| (r.created_at, r.id));
        reports
    }

    /// Raw comment record, deleted or not.
    pub fn comment(&self, id: Uuid) -> Option<Comment> {
        self.comments.get(&id).map(|c| c.value().clone())
    }
}

fn window<T>(items: Vec<T>, offset: u64, limit: u64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, post: Post) -> Result<()> {
        match self.posts.entry(post.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!("post {} exists", post.id))),
            Entry::Vacant(slot) => {
                slot.insert(post);
                Ok(())
            }
        }
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.value().clone()))
    }

    async fn find_posts(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.posts.get(id).map(|p| p.value().clone()))
            .collect())
    }

    async fn list_posts(
        &self,
        category: Option<Category>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| !p.is_deleted && category.map_or(true, |c| p.category == c))
            .map(|p| p.value().clone())
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(window(posts, offset, limit))
    }

    async fn count_posts(&self, category: Option<Category>) -> Result<u64> {
        Ok(self
            .posts
            .iter()
            .filter(|p| !p.is_deleted && category.map_or(true, |c| p.category == c))
            .count() as u64)
    }

    async fn soft_delete_post(&self, id: Uuid) -> Result<bool> {
        Ok(match self.posts.get_mut(&id) {
            Some(mut post) if !post.is_deleted => {
                post.is_deleted = true;
                true
            }
            _ => false,
        })
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn incr(&self, post_id: Uuid, field: CounterField, delta: i64) -> Result<i64> {
        let mut post = self
            .posts
            .get_mut(&post_id)
            .ok_or(DomainError::NotFound("Post"))?;
        Ok(post.apply_delta(field, delta))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        match self.comments.entry(comment.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "comment {} exists",
                comment.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(comment);
                Ok(())
            }
        }
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.comment(id))
    }

    async fn list_top_level(&self, post_id: Uuid, offset: u64, limit: u64) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.is_top_level() && !c.is_deleted)
            .map(|c| c.value().clone())
            .collect();
        comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(window(comments, offset, limit))
    }

    async fn count_top_level(&self, post_id: Uuid) -> Result<u64> {
        Ok(self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.is_top_level() && !c.is_deleted)
            .count() as u64)
    }

    async fn list_replies(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        let parents: HashSet<&Uuid> = parent_ids.iter().collect();
        let mut replies: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| {
                !c.is_deleted
                    && c.parent_comment_id
                        .as_ref()
                        .is_some_and(|parent| parents.contains(parent))
            })
            .map(|c| c.value().clone())
            .collect();
        replies.sort_by_key(|c| (c.created_at, c.id));
        Ok(replies)
    }

    async fn soft_delete_comment(&self, id: Uuid) -> Result<bool> {
        Ok(match self.comments.get_mut(&id) {
            Some(mut comment) if !comment.is_deleted => {
                comment.is_deleted = true;
                true
            }
            _ => false,
        })
    }
}

#[async_trait]
impl ReactionRepository for MemoryStore {
    async fn find_reaction(&self, user_id: &UserId, post_id: Uuid) -> Result<Option<Reaction>> {
        Ok(self
            .reactions
            .get(&(user_id.clone(), post_id))
            .map(|r| r.value().clone()))
    }

    async fn find_reactions(&self, user_id: &UserId, post_ids: &[Uuid]) -> Result<Vec<Reaction>> {
        Ok(post_ids
            .iter()
            .filter_map(|post_id| {
                self.reactions
                    .get(&(user_id.clone(), *post_id))
                    .map(|r| r.value().clone())
            })
            .collect())
    }

    async fn apply_transition(
        &self,
        user_id: &UserId,
        post_id: Uuid,
        transition: ReactionTransition,
    ) -> Result<ReactionCounts> {
        let entry = self.reactions.entry((user_id.clone(), post_id));
        let mut post = match self.posts.get_mut(&post_id) {
            Some(post) if !post.is_deleted => post,
            _ => return Err(DomainError::NotFound("Post")),
        };

        match (entry, transition) {
            (Entry::Vacant(slot), ReactionTransition::Add(kind)) => {
                slot.insert(Reaction {
                    user_id: user_id.clone(),
                    post_id,
                    kind,
                    created_at: Utc::now(),
                });
            }
            (Entry::Occupied(_), ReactionTransition::Add(_)) => {
                return Err(DomainError::Conflict("reaction already exists".into()));
            }
            (Entry::Occupied(held), ReactionTransition::Remove(kind)) if held.get().kind == kind => {
                held.remove();
            }
            (Entry::Occupied(mut held), ReactionTransition::Switch { from, to })
                if held.get().kind == from =>
            {
                held.get_mut().kind = to;
            }
            _ => return Err(DomainError::Conflict("reaction changed concurrently".into())),
        }

        for (field, delta) in transition.deltas() {
            post.apply_delta(field, delta);
        }
        Ok(ReactionCounts {
            likes: post.likes,
            dislikes: post.dislikes,
        })
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn insert_report(&self, report: Report) -> Result<()> {
        self.reports.insert(report.id, report);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn display_names(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|name| (id.clone(), name.value().clone())))
            .collect())
    }
}
