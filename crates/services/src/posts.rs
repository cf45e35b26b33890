//! The post feed: creation, reposts, soft deletion and denormalized reads.

use std::collections::HashMap;
use std::sync::Arc;

use domains::{
    Category, CategoryFilter, ContentPolicy, CounterField, CounterStore, DomainError,
    OriginalPostView, Page, PageRequest, Post, PostRepository, PostView, ReactionKind,
    ReactionRepository, Result, UserDirectory, UserId,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::authors::AuthorNames;
use crate::{screen_content, ContentLimits};

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    counters: Arc<dyn CounterStore>,
    reactions: Arc<dyn ReactionRepository>,
    users: Arc<dyn UserDirectory>,
    policy: Arc<dyn ContentPolicy>,
    limits: ContentLimits,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        counters: Arc<dyn CounterStore>,
        reactions: Arc<dyn ReactionRepository>,
        users: Arc<dyn UserDirectory>,
        policy: Arc<dyn ContentPolicy>,
        limits: ContentLimits,
    ) -> Self {
        Self {
            posts,
            counters,
            reactions,
            users,
            policy,
            limits,
        }
    }

    /// Newest-first feed, optionally restricted to one category. An unknown
    /// category is an empty feed, not an error.
    #[instrument(skip(self, caller))]
    pub async fn list_posts(
        &self,
        filter: CategoryFilter,
        page: PageRequest,
        caller: Option<&UserId>,
    ) -> Result<Page<PostView>> {
        let category = match filter {
            CategoryFilter::Any => None,
            CategoryFilter::Only(category) => Some(category),
            CategoryFilter::Unknown => return Ok(page.wrap(Vec::new(), 0)),
        };
        let posts = self
            .posts
            .list_posts(category, page.offset(), page.limit())
            .await?;
        let total = self.posts.count_posts(category).await?;
        let views = self.present(posts, caller).await?;
        Ok(page.wrap(views, total))
    }

    pub async fn get_post(&self, post_id: Uuid, caller: Option<&UserId>) -> Result<PostView> {
        let post = self.live_post(post_id).await?;
        self.describe(post, caller).await
    }

    #[instrument(skip(self, content), fields(author = %author_id))]
    pub async fn create_post(
        &self,
        author_id: &UserId,
        content: &str,
        category: Option<&str>,
    ) -> Result<Post> {
        let content = screen_content(
            content,
            self.policy.as_ref(),
            self.limits.post_max_chars,
            "Content",
        )?;
        let post = Post::new(author_id.clone(), content, Category::from_submission(category));
        self.posts.insert_post(post.clone()).await?;

        info!(post_id = %post.id, category = %post.category, "post created");
        Ok(post)
    }

    /// Reposts a live post. The content was screened when the source was
    /// created, so moderation does not run again.
    #[instrument(skip(self), fields(author = %author_id))]
    pub async fn repost(&self, author_id: &UserId, post_id: Uuid) -> Result<Post> {
        let source = self.live_post(post_id).await?;
        let repost = Post::repost_of(author_id.clone(), &source);
        self.posts.insert_post(repost.clone()).await?;
        self.counters
            .incr(source.id, CounterField::RepostCount, 1)
            .await?;

        info!(post_id = %repost.id, original = %source.id, "post reposted");
        Ok(repost)
    }

    /// Author-only soft delete. Deleting twice is a no-op.
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn delete_post(&self, user_id: &UserId, post_id: Uuid) -> Result<()> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(DomainError::NotFound("Post"))?;
        if &post.author_id != user_id {
            return Err(DomainError::Forbidden("Not authorized".into()));
        }
        if self.posts.soft_delete_post(post_id).await? {
            info!("post soft-deleted");
        }
        Ok(())
    }

    /// Denormalizes a single post the same way the feed does.
    pub async fn describe(&self, post: Post, caller: Option<&UserId>) -> Result<PostView> {
        let mut views = self.present(vec![post], caller).await?;
        views.pop().ok_or(DomainError::NotFound("Post"))
    }

    async fn live_post(&self, post_id: Uuid) -> Result<Post> {
        match self.posts.find_post(post_id).await? {
            Some(post) if !post.is_deleted => Ok(post),
            _ => Err(DomainError::NotFound("Post")),
        }
    }

    /// Attaches authors, originals and the caller's reactions, each fetched
    /// in one batch for the whole page.
    async fn present(&self, posts: Vec<Post>, caller: Option<&UserId>) -> Result<Vec<PostView>> {
        let originals = self.live_originals(&posts).await;
        let names = AuthorNames::resolve(
            self.users.as_ref(),
            posts
                .iter()
                .map(|p| &p.author_id)
                .chain(originals.values().map(|o| &o.author_id)),
        )
        .await;
        let reactions = match caller {
            Some(user) => self.reactions_of(user, &posts).await?,
            None => HashMap::new(),
        };

        Ok(posts
            .into_iter()
            .map(|post| {
                let original_post = post
                    .original_post_id
                    .and_then(|id| originals.get(&id))
                    .map(|o| OriginalPostView {
                        id: o.id,
                        content: o.content.clone(),
                        author: names.name_of(&o.author_id),
                    });
                PostView {
                    id: post.id,
                    author: names.name_of(&post.author_id),
                    category: post.category,
                    likes: post.likes,
                    dislikes: post.dislikes,
                    comment_count: post.comment_count,
                    repost_count: post.repost_count,
                    is_repost: post.is_repost,
                    original_post_id: post.original_post_id,
                    original_post,
                    user_reaction: reactions.get(&post.id).copied(),
                    created_at: post.created_at,
                    content: post.content,
                }
            })
            .collect())
    }

    /// Originals are weak references: deleted, missing or unreadable ones
    /// are simply left out.
    async fn live_originals(&self, posts: &[Post]) -> HashMap<Uuid, Post> {
        let mut ids: Vec<Uuid> = posts.iter().filter_map(|p| p.original_post_id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return HashMap::new();
        }
        match self.posts.find_posts(&ids).await {
            Ok(found) => found
                .into_iter()
                .filter(|p| !p.is_deleted)
                .map(|p| (p.id, p))
                .collect(),
            Err(e) => {
                warn!(error = %e, "original post lookup failed");
                HashMap::new()
            }
        }
    }

    async fn reactions_of(
        &self,
        user: &UserId,
        posts: &[Post],
    ) -> Result<HashMap<Uuid, ReactionKind>> {
        if posts.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        Ok(self
            .reactions
            .find_reactions(user, &ids)
            .await?
            .into_iter()
            .map(|r| (r.post_id, r.kind))
            .collect())
    }
}
