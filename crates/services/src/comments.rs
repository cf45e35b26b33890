//! Comment threads: one level of replies under each top-level comment.

use std::collections::HashMap;
use std::sync::Arc;

use domains::{
    Comment, CommentRepository, CommentSummary, CommentThread, ContentPolicy, CounterField,
    CounterStore, DomainError, Page, PageRequest, PostRepository, Result, UserDirectory, UserId,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::authors::AuthorNames;
use crate::{screen_content, ContentLimits};

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    counters: Arc<dyn CounterStore>,
    users: Arc<dyn UserDirectory>,
    policy: Arc<dyn ContentPolicy>,
    limits: ContentLimits,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        counters: Arc<dyn CounterStore>,
        users: Arc<dyn UserDirectory>,
        policy: Arc<dyn ContentPolicy>,
        limits: ContentLimits,
    ) -> Self {
        Self {
            posts,
            comments,
            counters,
            users,
            policy,
            limits,
        }
    }

    /// Newest top-level comments first, each with its replies oldest first.
    /// Pagination totals count top-level comments only.
    #[instrument(skip(self))]
    pub async fn list_comments(&self, post_id: Uuid, page: PageRequest) -> Result<Page<CommentThread>> {
        let top_level = self
            .comments
            .list_top_level(post_id, page.offset(), page.limit())
            .await?;
        let total = self.comments.count_top_level(post_id).await?;

        let parent_ids: Vec<Uuid> = top_level.iter().map(|c| c.id).collect();
        let replies = if parent_ids.is_empty() {
            Vec::new()
        } else {
            self.comments.list_replies(&parent_ids).await?
        };

        let names = AuthorNames::resolve(
            self.users.as_ref(),
            top_level.iter().chain(replies.iter()).map(|c| &c.author_id),
        )
        .await;

        let mut by_parent: HashMap<Uuid, Vec<CommentSummary>> = HashMap::new();
        for reply in replies {
            if let Some(parent) = reply.parent_comment_id {
                by_parent
                    .entry(parent)
                    .or_default()
                    .push(summarize(reply, &names));
            }
        }

        let threads = top_level
            .into_iter()
            .map(|comment| {
                let replies = by_parent.remove(&comment.id).unwrap_or_default();
                CommentThread {
                    comment: summarize(comment, &names),
                    replies,
                }
            })
            .collect();
        Ok(page.wrap(threads, total))
    }

    /// Creates a top-level comment or a reply to a top-level comment.
    ///
    /// Replies to replies are rejected so threads never grow past one level.
    #[instrument(skip(self, content), fields(author = %author_id))]
    pub async fn create_comment(
        &self,
        author_id: &UserId,
        post_id: Uuid,
        content: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<Comment> {
        let content = screen_content(
            content,
            self.policy.as_ref(),
            self.limits.comment_max_chars,
            "Comment",
        )?;

        match self.posts.find_post(post_id).await? {
            Some(post) if !post.is_deleted => {}
            _ => return Err(DomainError::NotFound("Post")),
        }

        if let Some(parent_id) = parent_comment_id {
            let parent = match self.comments.find_comment(parent_id).await? {
                Some(parent) if !parent.is_deleted => parent,
                _ => return Err(DomainError::NotFound("Parent comment")),
            };
            if !parent.is_top_level() {
                return Err(DomainError::invalid("Cannot reply to a reply"));
            }
            if parent.post_id != post_id {
                return Err(DomainError::invalid(
                    "Parent comment belongs to a different post",
                ));
            }
        }

        let comment = Comment::new(author_id.clone(), post_id, parent_comment_id, content);
        self.comments.insert_comment(comment.clone()).await?;
        self.counters
            .incr(post_id, CounterField::CommentCount, 1)
            .await?;

        info!(comment_id = %comment.id, %post_id, reply = parent_comment_id.is_some(), "comment created");
        Ok(comment)
    }

    /// Author-only soft delete. The post's comment count drops only when
    /// this call actually flipped the flag, so repeated deletes are harmless.
    ///
    /// Replies of a deleted comment stay in the store and stay counted, but
    /// are no longer listed since their parent is hidden.
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn delete_comment(&self, user_id: &UserId, comment_id: Uuid) -> Result<()> {
        let comment = self
            .comments
            .find_comment(comment_id)
            .await?
            .ok_or(DomainError::NotFound("Comment"))?;
        if &comment.author_id != user_id {
            return Err(DomainError::Forbidden("Not authorized".into()));
        }

        if self.comments.soft_delete_comment(comment_id).await? {
            // the post itself may be gone; the comment is deleted regardless
            if let Err(e) = self
                .counters
                .incr(comment.post_id, CounterField::CommentCount, -1)
                .await
            {
                match e {
                    DomainError::NotFound(_) => {
                        warn!(post_id = %comment.post_id, "comment deleted on a missing post")
                    }
                    e => return Err(e),
                }
            }
            info!("comment soft-deleted");
        }
        Ok(())
    }

    /// Renders one freshly created comment with an empty reply list.
    pub async fn describe(&self, comment: Comment) -> Result<CommentThread> {
        let names = AuthorNames::resolve(self.users.as_ref(), [&comment.author_id]).await;
        Ok(CommentThread {
            comment: summarize(comment, &names),
            replies: Vec::new(),
        })
    }
}

fn summarize(comment: Comment, names: &AuthorNames) -> CommentSummary {
    CommentSummary {
        id: comment.id,
        author: names.name_of(&comment.author_id),
        likes: comment.likes,
        created_at: comment.created_at,
        content: comment.content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        Category, MockCommentRepository, MockCounterStore, MockPostRepository, MockUserDirectory,
        Post,
    };

    use crate::DenylistPolicy;

    struct Mocks {
        posts: MockPostRepository,
        comments: MockCommentRepository,
        counters: MockCounterStore,
        users: MockUserDirectory,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                posts: MockPostRepository::new(),
                comments: MockCommentRepository::new(),
                counters: MockCounterStore::new(),
                users: MockUserDirectory::new(),
            }
        }

        fn with_post(mut self, post: Post) -> Self {
            self.posts
                .expect_find_post()
                .returning(move |_| Ok(Some(post.clone())));
            self
        }

        fn service(self) -> CommentService {
            CommentService::new(
                Arc::new(self.posts),
                Arc::new(self.comments),
                Arc::new(self.counters),
                Arc::new(self.users),
                Arc::new(DenylistPolicy::default()),
                ContentLimits::default(),
            )
        }
    }

    fn post() -> Post {
        Post::new(UserId::new("op"), "hello".into(), Category::General)
    }

    #[tokio::test]
    async fn reply_to_reply_is_rejected() {
        let post = post();
        let post_id = post.id;
        let top = Comment::new(UserId::new("a"), post_id, None, "top".into());
        let reply = Comment::new(UserId::new("b"), post_id, Some(top.id), "reply".into());
        let reply_id = reply.id;
        let mut mocks = Mocks::new().with_post(post);
        mocks
            .comments
            .expect_find_comment()
            .returning(move |_| Ok(Some(reply.clone())));

        let err = mocks
            .service()
            .create_comment(&UserId::new("c"), post_id, "deeper", Some(reply_id))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::invalid("Cannot reply to a reply"));
    }

    #[tokio::test]
    async fn parent_on_another_post_is_rejected() {
        let post = post();
        let post_id = post.id;
        let elsewhere = Comment::new(UserId::new("a"), Uuid::now_v7(), None, "elsewhere".into());
        let elsewhere_id = elsewhere.id;
        let mut mocks = Mocks::new().with_post(post);
        mocks
            .comments
            .expect_find_comment()
            .returning(move |_| Ok(Some(elsewhere.clone())));

        let err = mocks
            .service()
            .create_comment(&UserId::new("c"), post_id, "hi", Some(elsewhere_id))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn deleted_parent_is_not_found() {
        let post = post();
        let post_id = post.id;
        let mut parent = Comment::new(UserId::new("a"), post_id, None, "gone".into());
        parent.is_deleted = true;
        let parent_id = parent.id;
        let mut mocks = Mocks::new().with_post(post);
        mocks
            .comments
            .expect_find_comment()
            .returning(move |_| Ok(Some(parent.clone())));

        let err = mocks
            .service()
            .create_comment(&UserId::new("c"), post_id, "hi", Some(parent_id))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::NotFound("Parent comment"));
    }

    #[tokio::test]
    async fn empty_content_fails_before_any_lookup() {
        let err = Mocks::new()
            .service()
            .create_comment(&UserId::new("c"), Uuid::now_v7(), "  \n ", None)
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::invalid("Content is required"));
    }

    #[tokio::test]
    async fn create_increments_comment_count() {
        let post = post();
        let post_id = post.id;
        let mut mocks = Mocks::new().with_post(post);
        mocks.comments.expect_insert_comment().times(1).returning(|_| Ok(()));
        mocks
            .counters
            .expect_incr()
            .withf(move |id, field, delta| {
                *id == post_id && *field == CounterField::CommentCount && *delta == 1
            })
            .times(1)
            .returning(|_, _, _| Ok(1));

        let comment = mocks
            .service()
            .create_comment(&UserId::new("c"), post_id, " first! ", None)
            .await
            .unwrap();

        assert_eq!(comment.content, "first!");
        assert!(comment.is_top_level());
    }

    #[tokio::test]
    async fn second_delete_does_not_decrement_again() {
        let comment = Comment::new(UserId::new("a"), Uuid::now_v7(), None, "x".into());
        let comment_id = comment.id;
        let mut mocks = Mocks::new();
        mocks
            .comments
            .expect_find_comment()
            .returning(move |_| Ok(Some(comment.clone())));
        mocks
            .comments
            .expect_soft_delete_comment()
            .returning(|_| Ok(false));
        // no incr expectation: a decrement would panic

        mocks
            .service()
            .delete_comment(&UserId::new("a"), comment_id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_by_non_author_is_forbidden() {
        let comment = Comment::new(UserId::new("a"), Uuid::now_v7(), None, "x".into());
        let comment_id = comment.id;
        let mut mocks = Mocks::new();
        mocks
            .comments
            .expect_find_comment()
            .returning(move |_| Ok(Some(comment.clone())));

        let err = mocks
            .service()
            .delete_comment(&UserId::new("b"), comment_id)
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::Forbidden("Not authorized".into()));
    }

    #[tokio::test]
    async fn threads_group_replies_under_parents() {
        let post_id = Uuid::now_v7();
        let first = Comment::new(UserId::new("a"), post_id, None, "first".into());
        let second = Comment::new(UserId::new("b"), post_id, None, "second".into());
        let r1 = Comment::new(UserId::new("c"), post_id, Some(first.id), "r1".into());
        let r2 = Comment::new(UserId::new("d"), post_id, Some(first.id), "r2".into());
        let top = vec![second.clone(), first.clone()];
        let replies = vec![r1, r2];

        let mut mocks = Mocks::new();
        mocks
            .comments
            .expect_list_top_level()
            .returning(move |_, _, _| Ok(top.clone()));
        mocks.comments.expect_count_top_level().returning(|_| Ok(2));
        mocks
            .comments
            .expect_list_replies()
            .withf(|ids| ids.len() == 2)
            .returning(move |_| Ok(replies.clone()));
        mocks.users.expect_display_names().returning(|_| {
            Ok([(UserId::new("a"), "MellowOwl7".to_string())].into())
        });

        let page = mocks
            .service()
            .list_comments(post_id, PageRequest::new(1, 20, 100))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].comment.content, "second");
        assert!(page.items[0].replies.is_empty());
        assert_eq!(page.items[1].comment.author, "MellowOwl7");
        let replies: Vec<_> = page.items[1].replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(replies, ["r1", "r2"]);
        assert_eq!(page.items[1].replies[0].author, "Anonymous");
    }

    #[tokio::test]
    async fn empty_page_skips_reply_lookup() {
        let mut mocks = Mocks::new();
        mocks
            .comments
            .expect_list_top_level()
            .returning(|_, _, _| Ok(vec![]));
        mocks.comments.expect_count_top_level().returning(|_| Ok(3));

        let page = mocks
            .service()
            .list_comments(Uuid::now_v7(), PageRequest::new(9, 20, 100))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 9);
        assert_eq!(page.total_pages, 1);
    }
}
