//! # Postgres store
//!
//! This module implements the data mapping between the relational model in
//! `migrations/` and the `domains` models.
//!
//! Counters are only ever changed with `SET x = GREATEST(x + $delta, 0)`;
//! the (user, post) uniqueness of reactions is the `reactions_user_post_key`
//! constraint.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    Category, Comment, CommentRepository, CounterField, CounterStore, DomainError, Post,
    PostRepository, Reaction, ReactionCounts, ReactionKind, ReactionRepository,
    ReactionTransition, Report, ReportRepository, Result, UserDirectory, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, author_id, content, category, likes, dislikes, comment_count, \
                            repost_count, is_repost, original_post_id, is_deleted, created_at";

const COMMENT_COLUMNS: &str =
    "id, author_id, post_id, parent_comment_id, content, likes, is_deleted, created_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(storage)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(DomainError::unexpected)
    }
}

fn storage(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "postgres query failed");
    DomainError::unexpected(err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn bounded(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn decode(err: DomainError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

fn post_from_row(row: &PgRow) -> std::result::Result<Post, sqlx::Error> {
    let category: String = row.try_get("category")?;
    Ok(Post {
        id: row.try_get("id")?,
        author_id: UserId::new(row.try_get::<String, _>("author_id")?),
        content: row.try_get("content")?,
        category: category.parse::<Category>().map_err(decode)?,
        likes: row.try_get("likes")?,
        dislikes: row.try_get("dislikes")?,
        comment_count: row.try_get("comment_count")?,
        repost_count: row.try_get("repost_count")?,
        is_repost: row.try_get("is_repost")?,
        original_post_id: row.try_get("original_post_id")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
    })
}

fn comment_from_row(row: &PgRow) -> std::result::Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        author_id: UserId::new(row.try_get::<String, _>("author_id")?),
        post_id: row.try_get("post_id")?,
        parent_comment_id: row.try_get("parent_comment_id")?,
        content: row.try_get("content")?,
        likes: row.try_get("likes")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
    })
}

fn reaction_from_row(row: &PgRow) -> std::result::Result<Reaction, sqlx::Error> {
    let kind: String = row.try_get("kind")?;
    Ok(Reaction {
        user_id: UserId::new(row.try_get::<String, _>("user_id")?),
        post_id: row.try_get("post_id")?,
        kind: kind.parse::<ReactionKind>().map_err(decode)?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert_post(&self, post: Post) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO posts ({POST_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(post.id)
        .bind(post.author_id.as_str())
        .bind(&post.content)
        .bind(post.category.as_str())
        .bind(post.likes)
        .bind(post.dislikes)
        .bind(post.comment_count)
        .bind(post.repost_count)
        .bind(post.is_repost)
        .bind(post.original_post_id)
        .bind(post.is_deleted)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.as_ref().map(post_from_row).transpose().map_err(storage)
    }

    async fn find_posts(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.iter().map(post_from_row).collect::<std::result::Result<_, _>>().map_err(storage)
    }

    async fn list_posts(
        &self,
        category: Option<Category>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE is_deleted = FALSE AND ($1::TEXT IS NULL OR category = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(category.map(Category::as_str))
        .bind(bounded(limit))
        .bind(bounded(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.iter().map(post_from_row).collect::<std::result::Result<_, _>>().map_err(storage)
    }

    async fn count_posts(&self, category: Option<Category>) -> Result<u64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE is_deleted = FALSE AND ($1::TEXT IS NULL OR category = $1)",
        )
        .bind(category.map(Category::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        Ok(total.max(0) as u64)
    }

    async fn soft_delete_post(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("UPDATE posts SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(done.rows_affected() == 1)
    }
}

#[async_trait]
impl CounterStore for PgStore {
    async fn incr(&self, post_id: Uuid, field: CounterField, delta: i64) -> Result<i64> {
        let column = field.as_str();
        sqlx::query_scalar::<_, i64>(&format!(
            "UPDATE posts SET {column} = GREATEST({column} + $2, 0) WHERE id = $1 RETURNING {column}"
        ))
        .bind(post_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or(DomainError::NotFound("Post"))
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO comments ({COMMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(comment.id)
        .bind(comment.author_id.as_str())
        .bind(comment.post_id)
        .bind(comment.parent_comment_id)
        .bind(&comment.content)
        .bind(comment.likes)
        .bind(comment.is_deleted)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.as_ref().map(comment_from_row).transpose().map_err(storage)
    }

    async fn list_top_level(&self, post_id: Uuid, offset: u64, limit: u64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE post_id = $1 AND parent_comment_id IS NULL AND is_deleted = FALSE \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(post_id)
        .bind(bounded(limit))
        .bind(bounded(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.iter().map(comment_from_row).collect::<std::result::Result<_, _>>().map_err(storage)
    }

    async fn count_top_level(&self, post_id: Uuid) -> Result<u64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments \
             WHERE post_id = $1 AND parent_comment_id IS NULL AND is_deleted = FALSE",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        Ok(total.max(0) as u64)
    }

    async fn list_replies(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE parent_comment_id = ANY($1) AND is_deleted = FALSE \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(parent_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.iter().map(comment_from_row).collect::<std::result::Result<_, _>>().map_err(storage)
    }

    async fn soft_delete_comment(&self, id: Uuid) -> Result<bool> {
        let done =
            sqlx::query("UPDATE comments SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        Ok(done.rows_affected() == 1)
    }
}

#[async_trait]
impl ReactionRepository for PgStore {
    async fn find_reaction(&self, user_id: &UserId, post_id: Uuid) -> Result<Option<Reaction>> {
        let row = sqlx::query(
            "SELECT user_id, post_id, kind, created_at FROM reactions WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id.as_str())
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        row.as_ref().map(reaction_from_row).transpose().map_err(storage)
    }

    async fn find_reactions(&self, user_id: &UserId, post_ids: &[Uuid]) -> Result<Vec<Reaction>> {
        let rows = sqlx::query(
            "SELECT user_id, post_id, kind, created_at FROM reactions WHERE user_id = $1 AND post_id = ANY($2)",
        )
        .bind(user_id.as_str())
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.iter().map(reaction_from_row).collect::<std::result::Result<_, _>>().map_err(storage)
    }

    /// Record change and counter update in one transaction. A lost race shows
    /// up either as a unique violation (two first reactions) or as zero rows
    /// matched (record changed since it was read); both roll back.
    async fn apply_transition(
        &self,
        user_id: &UserId,
        post_id: Uuid,
        transition: ReactionTransition,
    ) -> Result<ReactionCounts> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let deleted: Option<bool> = sqlx::query_scalar("SELECT is_deleted FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;
        if deleted != Some(false) {
            return Err(DomainError::NotFound("Post"));
        }

        let matched = match transition {
            ReactionTransition::Add(kind) => sqlx::query(
                "INSERT INTO reactions (user_id, post_id, kind, created_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id.as_str())
            .bind(post_id)
            .bind(kind.as_str())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Conflict("reaction already exists".into())
                } else {
                    storage(e)
                }
            })?,
            ReactionTransition::Remove(kind) => sqlx::query(
                "DELETE FROM reactions WHERE user_id = $1 AND post_id = $2 AND kind = $3",
            )
            .bind(user_id.as_str())
            .bind(post_id)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage)?,
            ReactionTransition::Switch { from, to } => sqlx::query(
                "UPDATE reactions SET kind = $4 WHERE user_id = $1 AND post_id = $2 AND kind = $3",
            )
            .bind(user_id.as_str())
            .bind(post_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage)?,
        };
        if matched.rows_affected() != 1 {
            return Err(DomainError::Conflict("reaction changed concurrently".into()));
        }

        let (mut likes_delta, mut dislikes_delta) = (0_i64, 0_i64);
        for (field, delta) in transition.deltas() {
            match field {
                CounterField::Likes => likes_delta += delta,
                CounterField::Dislikes => dislikes_delta += delta,
                CounterField::CommentCount | CounterField::RepostCount => {}
            }
        }
        let row = sqlx::query(
            "UPDATE posts SET likes = GREATEST(likes + $2, 0), dislikes = GREATEST(dislikes + $3, 0) \
             WHERE id = $1 RETURNING likes, dislikes",
        )
        .bind(post_id)
        .bind(likes_delta)
        .bind(dislikes_delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;
        let counts = ReactionCounts {
            likes: row.try_get("likes").map_err(storage)?,
            dislikes: row.try_get("dislikes").map_err(storage)?,
        };

        tx.commit().await.map_err(storage)?;
        Ok(counts)
    }
}

#[async_trait]
impl ReportRepository for PgStore {
    async fn insert_report(&self, report: Report) -> Result<()> {
        sqlx::query(
            "INSERT INTO reports (id, reporter_id, post_id, comment_id, reason, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(report.id)
        .bind(report.reporter_id.as_str())
        .bind(report.post_id)
        .bind(report.comment_id)
        .bind(report.reason.as_str())
        .bind(&report.description)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn display_names(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>> {
        let raw: Vec<&str> = ids.iter().map(UserId::as_str).collect();
        let rows = sqlx::query("SELECT id, anonymous_username FROM users WHERE id = ANY($1)")
            .bind(&raw)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.iter()
            .map(|row| {
                Ok((
                    UserId::new(row.try_get::<String, _>("id")?),
                    row.try_get::<String, _>("anonymous_username")?,
                ))
            })
            .collect::<std::result::Result<_, sqlx::Error>>()
            .map_err(storage)
    }
}
