//! # services
//!
//! Use-case layer for Hushpost. Each service owns one slice of the API and
//! talks to storage exclusively through the ports in `domains`.

pub mod comments;
pub mod moderation;
pub mod posts;
pub mod reactions;
pub mod reports;

mod authors;

use std::sync::Arc;

use domains::{ContentPolicy, DomainError, Repositories, Result};

pub use comments::CommentService;
pub use moderation::DenylistPolicy;
pub use posts::PostService;
pub use reactions::ReactionService;
pub use reports::{ReportService, ReportSubmission};

/// Message returned when the moderation gate rejects content.
pub const MODERATION_REJECTION: &str = "Your post contains inappropriate language. Please revise.";

/// Length bounds applied on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLimits {
    pub post_max_chars: usize,
    pub comment_max_chars: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            post_max_chars: 5000,
            comment_max_chars: 1000,
        }
    }
}

/// All services, wired against the same repositories and policy.
#[derive(Clone)]
pub struct Services {
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub reactions: Arc<ReactionService>,
    pub reports: Arc<ReportService>,
}

impl Services {
    pub fn new(repos: Repositories, policy: Arc<dyn ContentPolicy>, limits: ContentLimits) -> Self {
        Self {
            posts: Arc::new(PostService::new(
                repos.posts.clone(),
                repos.counters.clone(),
                repos.reactions.clone(),
                repos.users.clone(),
                policy.clone(),
                limits,
            )),
            comments: Arc::new(CommentService::new(
                repos.posts.clone(),
                repos.comments.clone(),
                repos.counters.clone(),
                repos.users.clone(),
                policy,
                limits,
            )),
            reactions: Arc::new(ReactionService::new(repos.posts.clone(), repos.reactions.clone())),
            reports: Arc::new(ReportService::new(repos.reports)),
        }
    }
}

/// Trims submitted text and runs it through emptiness, moderation and length checks.
pub(crate) fn screen_content(
    raw: &str,
    policy: &dyn ContentPolicy,
    max_chars: usize,
    noun: &str,
) -> Result<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(DomainError::invalid("Content is required"));
    }
    if !policy.is_allowed(content) {
        tracing::info!("submission rejected by moderation gate");
        return Err(DomainError::invalid(MODERATION_REJECTION));
    }
    if content.chars().count() > max_chars {
        return Err(DomainError::invalid(format!(
            "{noun} too long (max {max_chars} characters)"
        )));
    }
    Ok(content.to_string())
}
