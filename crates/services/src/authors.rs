//! Best-effort author name resolution shared by the read paths.

use std::collections::{BTreeSet, HashMap};

use domains::{UserDirectory, UserId, ANONYMOUS_AUTHOR};

/// Resolved display names for one response.
#[derive(Debug, Default)]
pub(crate) struct AuthorNames(HashMap<UserId, String>);

impl AuthorNames {
    /// Looks up every distinct author once. A failing directory degrades to
    /// an empty map rather than failing the read.
    pub(crate) async fn resolve<'a>(
        users: &dyn UserDirectory,
        ids: impl IntoIterator<Item = &'a UserId>,
    ) -> Self {
        let ids: Vec<UserId> = ids
            .into_iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Self::default();
        }
        match users.display_names(&ids).await {
            Ok(names) => Self(names),
            Err(e) => {
                tracing::warn!(error = %e, "author lookup failed, rendering as anonymous");
                Self::default()
            }
        }
    }

    pub(crate) fn name_of(&self, id: &UserId) -> String {
        self.0
            .get(id)
            .cloned()
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string())
    }
}
