//! Like/dislike state transitions.
//!
//! The service plans a transition from the record it read; the store then
//! applies it only if the record is still in that state, so two racing
//! requests cannot both win.

use serde::Serialize;

use crate::models::{CounterField, ReactionKind};

/// One of the three moves a reaction request can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    /// No record yet: create one.
    Add(ReactionKind),
    /// Same kind submitted again: delete the record.
    Remove(ReactionKind),
    /// Different kind submitted: flip the record in place.
    Switch { from: ReactionKind, to: ReactionKind },
}

impl ReactionTransition {
    pub fn plan(existing: Option<ReactionKind>, requested: ReactionKind) -> Self {
        match existing {
            None => ReactionTransition::Add(requested),
            Some(current) if current == requested => ReactionTransition::Remove(requested),
            Some(current) => ReactionTransition::Switch {
                from: current,
                to: requested,
            },
        }
    }

    /// The reaction the user holds once the transition is applied.
    pub fn resulting(self) -> Option<ReactionKind> {
        match self {
            ReactionTransition::Add(kind) => Some(kind),
            ReactionTransition::Remove(_) => None,
            ReactionTransition::Switch { to, .. } => Some(to),
        }
    }

    /// The reaction the record must hold for the transition to apply.
    pub fn expected(self) -> Option<ReactionKind> {
        match self {
            ReactionTransition::Add(_) => None,
            ReactionTransition::Remove(kind) => Some(kind),
            ReactionTransition::Switch { from, .. } => Some(from),
        }
    }

    /// Counter deltas to apply to the post alongside the record change.
    pub fn deltas(self) -> Vec<(CounterField, i64)> {
        match self {
            ReactionTransition::Add(kind) => vec![(kind.counter(), 1)],
            ReactionTransition::Remove(kind) => vec![(kind.counter(), -1)],
            ReactionTransition::Switch { from, to } => {
                vec![(from.counter(), -1), (to.counter(), 1)]
            }
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ReactionTransition::Add(_) => "Reaction added",
            ReactionTransition::Remove(_) => "Reaction removed",
            ReactionTransition::Switch { .. } => "Reaction updated",
        }
    }
}

/// Post like/dislike totals after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// Result of applying a reaction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub transition: ReactionTransition,
    pub counts: ReactionCounts,
    pub user_reaction: Option<ReactionKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReactionKind::{Dislike, Like};

    #[test]
    fn plans_all_three_transitions() {
        assert_eq!(ReactionTransition::plan(None, Like), ReactionTransition::Add(Like));
        assert_eq!(
            ReactionTransition::plan(Some(Like), Like),
            ReactionTransition::Remove(Like)
        );
        assert_eq!(
            ReactionTransition::plan(Some(Like), Dislike),
            ReactionTransition::Switch { from: Like, to: Dislike }
        );
    }

    #[test]
    fn switch_moves_one_vote_between_counters() {
        let t = ReactionTransition::Switch { from: Dislike, to: Like };
        assert_eq!(
            t.deltas(),
            vec![(CounterField::Dislikes, -1), (CounterField::Likes, 1)]
        );
        assert_eq!(t.resulting(), Some(Like));
        assert_eq!(t.expected(), Some(Dislike));
    }

    #[test]
    fn remove_clears_user_reaction() {
        let t = ReactionTransition::Remove(Dislike);
        assert_eq!(t.resulting(), None);
        assert_eq!(t.deltas(), vec![(CounterField::Dislikes, -1)]);
        assert_eq!(t.message(), "Reaction removed");
    }
}
