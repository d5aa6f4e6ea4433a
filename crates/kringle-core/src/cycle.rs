//! Circular assignment chains.
//!
//! A cycle stores participants in draw order; the participant at position
//! `i` gives to the participant at position `i + 1 (mod n)`. Any order of
//! distinct participants with `n >= 2` therefore yields a permutation with no
//! fixed points, so the only property left to check after a draw is the
//! exclusion relation.

use std::{collections::HashSet, fmt::Debug, hash::Hash};

use serde::{Deserialize, Serialize};

use crate::{MIN_PARTICIPANTS, exclusion::Exclusions};

/// A single giver -> receiver pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment<T> {
    /// Participant who gives the gift.
    pub giver: T,
    /// Participant who receives it.
    pub receiver: T,
}

/// Reasons a cycle fails verification against a roster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleViolation<T: Debug> {
    /// Fewer than three participants.
    #[error("cycle has {len} participants, need at least {min}", min = MIN_PARTICIPANTS)]
    TooShort {
        /// Cycle length.
        len: usize,
    },

    /// A participant appears more than once in the cycle.
    #[error("participant {0:?} appears more than once")]
    Repeated(T),

    /// A roster member is not part of the cycle.
    #[error("participant {0:?} is missing from the cycle")]
    Missing(T),

    /// The cycle contains someone outside the roster.
    #[error("participant {0:?} is not on the roster")]
    Unknown(T),

    /// A giver is paired with a receiver they exclude.
    #[error("{giver:?} must not give to {receiver:?}")]
    Excluded {
        /// Offending giver.
        giver: T,
        /// Excluded receiver.
        receiver: T,
    },
}

/// A complete circular assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCycle<T> {
    order: Vec<T>,
}

impl<T> AssignmentCycle<T>
where
    T: Clone + Eq + Hash + Debug,
{
    /// Wrap an ordered chain without checking it.
    ///
    /// Use [`AssignmentCycle::verify`] before trusting a cycle from an
    /// external source.
    pub fn from_order(order: Vec<T>) -> Self {
        Self { order }
    }

    /// Participants in giving order.
    pub fn order(&self) -> &[T] {
        &self.order
    }

    /// Number of participants (and of pairs).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True for an empty cycle.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(giver, receiver)` pairs in chain order, wrapping at the end.
    pub fn links(&self) -> impl Iterator<Item = (&T, &T)> {
        let n = self.order.len();
        self.order.iter().enumerate().map(move |(i, giver)| (giver, &self.order[(i + 1) % n]))
    }

    /// Owned assignment pairs, ready for persistence.
    pub fn pairs(&self) -> Vec<Assignment<T>> {
        self.links()
            .map(|(giver, receiver)| Assignment { giver: giver.clone(), receiver: receiver.clone() })
            .collect()
    }

    /// Who `giver` gives to, if they are in the cycle.
    pub fn receiver_of(&self, giver: &T) -> Option<&T> {
        self.links().find(|(g, _)| *g == giver).map(|(_, r)| r)
    }

    /// Who gives to `receiver`, if they are in the cycle.
    pub fn giver_of(&self, receiver: &T) -> Option<&T> {
        self.links().find(|(_, r)| *r == receiver).map(|(g, _)| g)
    }

    /// First link that violates `exclusions`, if any.
    pub fn first_excluded_link(&self, exclusions: &Exclusions<T>) -> Option<(&T, &T)> {
        self.links().find(|(giver, receiver)| exclusions.excludes(giver, receiver))
    }

    /// Check every invariant of a valid assignment against `participants`.
    ///
    /// # Errors
    ///
    /// Returns the first [`CycleViolation`] found.
    pub fn verify(
        &self,
        participants: &[T],
        exclusions: &Exclusions<T>,
    ) -> Result<(), CycleViolation<T>> {
        if self.order.len() < MIN_PARTICIPANTS {
            return Err(CycleViolation::TooShort { len: self.order.len() });
        }

        let mut seen = HashSet::with_capacity(self.order.len());
        for id in &self.order {
            if !seen.insert(id) {
                return Err(CycleViolation::Repeated(id.clone()));
            }
        }

        let roster: HashSet<&T> = participants.iter().collect();
        if let Some(unknown) = self.order.iter().find(|id| !roster.contains(id)) {
            return Err(CycleViolation::Unknown(unknown.clone()));
        }
        if let Some(missing) = participants.iter().find(|id| !seen.contains(id)) {
            return Err(CycleViolation::Missing(missing.clone()));
        }

        if let Some((giver, receiver)) = self.first_excluded_link(exclusions) {
            return Err(CycleViolation::Excluded {
                giver: giver.clone(),
                receiver: receiver.clone(),
            });
        }

        Ok(())
    }
}
