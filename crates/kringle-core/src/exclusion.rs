//! Exclusion relation between participants.
//!
//! An exclusion `giver -> receiver` forbids the giver from being assigned to
//! give to the receiver. Exclusions exchanged with the generator are expected
//! to be symmetric; [`Exclusions::insert_pair`] maintains that, while
//! [`Exclusions::insert_directed`] records caller data as-is.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use serde::{Deserialize, Serialize};

/// Mapping from a giver to the receivers they must not give to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Eq + Hash",
    deserialize = "T: Deserialize<'de> + Eq + Hash"
))]
pub struct Exclusions<T> {
    forbidden: HashMap<T, HashSet<T>>,
}

impl<T> Default for Exclusions<T> {
    fn default() -> Self {
        Self { forbidden: HashMap::new() }
    }
}

impl<T: Eq + Hash> PartialEq for Exclusions<T> {
    fn eq(&self, other: &Self) -> bool {
        self.forbidden == other.forbidden
    }
}

impl<T: Eq + Hash> Eq for Exclusions<T> {}

impl<T> Exclusions<T>
where
    T: Clone + Eq + Hash,
{
    /// Empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude `a` and `b` from each other in both directions.
    ///
    /// Returns `false` (and records nothing) when `a == b`.
    pub fn insert_pair(&mut self, a: T, b: T) -> bool {
        if a == b {
            return false;
        }
        self.forbidden.entry(a.clone()).or_default().insert(b.clone());
        self.forbidden.entry(b).or_default().insert(a);
        true
    }

    /// Forbid `giver` from giving to `receiver` without touching the reverse
    /// direction.
    ///
    /// Returns `false` (and records nothing) when `giver == receiver`.
    pub fn insert_directed(&mut self, giver: T, receiver: T) -> bool {
        if giver == receiver {
            return false;
        }
        self.forbidden.entry(giver).or_default().insert(receiver);
        true
    }

    /// Drop the exclusion between `a` and `b` in both directions.
    pub fn remove_pair(&mut self, a: &T, b: &T) {
        self.remove_directed(a, b);
        self.remove_directed(b, a);
    }

    fn remove_directed(&mut self, giver: &T, receiver: &T) {
        if let Some(set) = self.forbidden.get_mut(giver) {
            set.remove(receiver);
            if set.is_empty() {
                self.forbidden.remove(giver);
            }
        }
    }

    /// Drop every exclusion mentioning `participant`.
    pub fn remove_participant(&mut self, participant: &T) {
        self.forbidden.remove(participant);
        self.forbidden.retain(|_, set| {
            set.remove(participant);
            !set.is_empty()
        });
    }

    /// Whether `giver` is forbidden from giving to `receiver`.
    pub fn excludes(&self, giver: &T, receiver: &T) -> bool {
        self.forbidden.get(giver).is_some_and(|set| set.contains(receiver))
    }

    /// Receivers forbidden for `giver`.
    pub fn excluded_for(&self, giver: &T) -> impl Iterator<Item = &T> {
        self.forbidden.get(giver).into_iter().flatten()
    }

    /// Every directed `(giver, receiver)` exclusion.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &T)> {
        self.forbidden.iter().flat_map(|(giver, set)| set.iter().map(move |r| (giver, r)))
    }

    /// Number of directed exclusions.
    pub fn len(&self) -> usize {
        self.forbidden.values().map(HashSet::len).sum()
    }

    /// True if no exclusion is recorded.
    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty()
    }

    /// True if every `a -> b` has a matching `b -> a`.
    pub fn is_symmetric(&self) -> bool {
        self.iter().all(|(giver, receiver)| self.excludes(receiver, giver))
    }

    /// Union of the relation with its reverse.
    pub fn symmetrized(&self) -> Self {
        let mut out = self.clone();
        for (giver, receiver) in self.iter() {
            out.insert_directed(receiver.clone(), giver.clone());
        }
        out
    }

    /// Restrict the relation to exclusions whose both ends satisfy `keep`.
    pub fn restricted_to(&self, keep: impl Fn(&T) -> bool) -> Self {
        let mut out = Self::new();
        for (giver, receiver) in self.iter() {
            if keep(giver) && keep(receiver) {
                out.insert_directed(giver.clone(), receiver.clone());
            }
        }
        out
    }

    /// Exclude every member of `group` from every other member.
    pub fn insert_group<'a>(&mut self, group: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        let members: Vec<&T> = group.into_iter().collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                self.insert_pair((*a).clone(), (*b).clone());
            }
        }
    }

    /// Undo [`Exclusions::insert_group`] for the same members.
    pub fn remove_group<'a>(&mut self, group: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        let members: Vec<&T> = group.into_iter().collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                self.remove_pair(a, b);
            }
        }
    }
}

impl<T> FromIterator<(T, T)> for Exclusions<T>
where
    T: Clone + Eq + Hash,
{
    /// Collect reciprocal pairs.
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (a, b) in iter {
            out.insert_pair(a, b);
        }
        out
    }
}
