//! Brute-force cycle enumeration.
//!
//! Every cyclic order of `n` participants is listed with the first
//! participant pinned, so each distinct cycle appears exactly once and there
//! are `(n - 1)!` candidates. Only usable for small rosters.

use std::hash::Hash;

use kringle_core::Exclusions;

/// Every valid cycle over `participants`, each starting with
/// `participants[0]`.
///
/// A cycle is valid when no giver is excluded from their successor
/// (wrapping from the last back to the first). Rosters below two people
/// have no cycles.
pub fn valid_cycles<T>(participants: &[T], exclusions: &Exclusions<T>) -> Vec<Vec<T>>
where
    T: Clone + Eq + Hash,
{
    let mut found = Vec::new();
    let Some((first, rest)) = participants.split_first() else {
        return found;
    };
    if rest.is_empty() {
        return found;
    }

    let mut order = vec![first.clone()];
    let mut remaining: Vec<T> = rest.to_vec();
    extend(&mut order, &mut remaining, exclusions, &mut found);
    found
}

fn extend<T>(
    order: &mut Vec<T>,
    remaining: &mut Vec<T>,
    exclusions: &Exclusions<T>,
    found: &mut Vec<Vec<T>>,
) where
    T: Clone + Eq + Hash,
{
    let (Some(first), Some(last)) = (order.first().cloned(), order.last().cloned()) else {
        return;
    };

    if remaining.is_empty() {
        if !exclusions.excludes(&last, &first) {
            found.push(order.clone());
        }
        return;
    }

    for i in 0..remaining.len() {
        if exclusions.excludes(&last, &remaining[i]) {
            continue;
        }
        let next = remaining.remove(i);
        order.push(next);
        extend(order, remaining, exclusions, found);
        if let Some(next) = order.pop() {
            remaining.insert(i, next);
        }
    }
}

/// Number of valid cycles.
pub fn count_valid_cycles<T>(participants: &[T], exclusions: &Exclusions<T>) -> usize
where
    T: Clone + Eq + Hash,
{
    valid_cycles(participants, exclusions).len()
}

/// Whether any valid cycle of at least three participants exists.
pub fn is_feasible<T>(participants: &[T], exclusions: &Exclusions<T>) -> bool
where
    T: Clone + Eq + Hash,
{
    participants.len() >= kringle_core::MIN_PARTICIPANTS
        && count_valid_cycles(participants, exclusions) > 0
}
