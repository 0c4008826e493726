//! Circular-chain construction.
//!
//! Given an ordered list of users, user `i` is assigned to user `(i + 1) mod n`.
//! The result is one directed cycle through everyone (a self-loop when there
//! is a single user). Randomness lives only in the shuffle that produces the
//! order.

use std::collections::{HashMap, HashSet};

use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::assignment::Pairing;

/// Chain `order` into a cycle: `order[i] → order[(i + 1) % n]`.
pub fn circular_chain(order: &[Uuid]) -> Vec<Pairing> {
  let n = order.len();
  order
    .iter()
    .enumerate()
    .map(|(i, &assigner)| Pairing { assigner, assignee: order[(i + 1) % n] })
    .collect()
}

/// Shuffle `users` uniformly and chain the result.
pub fn shuffled_chain<R>(users: &[Uuid], rng: &mut R) -> Vec<Pairing>
where
  R: Rng + ?Sized,
{
  let mut order = users.to_vec();
  order.shuffle(rng);
  circular_chain(&order)
}

/// `true` when `pairings` form exactly one directed cycle covering every
/// assigner, with each user appearing once as assigner and once as assignee.
pub fn is_single_cycle(pairings: &[Pairing]) -> bool {
  let Some(first) = pairings.first() else {
    return true;
  };

  let next: HashMap<Uuid, Uuid> =
    pairings.iter().map(|p| (p.assigner, p.assignee)).collect();
  if next.len() != pairings.len() {
    return false;
  }
  let assignees: HashSet<Uuid> = pairings.iter().map(|p| p.assignee).collect();
  if assignees.len() != pairings.len() {
    return false;
  }

  let start = first.assigner;
  let mut current = start;
  for hop in 1..=pairings.len() {
    match next.get(&current) {
      Some(&n) => current = n,
      None => return false,
    }
    if current == start {
      return hop == pairings.len();
    }
  }
  false
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{SeedableRng, rngs::StdRng};

  fn ids(n: usize) -> Vec<Uuid> { (0..n).map(|_| Uuid::new_v4()).collect() }

  #[test]
  fn chain_follows_order() {
    let [a, b, c]: [Uuid; 3] = ids(3).try_into().unwrap();
    let chain = circular_chain(&[b, c, a]);
    assert_eq!(chain, vec![
      Pairing { assigner: b, assignee: c },
      Pairing { assigner: c, assignee: a },
      Pairing { assigner: a, assignee: b },
    ]);
    assert!(is_single_cycle(&chain));
  }

  #[test]
  fn single_user_is_a_self_loop() {
    let users = ids(1);
    let chain = circular_chain(&users);
    assert_eq!(chain.len(), 1);
    assert!(chain[0].is_self_loop());
    assert!(is_single_cycle(&chain));
  }

  #[test]
  fn empty_input_gives_empty_chain() {
    assert!(circular_chain(&[]).is_empty());
  }

  #[test]
  fn two_users_point_at_each_other() {
    let users = ids(2);
    let chain = circular_chain(&users);
    assert_eq!(chain[0].assignee, users[1]);
    assert_eq!(chain[1].assignee, users[0]);
  }

  #[test]
  fn shuffled_chains_are_single_cycles() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in 1..40 {
      let users = ids(n);
      let chain = shuffled_chain(&users, &mut rng);
      assert_eq!(chain.len(), n);
      assert!(is_single_cycle(&chain), "n = {n}");
      if n > 1 {
        assert!(chain.iter().all(|p| !p.is_self_loop()));
      }
    }
  }

  #[test]
  fn detects_two_disjoint_cycles() {
    let [a, b, c, d]: [Uuid; 4] = ids(4).try_into().unwrap();
    let split = vec![
      Pairing { assigner: a, assignee: b },
      Pairing { assigner: b, assignee: a },
      Pairing { assigner: c, assignee: d },
      Pairing { assigner: d, assignee: c },
    ];
    assert!(!is_single_cycle(&split));
  }

  #[test]
  fn detects_shared_assignee() {
    let [a, b, c]: [Uuid; 3] = ids(3).try_into().unwrap();
    let bad = vec![
      Pairing { assigner: a, assignee: b },
      Pairing { assigner: b, assignee: c },
      Pairing { assigner: c, assignee: b },
    ];
    assert!(!is_single_cycle(&bad));
  }
}
