//! Weekly pairing algorithm
//!
//! Groups the eligible users into duel pairs, keeping pairs inside the same
//! skill tier wherever the tier sizes allow it. Tiers are processed in
//! order; a tier's odd leftover carries forward into the next tier's pool,
//! so at most one leftover is ever in flight and the output contains at
//! most one group of size 3.

use rand::seq::SliceRandom;
use rand::Rng;

use stitchduel_types::{DuelError, DuelResult, PairingCandidate, SkillTier};

/// Group eligible users into duel pairs.
///
/// Returns groups of size 2, plus at most one group of size 3 when the
/// total count is odd. Every input user appears in exactly one group.
/// Fails with [`DuelError::NotEnoughUsers`] when fewer than two users are
/// supplied.
pub fn pair_users<R: Rng + ?Sized>(
    users: &[PairingCandidate],
    rng: &mut R,
) -> DuelResult<Vec<Vec<PairingCandidate>>> {
    if users.len() < 2 {
        return Err(DuelError::NotEnoughUsers { count: users.len() });
    }

    let mut groups: Vec<Vec<PairingCandidate>> = Vec::with_capacity(users.len() / 2 + 1);
    let mut leftovers: Vec<PairingCandidate> = Vec::new();

    for tier in SkillTier::ALL {
        let mut pool: Vec<PairingCandidate> =
            users.iter().filter(|u| u.tier == tier).cloned().collect();
        if pool.is_empty() {
            continue;
        }

        pool.shuffle(rng);

        if pool.len() == 1 {
            // A lone member cannot pair inside its tier; carry it forward.
            leftovers.append(&mut pool);
            continue;
        }

        // Merge any carried leftover into this tier before pairing.
        pool.append(&mut leftovers);

        while pool.len() >= 2 {
            let a = pool.pop().expect("pool has at least two members");
            let b = pool.pop().expect("pool has at least two members");
            groups.push(vec![a, b]);
        }

        // A single remainder carries into the next tier's pool.
        leftovers.append(&mut pool);
    }

    if leftovers.len() >= 2 {
        // Trailing singleton tiers left us a cross-tier pool; it becomes
        // one final group.
        groups.push(leftovers);
    } else if let Some(leftover) = leftovers.pop() {
        let mut last = groups.pop().expect("at least one group exists");
        if last.len() >= 3 {
            // The last group is already a trio; split one member out to
            // pair with the leftover instead of growing it further.
            let moved = last.pop().expect("group has members");
            groups.push(last);
            groups.push(vec![moved, leftover]);
        } else {
            last.push(leftover);
            groups.push(last);
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use stitchduel_types::UserId;

    fn candidate(name: &str, tier: SkillTier) -> PairingCandidate {
        PairingCandidate {
            id: UserId::new(),
            fullname: name.to_string(),
            tier,
        }
    }

    fn candidates(counts: [usize; 3]) -> Vec<PairingCandidate> {
        let mut users = Vec::new();
        for (tier, count) in SkillTier::ALL.into_iter().zip(counts) {
            for i in 0..count {
                users.push(candidate(&format!("{tier}-{i}"), tier));
            }
        }
        users
    }

    fn assert_full_cover(users: &[PairingCandidate], groups: &[Vec<PairingCandidate>]) {
        let mut seen = HashSet::new();
        for group in groups {
            for user in group {
                assert!(seen.insert(user.id), "user {} appears twice", user.fullname);
            }
        }
        let all: HashSet<_> = users.iter().map(|u| u.id).collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_too_few_users() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            pair_users(&[], &mut rng),
            Err(DuelError::NotEnoughUsers { count: 0 })
        ));
        let one = candidates([1, 0, 0]);
        assert!(matches!(
            pair_users(&one, &mut rng),
            Err(DuelError::NotEnoughUsers { count: 1 })
        ));
    }

    #[test]
    fn test_even_count_yields_all_pairs() {
        let mut rng = StdRng::seed_from_u64(7);
        let users = candidates([4, 6, 2]);
        let groups = pair_users(&users, &mut rng).unwrap();
        assert_eq!(groups.len(), 6);
        assert!(groups.iter().all(|g| g.len() == 2));
        assert_full_cover(&users, &groups);
    }

    #[test]
    fn test_odd_count_yields_exactly_one_trio() {
        let mut rng = StdRng::seed_from_u64(7);
        let users = candidates([5, 5, 5]);
        let groups = pair_users(&users, &mut rng).unwrap();
        let trios = groups.iter().filter(|g| g.len() == 3).count();
        let pairs = groups.iter().filter(|g| g.len() == 2).count();
        assert_eq!(trios, 1);
        assert_eq!(pairs, 6);
        assert_full_cover(&users, &groups);
    }

    #[test]
    fn test_balanced_tiers_pair_within_tier() {
        let mut rng = StdRng::seed_from_u64(42);
        let users = candidates([4, 4, 4]);
        let groups = pair_users(&users, &mut rng).unwrap();
        for group in &groups {
            assert!(group.iter().all(|u| u.tier == group[0].tier));
        }
    }

    #[test]
    fn test_singleton_tiers_form_cross_tier_group() {
        let mut rng = StdRng::seed_from_u64(3);
        let users = candidates([1, 1, 0]);
        let groups = pair_users(&users, &mut rng).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_ne!(groups[0][0].tier, groups[0][1].tier);
    }

    #[test]
    fn test_three_singleton_tiers_form_one_trio() {
        let mut rng = StdRng::seed_from_u64(3);
        let users = candidates([1, 1, 1]);
        let groups = pair_users(&users, &mut rng).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_leftover_carries_into_next_tier() {
        // 3 novices + 3 intermediates: the novice leftover must pair with
        // an intermediate rather than minting a second trio.
        let mut rng = StdRng::seed_from_u64(11);
        let users = candidates([3, 3, 0]);
        let groups = pair_users(&users, &mut rng).unwrap();
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == 2));
        assert_full_cover(&users, &groups);
    }

    #[test]
    fn test_property_sizes_over_many_shapes() {
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let counts = [
                (seed % 5) as usize,
                ((seed / 5) % 5) as usize + 1,
                ((seed / 3) % 4) as usize + 1,
            ];
            let users = candidates(counts);
            if users.len() < 2 {
                continue;
            }
            let groups = pair_users(&users, &mut rng).unwrap();
            assert_full_cover(&users, &groups);
            let trios = groups.iter().filter(|g| g.len() == 3).count();
            if users.len() % 2 == 0 {
                assert_eq!(trios, 0, "even pool produced a trio (seed {seed})");
                assert_eq!(groups.len(), users.len() / 2);
            } else {
                assert_eq!(trios, 1, "odd pool needs exactly one trio (seed {seed})");
                assert_eq!(groups.len(), users.len() / 2);
            }
        }
    }
}
