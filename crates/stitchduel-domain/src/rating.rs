//! Rating winner selection

use stitchduel_types::RatingRecord;

/// Return the winners from a rating list.
///
/// Winners are the top 3 positions, plus anyone with the same number of
/// wins as any of those positions. Expects the list sorted by total duels
/// won, descending.
pub fn compute_winners(rating: &[RatingRecord]) -> Vec<RatingRecord> {
    if rating.is_empty() {
        return Vec::new();
    }
    if rating.len() <= 3 {
        return rating.to_vec();
    }

    let win_counts: Vec<u32> = rating[..3].iter().map(|r| r.total_duels_won).collect();

    rating
        .iter()
        .filter(|r| win_counts.contains(&r.total_duels_won))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitchduel_types::{RatedUser, SkillTier, UserId};

    fn record(wins: u32, participated: u32) -> RatingRecord {
        RatingRecord {
            user: RatedUser {
                id: UserId::new(),
                fullname: format!("user-{wins}-{participated}"),
                photo_url: None,
                tier: SkillTier::Intermediate,
            },
            total_duels_won: wins,
            total_duels_participated: participated,
        }
    }

    #[test]
    fn test_empty_rating() {
        assert!(compute_winners(&[]).is_empty());
    }

    #[test]
    fn test_short_rating_returned_whole() {
        let rating = vec![record(2, 3), record(1, 4), record(0, 2)];
        assert_eq!(compute_winners(&rating).len(), 3);
    }

    #[test]
    fn test_ties_widen_the_winner_set() {
        // Top-3 win values are 10, 10, 8; the tie at 8 pulls in a fourth.
        let rating = vec![
            record(10, 12),
            record(10, 11),
            record(8, 9),
            record(8, 10),
            record(5, 8),
        ];
        let winners = compute_winners(&rating);
        assert_eq!(winners.len(), 4);
        assert!(winners.iter().all(|w| w.total_duels_won >= 8));
    }

    #[test]
    fn test_no_widening_without_ties() {
        let rating = vec![record(9, 9), record(7, 9), record(5, 9), record(3, 9)];
        let winners = compute_winners(&rating);
        assert_eq!(winners.len(), 3);
    }
}
