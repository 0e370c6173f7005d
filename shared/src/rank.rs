use std::cmp::Ordering;
use std::fmt;

use crate::protocol::Player;

/// 1-based leaderboard position of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub position: usize,
    pub total: usize,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.position, self.total)
    }
}

/// Leaderboard order: higher score first, ties broken by identity so every
/// client computes the same order from the same snapshot.
pub fn leaderboard_order(a: &Player, b: &Player) -> Ordering {
    b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

/// Rank `id` within `players`.
///
/// An empty snapshot ranks the caller 1/1 (a client that has not yet
/// received any update). Returns `None` when the snapshot is non-empty but
/// does not contain `id`.
pub fn rank(players: &[Player], id: &str) -> Option<Rank> {
    if players.is_empty() {
        return Some(Rank {
            position: 1,
            total: 1,
        });
    }

    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| leaderboard_order(a, b));
    let index = sorted.iter().position(|p| p.id == id)?;

    Some(Rank {
        position: index + 1,
        total: sorted.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, score: u32) -> Player {
        Player {
            x: 0,
            y: 0,
            score,
            id: id.to_string(),
        }
    }

    #[test]
    fn empty_snapshot_is_one_of_one() {
        let r = rank(&[], "anyone").unwrap();
        assert_eq!(r.to_string(), "1/1");
    }

    #[test]
    fn single_player_is_first() {
        let r = rank(&[scored("solo", 4)], "solo").unwrap();
        assert_eq!(r.to_string(), "1/1");
    }

    #[test]
    fn orders_by_score_descending() {
        let players = [scored("a", 10), scored("b", 30), scored("c", 20)];
        assert_eq!(rank(&players, "b").unwrap().to_string(), "1/3");
        assert_eq!(rank(&players, "c").unwrap().to_string(), "2/3");
        assert_eq!(rank(&players, "a").unwrap().to_string(), "3/3");
    }

    #[test]
    fn ties_break_by_identity() {
        let players = [scored("zed", 5), scored("amy", 5), scored("max", 5)];
        assert_eq!(rank(&players, "amy").unwrap().position, 1);
        assert_eq!(rank(&players, "max").unwrap().position, 2);
        assert_eq!(rank(&players, "zed").unwrap().position, 3);

        // Input order does not matter.
        let shuffled = [scored("max", 5), scored("zed", 5), scored("amy", 5)];
        for id in ["amy", "max", "zed"] {
            assert_eq!(rank(&players, id), rank(&shuffled, id));
        }
    }

    #[test]
    fn rank_always_within_bounds() {
        let players: Vec<Player> = (0..25)
            .map(|i| scored(&format!("p{}", i), (i * 7 % 5) as u32))
            .collect();
        for p in &players {
            let r = rank(&players, &p.id).unwrap();
            assert!(r.position >= 1 && r.position <= r.total);
            assert_eq!(r.total, 25);
        }
    }

    #[test]
    fn unknown_identity_has_no_rank() {
        let players = [scored("a", 1)];
        assert_eq!(rank(&players, "ghost"), None);
    }
}
