use arena_shared::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Authoritative list of connected players, kept in join order.
///
/// Holds at most one entry per identity. Records are always replaced
/// wholesale; there is no field-level merge.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: Vec<Player>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Insert `player`, or replace the entry with the same identity.
    pub fn upsert(&mut self, player: Player) -> Upsert {
        match self.index_of(&player.id) {
            Some(index) => {
                self.players[index] = player;
                Upsert::Replaced
            }
            None => {
                self.players.push(player);
                Upsert::Inserted
            }
        }
    }

    /// Replace an existing entry. Returns false (and changes nothing) when
    /// the identity is unknown.
    pub fn replace(&mut self, player: Player) -> bool {
        match self.index_of(&player.id) {
            Some(index) => {
                self.players[index] = player;
                true
            }
            None => false,
        }
    }

    /// Remove by identity. Absent identities are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Player> {
        let index = self.index_of(id)?;
        Some(self.players.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Snapshot of every player, in join order.
    pub fn list(&self) -> Vec<Player> {
        self.players.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_inserts_then_replaces() {
        let mut registry = SessionRegistry::new();
        assert_eq!(registry.upsert(Player::new("a", 1, 1)), Upsert::Inserted);

        let mut moved = Player::new("a", 50, 60);
        moved.score = 3;
        assert_eq!(registry.upsert(moved.clone()), Upsert::Replaced);

        assert_eq!(registry.list(), vec![moved]);
    }

    #[test]
    fn identities_stay_unique() {
        let mut registry = SessionRegistry::new();
        for i in 0..20 {
            registry.upsert(Player::new(format!("p{}", i % 4), i, i));
        }
        let list = registry.list();
        assert_eq!(list.len(), 4);
        for p in &list {
            assert_eq!(list.iter().filter(|q| q.id == p.id).count(), 1);
        }
    }

    #[test]
    fn list_keeps_join_order() {
        let mut registry = SessionRegistry::new();
        registry.upsert(Player::new("b", 0, 0));
        registry.upsert(Player::new("a", 0, 0));
        registry.upsert(Player::new("c", 0, 0));
        registry.upsert(Player::new("a", 9, 9));
        let ids: Vec<String> = registry.list().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn replace_ignores_unknown_identity() {
        let mut registry = SessionRegistry::new();
        registry.upsert(Player::new("a", 0, 0));
        assert!(!registry.replace(Player::new("ghost", 5, 5)));
        assert_eq!(registry.list(), vec![Player::new("a", 0, 0)]);

        assert!(registry.replace(Player::new("a", 5, 5)));
        assert_eq!(registry.get("a").unwrap().x, 5);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = SessionRegistry::new();
        registry.upsert(Player::new("a", 0, 0));
        registry.upsert(Player::new("b", 0, 0));

        assert!(registry.remove("a").is_some());
        let after_first = registry.list();
        assert!(registry.remove("a").is_none());
        assert!(registry.remove("never").is_none());
        assert_eq!(registry.list(), after_first);
        assert_eq!(registry.list().len(), 1);
    }
}
