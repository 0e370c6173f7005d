use arena_shared::config::ITEM_VALUE;
use arena_shared::{Item, WorldBounds};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Owns the single live collectible and replaces it on demand.
pub struct ItemSpawner {
    bounds: WorldBounds,
    rng: ChaCha8Rng,
    next_id: u64,
    current: Item,
}

impl ItemSpawner {
    /// Builds the spawner with a first item already placed. `bounds` must be
    /// valid (see [`WorldBounds::validate`]).
    pub fn new(bounds: WorldBounds, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let current = Self::place(&mut rng, bounds, 1);
        Self {
            bounds,
            rng,
            next_id: 2,
            current,
        }
    }

    fn place(rng: &mut ChaCha8Rng, bounds: WorldBounds, id: u64) -> Item {
        let item = Item {
            x: rng.gen_range(0..bounds.width),
            y: rng.gen_range(0..bounds.height),
            value: ITEM_VALUE,
            id,
        };
        debug_assert!(bounds.contains(item.x, item.y));
        item
    }

    /// Discard the live item and place a fresh one. Ids are monotonic, so
    /// the new item never shares an id with any earlier one.
    pub fn spawn(&mut self) -> &Item {
        let id = self.next_id;
        self.next_id += 1;
        self.current = Self::place(&mut self.rng, self.bounds, id);
        &self.current
    }

    pub fn current(&self) -> &Item {
        &self.current
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawns_stay_in_bounds() {
        let bounds = WorldBounds::default();
        let mut spawner = ItemSpawner::new(bounds, Some(12345));
        assert!(bounds.contains(spawner.current().x, spawner.current().y));
        for _ in 0..10_000 {
            let item = spawner.spawn();
            assert!((0..600).contains(&item.x), "x out of range: {}", item.x);
            assert!((0..400).contains(&item.y), "y out of range: {}", item.y);
            assert_eq!(item.value, 1);
        }
    }

    #[test]
    fn tiny_world_still_spawns() {
        let bounds = WorldBounds {
            width: 1,
            height: 1,
        };
        let mut spawner = ItemSpawner::new(bounds, None);
        let item = spawner.spawn();
        assert_eq!((item.x, item.y), (0, 0));
    }

    #[test]
    fn every_spawn_gets_new_id() {
        let mut spawner = ItemSpawner::new(WorldBounds::default(), Some(1));
        let mut last = spawner.current().id;
        for _ in 0..100 {
            let id = spawner.spawn().id;
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ItemSpawner::new(WorldBounds::default(), Some(99));
        let mut b = ItemSpawner::new(WorldBounds::default(), Some(99));
        assert_eq!(a.current(), b.current());
        for _ in 0..10 {
            assert_eq!(a.spawn(), b.spawn());
        }
    }
}
