/// Side length of a player's square box.
pub const PLAYER_SIZE: i32 = 30;

/// Side length of the collectible's square box.
pub const ITEM_SIZE: i32 = 20;

/// Distance a player moves per key press.
pub const MOVE_STEP: i32 = 10;

/// Score awarded by the default spawner's items.
pub const ITEM_VALUE: u32 = 1;

/// World (canvas) dimensions. Items spawn in `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct WorldBounds {
    pub width: i32,
    pub height: i32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
        }
    }
}

impl WorldBounds {
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= 0 {
            return Err("width must be > 0".to_string());
        }
        if self.height <= 0 {
            return Err("height must be > 0".to_string());
        }
        Ok(())
    }

    /// Whether a point lies inside the spawn area.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }
}
