//! Fog of war for the player's point of view.
//!
//! Every tick all `Visible` tiles fall back to `Memory`, then each
//! player-owned unit and building reveals a circle of tiles around itself.
//! A tile never returns to `Unexplored` once it has been seen.

use serde::{Deserialize, Serialize};

/// Visibility of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FogState {
    /// Never seen.
    #[default]
    Unexplored,
    /// Seen before, not currently in vision.
    Memory,
    /// In vision this tick.
    Visible,
}

/// A vision source: tile coordinates and radius in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionSource {
    /// Tile column.
    pub x: i64,
    /// Tile row.
    pub y: i64,
    /// Radius in tiles.
    pub radius: u32,
}

/// Per-tile visibility grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogOfWar {
    width: u32,
    height: u32,
    tiles: Vec<FogState>,
}

impl FogOfWar {
    /// Create a fully unexplored grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![FogState::Unexplored; (width as usize) * (height as usize)],
        }
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let ux = usize::try_from(x).ok()?;
        let uy = usize::try_from(y).ok()?;
        (ux < self.width as usize && uy < self.height as usize)
            .then(|| uy * self.width as usize + ux)
    }

    /// State of one tile, `None` when out of bounds.
    #[must_use]
    pub fn state(&self, x: i64, y: i64) -> Option<FogState> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    /// All tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[FogState] {
        &self.tiles
    }

    /// Number of tiles in a given state.
    #[must_use]
    pub fn count(&self, state: FogState) -> usize {
        self.tiles.iter().filter(|t| **t == state).count()
    }

    /// Demote every `Visible` tile to `Memory`.
    pub fn fade(&mut self) {
        for tile in &mut self.tiles {
            if *tile == FogState::Visible {
                *tile = FogState::Memory;
            }
        }
    }

    /// Mark tiles within `radius` tiles (Euclidean) of a center as visible.
    pub fn reveal(&mut self, source: VisionSource) {
        let r = i64::from(source.radius);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                if let Some(i) = self.index(source.x + dx, source.y + dy) {
                    self.tiles[i] = FogState::Visible;
                }
            }
        }
    }

    /// Fade, then reveal around every source.
    pub fn recompute(&mut self, sources: impl IntoIterator<Item = VisionSource>) {
        self.fade();
        for source in sources {
            self.reveal(source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn source(x: i64, y: i64, radius: u32) -> VisionSource {
        VisionSource { x, y, radius }
    }

    #[test]
    fn test_starts_unexplored() {
        let fog = FogOfWar::new(4, 4);
        assert_eq!(fog.count(FogState::Unexplored), 16);
        assert_eq!(fog.state(4, 0), None);
    }

    #[test]
    fn test_reveal_is_circular() {
        let mut fog = FogOfWar::new(10, 10);
        fog.reveal(source(5, 5, 2));
        assert_eq!(fog.state(5, 3), Some(FogState::Visible));
        assert_eq!(fog.state(7, 5), Some(FogState::Visible));
        assert_eq!(fog.state(6, 6), Some(FogState::Visible));
        // corner of the bounding square is outside the circle
        assert_eq!(fog.state(7, 7), Some(FogState::Unexplored));
        assert_eq!(fog.count(FogState::Visible), 13);
    }

    #[test]
    fn test_reveal_clips_at_edges() {
        let mut fog = FogOfWar::new(3, 3);
        fog.reveal(source(0, 0, 1));
        assert_eq!(fog.count(FogState::Visible), 3);
    }

    #[test]
    fn test_recompute_demotes_to_memory() {
        let mut fog = FogOfWar::new(10, 1);
        fog.recompute([source(1, 0, 1)]);
        fog.recompute([source(8, 0, 1)]);
        assert_eq!(fog.state(1, 0), Some(FogState::Memory));
        assert_eq!(fog.state(8, 0), Some(FogState::Visible));
        assert_eq!(fog.state(4, 0), Some(FogState::Unexplored));
    }

    proptest! {
        #[test]
        fn prop_seen_tiles_never_become_unexplored(
            moves in proptest::collection::vec((0i64..12, 0i64..12, 0u32..4), 1..20)
        ) {
            let mut fog = FogOfWar::new(12, 12);
            let mut seen = vec![false; 144];
            for (x, y, r) in moves {
                fog.recompute([source(x, y, r)]);
                for (i, tile) in fog.tiles().iter().enumerate() {
                    if *tile != FogState::Unexplored {
                        seen[i] = true;
                    }
                    prop_assert!(!(seen[i] && *tile == FogState::Unexplored));
                }
            }
        }
    }
}
