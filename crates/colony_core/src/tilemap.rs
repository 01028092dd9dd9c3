//! Tile grid with static obstacles and dynamic collision footprints.
//!
//! Tiles are stored row-major. Pixel positions convert to tile coordinates
//! by flooring against the tile size; anything outside the grid has no tile.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::kinds::TileKind;
use crate::math::{Rect, Vec2};

/// Map tiles plus everything units cannot walk through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Side length of a tile in pixels.
    tile_size: f64,
    /// Tile kinds in row-major order.
    tiles: Vec<TileKind>,
    /// Static map objects (rocks, water edges).
    obstacles: Vec<Rect>,
    /// Footprints registered by buildings.
    collision_rects: Vec<Rect>,
}

impl TileMap {
    /// Create a map of plain tiles.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, or if `tile_size` is not positive.
    #[must_use]
    pub fn new(width: u32, height: u32, tile_size: f64) -> Self {
        assert!(width > 0, "TileMap width must be positive");
        assert!(height > 0, "TileMap height must be positive");
        assert!(tile_size > 0.0, "TileMap tile_size must be positive");

        Self {
            width,
            height,
            tile_size,
            tiles: vec![TileKind::Plain; (width as usize) * (height as usize)],
            obstacles: Vec::new(),
            collision_rects: Vec::new(),
        }
    }

    /// Build a map from ASCII rows.
    ///
    /// `.` is plain ground, `s` sucrose, `w` wood, and `#` a plain tile
    /// covered by a static obstacle.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] for empty input, ragged rows, or
    /// unknown characters.
    ///
    /// # Example
    ///
    /// ```
    /// use colony_core::tilemap::TileMap;
    /// use colony_core::kinds::TileKind;
    ///
    /// let map = TileMap::from_rows(&["..s", ".#w"], 128.0).unwrap();
    /// assert_eq!(map.tile_by_coords(2, 0), Some(TileKind::Sucrose));
    /// assert!(!map.is_walkable(1, 1));
    /// ```
    pub fn from_rows(rows: &[&str], tile_size: f64) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 || height == 0 {
            return Err(GameError::InvalidState("empty tile map".to_string()));
        }

        let mut map = Self::new(
            u32::try_from(width).map_err(|_| GameError::InvalidState("map too wide".into()))?,
            u32::try_from(height).map_err(|_| GameError::InvalidState("map too tall".into()))?,
            tile_size,
        );
        for (y, row) in (0u32..).zip(rows) {
            if row.chars().count() != width {
                return Err(GameError::InvalidState(format!(
                    "row {y} has {} tiles, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, ch) in (0u32..).zip(row.chars()) {
                let kind = match ch {
                    '.' | '#' => TileKind::Plain,
                    's' => TileKind::Sucrose,
                    'w' => TileKind::Wood,
                    other => {
                        return Err(GameError::InvalidState(format!(
                            "unknown tile '{other}' at ({x}, {y})"
                        )))
                    }
                };
                map.set_tile(x, y, kind);
                if ch == '#' {
                    let rect = map.tile_rect(x, y);
                    map.add_obstacle(rect);
                }
            }
        }
        Ok(map)
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

    /// Tile side length in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Map width in pixels.
    #[must_use]
    pub fn pixel_width(&self) -> f64 {
        f64::from(self.width) * self.tile_size
    }

    /// Map height in pixels.
    #[must_use]
    pub fn pixel_height(&self) -> f64 {
        f64::from(self.height) * self.tile_size
    }

    #[inline]
    fn coords_to_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Check if tile coordinates are within the grid.
    #[must_use]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Set the kind of one tile. Returns `false` if out of bounds.
    pub fn set_tile(&mut self, x: u32, y: u32, kind: TileKind) -> bool {
        if !self.in_bounds(i64::from(x), i64::from(y)) {
            return false;
        }
        let index = self.coords_to_index(x, y);
        self.tiles[index] = kind;
        true
    }

    /// Tile kind at tile coordinates.
    #[must_use]
    pub fn tile_by_coords(&self, x: i64, y: i64) -> Option<TileKind> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        Some(self.tiles[self.coords_to_index(x, y)])
    }

    /// Tile coordinates containing a pixel position, if on the map.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_tile(&self, pos: Vec2) -> Option<(i64, i64)> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let x = (pos.x / self.tile_size).floor() as i64;
        let y = (pos.y / self.tile_size).floor() as i64;
        self.in_bounds(x, y).then_some((x, y))
    }

    /// Tile kind under a pixel position.
    #[must_use]
    pub fn tile_at(&self, pos: Vec2) -> Option<TileKind> {
        let (x, y) = self.world_to_tile(pos)?;
        self.tile_by_coords(x, y)
    }

    /// Pixel center of a tile.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn tile_center(&self, x: i64, y: i64) -> Vec2 {
        let half = self.tile_size / 2.0;
        Vec2::new(
            x as f64 * self.tile_size + half,
            y as f64 * self.tile_size + half,
        )
    }

    /// Pixel rectangle covered by a tile.
    #[must_use]
    pub fn tile_rect(&self, x: u32, y: u32) -> Rect {
        Rect::from_origin_size(
            Vec2::new(f64::from(x) * self.tile_size, f64::from(y) * self.tile_size),
            self.tile_size,
            self.tile_size,
        )
    }

    /// Add a static map obstacle.
    pub fn add_obstacle(&mut self, rect: Rect) {
        self.obstacles.push(rect);
    }

    /// Static map obstacles.
    #[must_use]
    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    /// Register a building footprint.
    pub fn add_collision_rect(&mut self, rect: Rect) {
        self.collision_rects.push(rect);
    }

    /// Remove one previously registered footprint.
    ///
    /// Returns `false` if no identical footprint was registered.
    pub fn remove_collision_rect(&mut self, rect: &Rect) -> bool {
        if let Some(pos) = self.collision_rects.iter().position(|r| r == rect) {
            self.collision_rects.swap_remove(pos);
            true
        } else {
            false
        }
    }

    /// Registered building footprints.
    #[must_use]
    pub fn collision_rects(&self) -> &[Rect] {
        &self.collision_rects
    }

    /// In bounds and not covered by an obstacle or footprint.
    #[must_use]
    pub fn is_walkable(&self, x: i64, y: i64) -> bool {
        let (Ok(ux), Ok(uy)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        if !self.in_bounds(x, y) {
            return false;
        }
        let rect = self.tile_rect(ux, uy);
        !self
            .obstacles
            .iter()
            .chain(&self.collision_rects)
            .any(|r| r.overlaps(&rect))
    }
}
