//! Tile map of an area, read from a Tiled `.tmx` file.
//!
//! Only what the HUD needs survives loading: layer names, tile references
//! and tileset geometry. Rows are stored top-down as in the file; world
//! coordinates grow upwards, so row 0 is the top edge of the map.

use std::path::{Path, PathBuf};

use mural_core::types::Position;
use sdl2::rect::Rect;

/// Name of the layer characters may walk on.
pub const GROUND_LAYER: &str = "ground";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRef {
    pub tileset: usize,
    pub id: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileLayer {
    pub name: String,
    /// Row-major, `width * height` entries.
    pub tiles: Vec<Option<TileRef>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tileset {
    pub image: Option<PathBuf>,
    pub columns: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
}

impl Tileset {
    /// Source rectangle of tile `id` within the tileset image.
    pub fn tile_src(&self, id: u32) -> Rect {
        let columns = self.columns.max(1);
        let col = id % columns;
        let row = id / columns;
        Rect::new(
            (self.margin + col * (self.tile_width + self.spacing)) as i32,
            (self.margin + row * (self.tile_height + self.spacing)) as i32,
            self.tile_width.max(1),
            self.tile_height.max(1),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub layers: Vec<TileLayer>,
    pub tilesets: Vec<Tileset>,
}

impl TileMap {
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut loader = tiled::Loader::new();
        let map = loader
            .load_tmx_map(path)
            .map_err(|err| format!("Failed to load map {}: {err}", path.display()))?;

        let mut layers = Vec::new();
        for layer in map.layers() {
            let Some(tile_layer) = layer.as_tile_layer() else {
                continue;
            };
            let mut tiles = Vec::with_capacity((map.width * map.height) as usize);
            for y in 0..map.height as i32 {
                for x in 0..map.width as i32 {
                    tiles.push(tile_layer.get_tile(x, y).map(|t| TileRef {
                        tileset: t.tileset_index(),
                        id: t.id(),
                    }));
                }
            }
            layers.push(TileLayer {
                name: layer.name.clone(),
                tiles,
            });
        }

        let tilesets = map
            .tilesets()
            .iter()
            .map(|ts| Tileset {
                image: ts.image.as_ref().map(|img| img.source.clone()),
                columns: ts.columns,
                tile_width: ts.tile_width,
                tile_height: ts.tile_height,
                spacing: ts.spacing,
                margin: ts.margin,
            })
            .collect();

        log::info!(
            "Loaded map {} ({}x{} tiles, {} layers)",
            path.display(),
            map.width,
            map.height,
            layers.len()
        );
        Ok(Self {
            width: map.width,
            height: map.height,
            tile_width: map.tile_width,
            tile_height: map.tile_height,
            layers,
            tilesets,
        })
    }

    /// Map extent in world units.
    pub fn size(&self) -> (f64, f64) {
        (
            (self.width * self.tile_width) as f64,
            (self.height * self.tile_height) as f64,
        )
    }

    pub fn tile_size(&self) -> (f64, f64) {
        (self.tile_width.max(1) as f64, self.tile_height.max(1) as f64)
    }

    /// Cell `(column, row)` under a world position.
    pub fn cell_at(&self, pos: Position) -> Option<(u32, u32)> {
        let (tw, th) = self.tile_size();
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let col = (pos.x / tw).floor() as u32;
        let row_from_bottom = (pos.y / th).floor() as u32;
        if col >= self.width || row_from_bottom >= self.height {
            return None;
        }
        Some((col, self.height - 1 - row_from_bottom))
    }

    /// World position of the center of a cell.
    pub fn cell_center(&self, col: u32, row: u32) -> Position {
        let (tw, th) = self.tile_size();
        Position::new(
            col as f64 * tw + tw / 2.0,
            (self.height - 1 - row) as f64 * th + th / 2.0,
        )
    }

    /// World position of the bottom-left corner of a cell.
    pub fn cell_origin(&self, col: u32, row: u32) -> Position {
        let (tw, th) = self.tile_size();
        Position::new(col as f64 * tw, (self.height - 1 - row) as f64 * th)
    }

    pub fn tile(&self, layer: &TileLayer, col: u32, row: u32) -> Option<TileRef> {
        layer
            .tiles
            .get((row * self.width + col) as usize)
            .copied()
            .flatten()
    }

    /// Name of the topmost layer with a tile at `pos`.
    pub fn top_layer_at(&self, pos: Position) -> Option<&str> {
        let (col, row) = self.cell_at(pos)?;
        self.layers
            .iter()
            .rev()
            .find(|layer| self.tile(layer, col, row).is_some())
            .map(|layer| layer.name.as_str())
    }

    /// `true` when the topmost layer at `pos` is the ground layer.
    pub fn is_passable(&self, pos: Position) -> bool {
        self.top_layer_at(pos) == Some(GROUND_LAYER)
    }

    /// Cells intersecting the world box from `min` to `max`, clamped to the
    /// map, as `(columns, rows)` ranges.
    pub fn cells_between(
        &self,
        min: Position,
        max: Position,
    ) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
        let (tw, th) = self.tile_size();
        let clamp = |v: f64, limit: u32| (v.max(0.0) as u32).min(limit);
        let col_start = clamp((min.x / tw).floor(), self.width);
        let col_end = clamp((max.x / tw).ceil(), self.width);
        let bottom = clamp((min.y / th).floor(), self.height);
        let top = clamp((max.y / th).ceil(), self.height);
        // Rows count from the top of the map.
        let row_start = self.height - top;
        let row_end = self.height - bottom;
        (col_start..col_end, row_start..row_end)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 8x8 map of 32px tiles: "ground" everywhere, "water" over the top
    /// left quarter.
    pub(crate) fn test_map() -> TileMap {
        let width = 8;
        let height = 8;
        let ground = TileLayer {
            name: GROUND_LAYER.into(),
            tiles: vec![Some(TileRef { tileset: 0, id: 1 }); 64],
        };
        let mut water = TileLayer {
            name: "water".into(),
            tiles: vec![None; 64],
        };
        for row in 0..4 {
            for col in 0..4 {
                water.tiles[row * width + col] = Some(TileRef { tileset: 0, id: 2 });
            }
        }
        TileMap {
            width: width as u32,
            height,
            tile_width: 32,
            tile_height: 32,
            layers: vec![ground, water],
            tilesets: vec![Tileset {
                image: None,
                columns: 4,
                tile_width: 32,
                tile_height: 32,
                spacing: 0,
                margin: 0,
            }],
        }
    }

    #[test]
    fn cells_count_rows_from_the_top() {
        let map = test_map();
        assert_eq!(map.cell_at(Position::new(0.0, 0.0)), Some((0, 7)));
        assert_eq!(map.cell_at(Position::new(100.0, 255.0)), Some((3, 0)));
        assert_eq!(map.cell_at(Position::new(256.0, 0.0)), None);
        assert_eq!(map.cell_at(Position::new(-1.0, 0.0)), None);
        assert_eq!(map.cell_center(0, 7), Position::new(16.0, 16.0));
    }

    #[test]
    fn passable_only_where_ground_is_on_top() {
        let map = test_map();
        assert!(map.is_passable(Position::new(100.0, 100.0)));
        assert!(!map.is_passable(Position::new(10.0, 250.0)));
        assert!(!map.is_passable(Position::new(1000.0, 100.0)));
    }

    #[test]
    fn culling_clamps_to_map() {
        let map = test_map();
        let (cols, rows) = map.cells_between(Position::new(-50.0, 40.0), Position::new(70.0, 1000.0));
        assert_eq!(cols, 0..3);
        assert_eq!(rows, 0..7);
    }

    #[test]
    fn tile_source_rect() {
        let map = test_map();
        assert_eq!(map.tilesets[0].tile_src(5), Rect::new(32, 32, 32, 32));
    }
}
