use std::collections::BTreeMap;
use std::path::PathBuf;

use glam::{IVec2, UVec2};

use crate::color::Color;
use crate::object::Object;
use crate::properties::Properties;

/// An image referenced by a tileset, tile or image layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Path resolved against the directory of the document that referenced it.
    pub source: PathBuf,
    /// Declared pixel size, when the document states one.
    pub size: Option<UVec2>,
    /// Color to treat as transparent.
    pub transparent: Option<Color>,
}

/// Pixel rectangle within a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One step of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Local tile index within the same tileset.
    pub tile_id: u32,
    /// Milliseconds.
    pub duration: u32,
}

/// Per-tile metadata. Tiles without any of it are simply absent from [`TileSet::tiles`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Image of its own, for image-collection tilesets.
    pub image: Option<ImageRef>,
    /// Sub-rectangle of the image; `None` means the whole image (or the atlas cell).
    pub rect: Option<TileRect>,
    /// User-defined class (`type` in older files).
    pub class: Option<String>,
    /// Relative weight when the editor picks random tiles.
    pub probability: f32,
    /// Animation frames in playback order; empty for static tiles.
    pub animation: Vec<Frame>,
    /// Collision shapes, in tile-local pixels.
    pub collision: Vec<Object>,
    /// Custom properties.
    pub properties: Properties,
}

impl Default for Tile {
    fn default() -> Self {
        Tile {
            image: None,
            rect: None,
            class: None,
            probability: 1.0,
            animation: Vec::new(),
            collision: Vec::new(),
            properties: Properties::new(),
        }
    }
}

/// A tileset, either an atlas (one image cut into a grid) or an image collection.
///
/// Maps share tilesets through `Arc<TileSet>`; [`insert_tile`](Self::insert_tile) is only
/// reachable while the tileset is still uniquely owned.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    /// Tileset name.
    pub name: String,
    /// User-defined class; empty when unset.
    pub class: String,
    /// Size of one grid cell in pixels.
    pub tile_size: UVec2,
    /// Number of tiles. Taken from the atlas image when the document omits it.
    pub tile_count: u32,
    /// Atlas columns; 0 for image collections.
    pub columns: u32,
    /// Pixels between neighbouring atlas cells.
    pub spacing: u32,
    /// Pixels around the atlas border.
    pub margin: u32,
    /// Drawing offset applied to every tile.
    pub tile_offset: IVec2,
    /// The atlas image; `None` for image-collection tilesets.
    pub image: Option<ImageRef>,
    /// Custom properties.
    pub properties: Properties,
    /// Per-tile metadata keyed by local index.
    pub tiles: BTreeMap<u32, Tile>,
}

impl TileSet {
    /// An empty tileset with the given cell size.
    pub fn new(name: impl Into<String>, tile_size: UVec2) -> Self {
        TileSet {
            name: name.into(),
            class: String::new(),
            tile_size,
            tile_count: 0,
            columns: 0,
            spacing: 0,
            margin: 0,
            tile_offset: IVec2::ZERO,
            image: None,
            properties: Properties::new(),
            tiles: BTreeMap::new(),
        }
    }

    /// Metadata for a local tile index, if any was declared.
    pub fn tile(&self, local: u32) -> Option<&Tile> {
        self.tiles.get(&local)
    }

    /// Adds or replaces per-tile metadata.
    pub fn insert_tile(&mut self, local: u32, tile: Tile) -> Option<Tile> {
        self.tiles.insert(local, tile)
    }

    /// Whether `local` names a tile of this set.
    pub fn contains(&self, local: u32) -> bool {
        local < self.tile_count || self.tiles.contains_key(&local)
    }

    /// Columns and rows of cells that fit in the atlas image.
    ///
    /// `None` without an atlas image or when the image size is unknown.
    pub fn atlas_grid(&self) -> Option<UVec2> {
        let size = self.image.as_ref()?.size?;
        let fit = |extent: u32, tile: u32| {
            let stride = tile.saturating_add(self.spacing);
            if stride == 0 {
                return 0;
            }
            extent
                .saturating_sub(self.margin.saturating_mul(2))
                .saturating_add(self.spacing)
                / stride
        };
        Some(UVec2::new(fit(size.x, self.tile_size.x), fit(size.y, self.tile_size.y)))
    }

    /// Fills `tile_count` and `columns` from the atlas image where the document left them out.
    pub(crate) fn fill_counts_from_image(&mut self) {
        if self.tile_count != 0 && self.columns != 0 {
            return;
        }
        let Some(grid) = self.atlas_grid() else {
            return;
        };
        if self.columns == 0 {
            self.columns = grid.x;
        }
        if self.tile_count == 0 {
            self.tile_count = grid.x.saturating_mul(grid.y);
        }
    }

    /// Pixel bounds of a tile within its source image.
    pub fn tile_rect(&self, local: u32) -> Option<TileRect> {
        if let Some(tile) = self.tiles.get(&local) {
            if let Some(rect) = tile.rect {
                return Some(rect);
            }
            if let Some(image) = &tile.image {
                let size = image.size.unwrap_or(self.tile_size);
                return Some(TileRect {
                    x: 0,
                    y: 0,
                    width: size.x,
                    height: size.y,
                });
            }
        }

        if self.image.is_none() || self.columns == 0 || local >= self.tile_count {
            return None;
        }
        let col = local % self.columns;
        let row = local / self.columns;
        Some(TileRect {
            x: self.margin + col * (self.tile_size.x + self.spacing),
            y: self.margin + row * (self.tile_size.y + self.spacing),
            width: self.tile_size.x,
            height: self.tile_size.y,
        })
    }

    /// The image a tile is cut from: its own image, or the atlas.
    pub fn tile_image(&self, local: u32) -> Option<&ImageRef> {
        self.tiles
            .get(&local)
            .and_then(|t| t.image.as_ref())
            .or(self.image.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas() -> TileSet {
        let mut ts = TileSet::new("terrain", UVec2::new(16, 16));
        ts.tile_count = 8;
        ts.columns = 4;
        ts.spacing = 2;
        ts.margin = 1;
        ts.image = Some(ImageRef {
            source: PathBuf::from("terrain.png"),
            size: Some(UVec2::new(73, 37)),
            transparent: None,
        });
        ts
    }

    #[test]
    fn atlas_rect_accounts_for_margin_and_spacing() {
        let ts = atlas();
        assert_eq!(
            ts.tile_rect(5),
            Some(TileRect { x: 19, y: 19, width: 16, height: 16 })
        );
        assert_eq!(ts.tile_rect(8), None);
    }

    #[test]
    fn collection_tile_uses_its_own_image() {
        let mut ts = TileSet::new("props", UVec2::new(32, 32));
        ts.insert_tile(
            7,
            Tile {
                image: Some(ImageRef {
                    source: PathBuf::from("barrel.png"),
                    size: Some(UVec2::new(24, 40)),
                    transparent: None,
                }),
                ..Tile::default()
            },
        );
        assert!(ts.contains(7));
        assert!(!ts.contains(0));
        assert_eq!(
            ts.tile_rect(7),
            Some(TileRect { x: 0, y: 0, width: 24, height: 40 })
        );
        assert_eq!(ts.tile_image(7).map(|i| i.source.as_path()), Some(std::path::Path::new("barrel.png")));
    }

    #[test]
    fn sparse_tiles_fall_back_to_atlas() {
        let mut ts = atlas();
        ts.insert_tile(2, Tile { probability: 0.5, ..Tile::default() });
        assert_eq!(ts.tile(2).map(|t| t.probability), Some(0.5));
        assert!(ts.tile(3).is_none());
        assert_eq!(ts.tile_rect(2).map(|r| r.x), Some(37));
    }

    #[test]
    fn counts_come_from_image_when_missing() {
        let mut ts = atlas();
        ts.tile_count = 0;
        ts.columns = 0;
        assert_eq!(ts.atlas_grid(), Some(UVec2::new(4, 2)));
        ts.fill_counts_from_image();
        assert_eq!((ts.columns, ts.tile_count), (4, 8));
        assert!(ts.contains(7));
        assert!(!ts.contains(8));

        let mut declared = atlas();
        declared.tile_count = 5;
        declared.fill_counts_from_image();
        assert_eq!((declared.columns, declared.tile_count), (4, 5));

        let mut collection = TileSet::new("props", UVec2::new(16, 16));
        collection.fill_counts_from_image();
        assert_eq!(collection.tile_count, 0);
    }
}
