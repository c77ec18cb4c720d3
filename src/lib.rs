#![warn(missing_docs)]

//! Engine-agnostic document model for Tiled maps.
//!
//! Maps (`.tmx`/`.tmj`) and tilesets (`.tsx`/`.tsj`) are decoded into a typed [`Map`]:
//! ordered layers, tilesets bound to their first GID, and typed custom properties.
//! Engines build their own scene from a map by implementing [`LayerVisitor`] and
//! calling [`walk`].
//!
//! ```no_run
//! use tiled_ir::{LayerFilter, Loader};
//!
//! let mut loader = Loader::new();
//! let map = loader.load_map("assets/level1.tmx")?;
//! let (_, ground) = map.tile_layer(&LayerFilter::name("ground"))?;
//! for (x, y, gid) in ground.tiles() {
//!     if let Some(tile) = map.resolve(gid) {
//!         println!("({x}, {y}) -> {} #{}", tile.tileset().name, tile.local);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod color;
mod error;
mod gid;
mod layer;
pub mod loader;
mod map;
mod object;
mod object_types;
mod order;
mod project;
mod properties;
mod registry;
mod tile_data;
mod tileset;
mod walk;

pub use color::{Color, ParseColorError};
pub use error::{LayerQueryError, MapError, Result};
pub use gid::{TileGid, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
pub use layer::{ImageLayer, Layer, LayerKind, LayerTag, TileGrid};
pub use loader::{FsReader, Format, Loader, LoaderConfig, MemoryReader, ResourceReader};
pub use map::{LayerFilter, LayerIter, Map, Orientation, RenderOrder, StaggerAxis, StaggerIndex};
pub use object::{HAlign, Object, ObjectKind, TextStyle, VAlign};
pub use object_types::{ObjectType, ObjectTypes};
pub use order::LayerGroups;
pub use project::{Command, Project};
pub use properties::{decode_properties, decode_property, Properties, Property, RawProperty};
pub use registry::{ResolvedTile, TileSetRef, TileSetRegistry};
pub use tile_data::{decode_csv, decode_tile_data, CsvTokenPolicy};
pub use tileset::{Frame, ImageRef, Tile, TileRect, TileSet};
pub use walk::{walk, AdapterRegistry, Capabilities, LayerVisitor};
