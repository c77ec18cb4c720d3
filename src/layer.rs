use std::fmt;

use glam::Vec2;

use crate::color::Color;
use crate::gid::TileGid;
use crate::object::Object;
use crate::properties::Properties;
use crate::tileset::ImageRef;

/// The four layer element kinds, named after their TMX tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerTag {
    /// `<layer>` / `"tilelayer"`.
    Tile,
    /// `<objectgroup>`.
    Objects,
    /// `<group>`.
    Group,
    /// `<imagelayer>`.
    Image,
}

impl LayerTag {
    /// Every tag, in slot order.
    pub const ALL: [LayerTag; 4] = [LayerTag::Tile, LayerTag::Objects, LayerTag::Group, LayerTag::Image];

    /// The TMX element name.
    pub fn element_name(self) -> &'static str {
        match self {
            LayerTag::Tile => "layer",
            LayerTag::Objects => "objectgroup",
            LayerTag::Group => "group",
            LayerTag::Image => "imagelayer",
        }
    }

    /// Maps a TMX element name to its tag; other elements are not layers.
    pub fn from_element_name(name: &str) -> Option<Self> {
        LayerTag::ALL.into_iter().find(|t| t.element_name() == name)
    }

    /// Maps a JSON `type` field to its tag.
    pub fn from_json_type(ty: &str) -> Option<Self> {
        match ty {
            "tilelayer" => Some(LayerTag::Tile),
            "objectgroup" => Some(LayerTag::Objects),
            "group" => Some(LayerTag::Group),
            "imagelayer" => Some(LayerTag::Image),
            _ => None,
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// A map layer. Fields shared by every kind live here once; the rest is in [`LayerKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Unique layer id; 0 in files that predate ids.
    pub id: u32,
    /// Layer name. Not required to be unique.
    pub name: String,
    /// User-defined class; empty when unset.
    pub class: String,
    /// Pixel offset applied when drawing.
    pub offset: Vec2,
    /// Scroll factor relative to the camera.
    pub parallax: Vec2,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Whether the layer is shown.
    pub visible: bool,
    /// Locked in the editor.
    pub locked: bool,
    /// Color multiplied into the layer when drawn.
    pub tint: Option<Color>,
    /// Custom properties.
    pub properties: Properties,
    /// Kind-specific payload.
    pub kind: LayerKind,
}

impl Layer {
    /// A visible, fully opaque layer with no offset.
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Layer {
            id: 0,
            name: name.into(),
            class: String::new(),
            offset: Vec2::ZERO,
            parallax: Vec2::ONE,
            opacity: 1.0,
            visible: true,
            locked: false,
            tint: None,
            properties: Properties::new(),
            kind,
        }
    }

    /// The layer's kind, without its payload.
    pub fn tag(&self) -> LayerTag {
        self.kind.tag()
    }

    /// Child layers of a group; empty for every other kind.
    pub fn children(&self) -> &[Layer] {
        match &self.kind {
            LayerKind::Group(children) => children,
            _ => &[],
        }
    }
}

/// What a layer holds.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    /// A grid of tiles.
    Tile(TileGrid),
    /// Objects in document order.
    Objects(Vec<Object>),
    /// Nested layers in document order.
    Group(Vec<Layer>),
    /// A single image.
    Image(ImageLayer),
}

impl LayerKind {
    /// The tag matching this payload.
    pub fn tag(&self) -> LayerTag {
        match self {
            LayerKind::Tile(_) => LayerTag::Tile,
            LayerKind::Objects(_) => LayerTag::Objects,
            LayerKind::Group(_) => LayerTag::Group,
            LayerKind::Image(_) => LayerTag::Image,
        }
    }
}

/// A row-major grid of GIDs, indexed `x + y * width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    gids: Vec<TileGid>,
}

impl TileGrid {
    /// Wraps decoded data; `None` if its length is not `width * height`.
    pub fn new(width: u32, height: u32, gids: Vec<TileGid>) -> Option<Self> {
        (gids.len() == width as usize * height as usize).then_some(TileGrid { width, height, gids })
    }

    /// Columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The GID at a cell; `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<TileGid> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.gids.get((x + y * self.width) as usize).copied()
    }

    /// All cells, empty ones included.
    pub fn gids(&self) -> &[TileGid] {
        &self.gids
    }

    /// Non-empty cells as `(x, y, gid)`, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, TileGid)> + '_ {
        let w = self.width.max(1);
        self.gids
            .iter()
            .enumerate()
            .filter(|(_, gid)| !gid.is_empty())
            .map(move |(i, gid)| (i as u32 % w, i as u32 / w, *gid))
    }
}

/// Payload of an `<imagelayer>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageLayer {
    /// The image; `None` when the layer has none set.
    pub image: Option<ImageRef>,
    /// Tile the image horizontally.
    pub repeat_x: bool,
    /// Tile the image vertically.
    pub repeat_y: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_indexes_row_major() {
        let gids = (1..=6).map(TileGid).collect();
        let grid = TileGrid::new(3, 2, gids).expect("grid");
        assert_eq!(grid.get(0, 0), Some(TileGid(1)));
        assert_eq!(grid.get(2, 0), Some(TileGid(3)));
        assert_eq!(grid.get(0, 1), Some(TileGid(4)));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn grid_rejects_wrong_length() {
        assert!(TileGrid::new(2, 2, vec![TileGid(1); 3]).is_none());
    }

    #[test]
    fn tiles_skips_empty_cells() {
        let grid = TileGrid::new(2, 2, vec![TileGid(0), TileGid(7), TileGid(0), TileGid(8)]).expect("grid");
        let cells: Vec<_> = grid.tiles().collect();
        assert_eq!(cells, vec![(1, 0, TileGid(7)), (1, 1, TileGid(8))]);
    }

    #[test]
    fn tag_names_round_trip() {
        for tag in LayerTag::ALL {
            assert_eq!(LayerTag::from_element_name(tag.element_name()), Some(tag));
        }
        assert_eq!(LayerTag::from_element_name("tileset"), None);
        assert_eq!(LayerTag::from_json_type("tilelayer"), Some(LayerTag::Tile));
    }
}
