use glam::Vec2;

use crate::color::Color;
use crate::gid::TileGid;
use crate::properties::Properties;

/// An object placed in an object layer or attached to a tile as a collision shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Unique object id within the map.
    pub id: u32,
    /// Object name; empty when unset.
    pub name: String,
    /// The object's class (`type` in older documents); `None` when unset.
    pub class: Option<String>,
    /// Position in pixels. For tile objects this is the bottom-left corner.
    pub position: Vec2,
    /// Whether the object is shown.
    pub visible: bool,
    /// Custom properties.
    pub properties: Properties,
    /// Shape and shape-specific data.
    pub kind: ObjectKind,
}

impl Object {
    /// Rotation in degrees, clockwise; points have none.
    pub fn rotation(&self) -> f32 {
        match &self.kind {
            ObjectKind::Point => 0.0,
            ObjectKind::Tile { rotation, .. }
            | ObjectKind::Rectangle { rotation, .. }
            | ObjectKind::Ellipse { rotation, .. }
            | ObjectKind::Polygon { rotation, .. }
            | ObjectKind::Polyline { rotation, .. }
            | ObjectKind::Text { rotation, .. } => *rotation,
        }
    }

    /// The GID of a tile object.
    pub fn tile_gid(&self) -> Option<TileGid> {
        match self.kind {
            ObjectKind::Tile { gid, .. } => Some(gid),
            _ => None,
        }
    }
}

/// Shape of an [`Object`]. Polygon and polyline points are relative to the object position.
///
/// Sizes are in pixels and rotations in degrees, clockwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// A single point.
    Point,
    /// A tile drawn as an object.
    Tile {
        /// Tile and flip flags.
        gid: TileGid,
        /// Drawn size, which may differ from the tileset's tile size.
        size: Vec2,
        /// Rotation.
        rotation: f32,
    },
    /// An axis-aligned rectangle before rotation.
    Rectangle {
        /// Size.
        size: Vec2,
        /// Rotation.
        rotation: f32,
    },
    /// An ellipse inscribed in its bounding box.
    Ellipse {
        /// Bounding box size.
        size: Vec2,
        /// Rotation.
        rotation: f32,
    },
    /// A closed polygon.
    Polygon {
        /// Vertices.
        points: Vec<Vec2>,
        /// Rotation.
        rotation: f32,
    },
    /// An open polyline.
    Polyline {
        /// Vertices.
        points: Vec<Vec2>,
        /// Rotation.
        rotation: f32,
    },
    /// A text box.
    Text {
        /// Text and formatting.
        style: TextStyle,
        /// Box size.
        size: Vec2,
        /// Rotation.
        rotation: f32,
    },
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
    /// Stretch lines to fill the box width.
    Justify,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VAlign {
    /// Top of the box.
    #[default]
    Top,
    /// Middle of the box.
    Center,
    /// Bottom of the box.
    Bottom,
}

/// Text and formatting of a text object.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// The text itself.
    pub text: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in pixels.
    pub pixel_size: u32,
    /// Word wrap inside the box.
    pub wrap: bool,
    /// Text color.
    pub color: Color,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Underlined.
    pub underline: bool,
    /// Struck through.
    pub strikeout: bool,
    /// Apply font kerning.
    pub kerning: bool,
    /// Horizontal alignment.
    pub halign: HAlign,
    /// Vertical alignment.
    pub valign: VAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            text: String::new(),
            font_family: "sans-serif".to_owned(),
            pixel_size: 16,
            wrap: false,
            color: Color::rgba(0, 0, 0, 255),
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            kerning: true,
            halign: HAlign::Left,
            valign: VAlign::Top,
        }
    }
}

impl HAlign {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "left" => HAlign::Left,
            "center" => HAlign::Center,
            "right" => HAlign::Right,
            "justify" => HAlign::Justify,
            _ => return None,
        })
    }
}

impl VAlign {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "top" => VAlign::Top,
            "center" => VAlign::Center,
            "bottom" => VAlign::Bottom,
            _ => return None,
        })
    }
}

/// Parses a TMX point list: `"x1,y1 x2,y2 ..."`.
pub(crate) fn parse_points(s: &str) -> Option<Vec<Vec2>> {
    s.split_ascii_whitespace()
        .map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
        })
        .collect()
}
