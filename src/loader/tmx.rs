//! XML front end for `.tmx` maps and `.tsx` tilesets.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use glam::{IVec2, UVec2, Vec2};
use roxmltree::{Document, Node};
use tracing::{debug, trace};

use super::{resolve_path, Loader, ResourceReader};
use crate::color::Color;
use crate::error::{MapError, Result};
use crate::gid::TileGid;
use crate::layer::{ImageLayer, Layer, LayerKind, LayerTag, TileGrid};
use crate::map::{Map, MapHeader, Orientation};
use crate::object::{parse_points, HAlign, Object, ObjectKind, TextStyle, VAlign};
use crate::order::LayerGroups;
use crate::properties::{decode_properties, Properties, RawProperty};
use crate::registry::TileSetRef;
use crate::tile_data::{decode_tile_data, CsvTokenPolicy};
use crate::tileset::{Frame, ImageRef, Tile, TileRect, TileSet};

fn element(node: &Node) -> String {
    node.tag_name().name().to_owned()
}

fn attr<T: FromStr>(node: &Node, name: &'static str) -> Result<T> {
    attr_opt(node, name)?.ok_or_else(|| MapError::MissingAttribute {
        element: element(node),
        attribute: name,
    })
}

fn attr_opt<T: FromStr>(node: &Node, name: &'static str) -> Result<Option<T>> {
    node.attribute(name)
        .map(|text| {
            text.trim().parse().map_err(|_| MapError::InvalidAttribute {
                element: element(node),
                attribute: name,
                value: text.to_owned(),
            })
        })
        .transpose()
}

fn attr_or<T: FromStr>(node: &Node, name: &'static str, default: T) -> Result<T> {
    Ok(attr_opt(node, name)?.unwrap_or(default))
}

/// TMX writes booleans as `0`/`1`.
fn flag(node: &Node, name: &'static str, default: bool) -> Result<bool> {
    match node.attribute(name) {
        None => Ok(default),
        Some("1" | "true") => Ok(true),
        Some("0" | "false") => Ok(false),
        Some(other) => Err(MapError::InvalidAttribute {
            element: element(node),
            attribute: name,
            value: other.to_owned(),
        }),
    }
}

fn color_opt(node: &Node, name: &'static str) -> Result<Option<Color>> {
    attr_opt(node, name)
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(name))
}

fn children<'a, 'input: 'a>(node: &Node<'a, 'input>, name: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |c| c.has_tag_name(name))
}

/// `class` replaced `type` in Tiled 1.9; accept either.
fn class_attr(node: &Node) -> Option<String> {
    node.attribute("class")
        .or_else(|| node.attribute("type"))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn read_properties(node: &Node) -> Result<Properties> {
    let Some(props) = child(node, "properties") else {
        return Ok(Properties::new());
    };
    let raw = children(&props, "property")
        .map(|p| {
            Ok(RawProperty {
                name: attr(&p, "name")?,
                declared_type: p.attribute("type").map(str::to_owned),
                value: p.attribute("value").map(str::to_owned),
                body: p.text().map(str::to_owned),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    decode_properties(raw)
}

fn read_image(node: &Node, base_dir: &Path) -> Result<ImageRef> {
    let source: String = attr(node, "source")?;
    let width: Option<u32> = attr_opt(node, "width")?;
    let height: Option<u32> = attr_opt(node, "height")?;
    Ok(ImageRef {
        source: resolve_path(base_dir, &source),
        size: width.zip(height).map(|(w, h)| UVec2::new(w, h)),
        transparent: color_opt(node, "trans")?,
    })
}

/// Parses a map document. Called through [`Loader::parse_tmx`].
pub(crate) fn parse_map<R: ResourceReader>(loader: &mut Loader<R>, text: &str, base_dir: &Path) -> Result<Map> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if !root.has_tag_name("map") {
        return Err(MapError::MalformedDocument {
            element: element(&root),
            reason: "expected <map> at the root".into(),
        });
    }
    if flag(&root, "infinite", false)? {
        return Err(MapError::Unsupported("infinite maps".into()));
    }

    let orientation_name: String = attr(&root, "orientation")?;
    let orientation = Orientation::from_parts(
        &orientation_name,
        root.attribute("staggeraxis"),
        root.attribute("staggerindex"),
        attr_opt(&root, "hexsidelength")?,
    )?;

    let header = MapHeader {
        version: attr_or(&root, "version", String::new())?,
        tiled_version: root.attribute("tiledversion").map(str::to_owned),
        class: class_attr(&root).unwrap_or_default(),
        width: attr(&root, "width")?,
        height: attr(&root, "height")?,
        tile_width: attr(&root, "tilewidth")?,
        tile_height: attr(&root, "tileheight")?,
        orientation,
        render_order: root.attribute("renderorder").map(str::parse).transpose()?.unwrap_or_default(),
        background_color: color_opt(&root, "backgroundcolor")?,
    };

    let mut tilesets = Vec::new();
    for node in children(&root, "tileset") {
        let first_gid: u32 = attr(&node, "firstgid")?;
        let reference = match node.attribute("source") {
            Some(source) => {
                let path = resolve_path(base_dir, source);
                TileSetRef {
                    first_gid,
                    tileset: loader.load_tileset(&path)?,
                    source: Some(path),
                }
            }
            None => TileSetRef {
                first_gid,
                tileset: Arc::new(read_tileset(&node, base_dir)?),
                source: None,
            },
        };
        trace!(first_gid, name = %reference.tileset.name, "bound tileset");
        tilesets.push(reference);
    }

    let policy = loader.config().csv_tokens;
    let layers = read_layers(&root, base_dir, policy)?;
    let properties = read_properties(&root)?;
    debug!(layers = layers.len(), tilesets = tilesets.len(), "decoded tmx map");

    Map::assemble(header, tilesets, layers, properties, loader.config().require_resolved_gids)
}

/// Decodes the layer children of `parent` (a `<map>` or `<group>`), one tag at a time,
/// then restores their document order.
fn read_layers(parent: &Node, base_dir: &Path, policy: CsvTokenPolicy) -> Result<Vec<Layer>> {
    let mut groups = LayerGroups::new();
    for tag in parent
        .children()
        .filter(Node::is_element)
        .filter_map(|c| LayerTag::from_element_name(c.tag_name().name()))
    {
        groups.record(tag);
    }

    for tag in LayerTag::ALL {
        let decoded = children(parent, tag.element_name())
            .map(|node| read_layer(tag, &node, base_dir, policy))
            .collect::<Result<Vec<_>>>()?;
        groups.extend(decoded);
    }

    groups.restore_order()
}

fn read_layer(tag: LayerTag, node: &Node, base_dir: &Path, policy: CsvTokenPolicy) -> Result<Layer> {
    let name: String = attr_or(node, "name", String::new())?;
    let kind = match tag {
        LayerTag::Tile => LayerKind::Tile(read_tile_grid(node, &name, policy)?),
        LayerTag::Objects => LayerKind::Objects(
            children(node, "object")
                .map(|o| read_object(&o))
                .collect::<Result<Vec<_>>>()?,
        ),
        LayerTag::Group => LayerKind::Group(read_layers(node, base_dir, policy)?),
        LayerTag::Image => LayerKind::Image(ImageLayer {
            image: child(node, "image").map(|i| read_image(&i, base_dir)).transpose()?,
            repeat_x: flag(node, "repeatx", false)?,
            repeat_y: flag(node, "repeaty", false)?,
        }),
    };
    trace!(layer = %name, %tag, "decoded layer");

    Ok(Layer {
        id: attr_or(node, "id", 0)?,
        name,
        class: class_attr(node).unwrap_or_default(),
        offset: Vec2::new(attr_or(node, "offsetx", 0.0)?, attr_or(node, "offsety", 0.0)?),
        parallax: Vec2::new(attr_or(node, "parallaxx", 1.0)?, attr_or(node, "parallaxy", 1.0)?),
        opacity: attr_or(node, "opacity", 1.0)?,
        visible: flag(node, "visible", true)?,
        locked: flag(node, "locked", false)?,
        tint: color_opt(node, "tintcolor")?,
        properties: read_properties(node)?,
        kind,
    })
}

fn read_tile_grid(node: &Node, name: &str, policy: CsvTokenPolicy) -> Result<TileGrid> {
    let width: u32 = attr(node, "width")?;
    let height: u32 = attr(node, "height")?;
    let data = child(node, "data").ok_or_else(|| MapError::MalformedDocument {
        element: element(node),
        reason: format!("tile layer '{name}' has no <data>"),
    })?;
    if child(&data, "chunk").is_some() {
        return Err(MapError::Unsupported("chunked tile data".into()));
    }

    let gids = match data.attribute("encoding") {
        Some(encoding) => decode_tile_data(
            encoding,
            data.attribute("compression"),
            data.text().unwrap_or_default(),
            policy,
        )?,
        // Legacy form: one <tile gid="..."/> per cell, gid defaulting to empty.
        None => children(&data, "tile")
            .map(|t| attr_or(&t, "gid", 0).map(TileGid))
            .collect::<Result<Vec<_>>>()?,
    };

    let actual = gids.len();
    TileGrid::new(width, height, gids).ok_or_else(|| MapError::InvalidLayerSize {
        layer: name.to_owned(),
        expected: width as usize * height as usize,
        actual,
    })
}

fn read_object(node: &Node) -> Result<Object> {
    if node.attribute("template").is_some() {
        return Err(MapError::Unsupported("object templates".into()));
    }

    let size = Vec2::new(attr_or(node, "width", 0.0)?, attr_or(node, "height", 0.0)?);
    let rotation: f32 = attr_or(node, "rotation", 0.0)?;

    let kind = if let Some(gid) = attr_opt::<u32>(node, "gid")? {
        ObjectKind::Tile {
            gid: TileGid(gid),
            size,
            rotation,
        }
    } else {
        let mut kind = ObjectKind::Rectangle { size, rotation };
        for c in node.children().filter(Node::is_element) {
            kind = match c.tag_name().name() {
                "ellipse" => ObjectKind::Ellipse { size, rotation },
                "point" => ObjectKind::Point,
                shape @ ("polygon" | "polyline") => {
                    let raw: String = attr(&c, "points")?;
                    let points = parse_points(&raw).ok_or_else(|| MapError::InvalidAttribute {
                        element: shape.to_owned(),
                        attribute: "points",
                        value: raw.clone(),
                    })?;
                    if shape == "polygon" {
                        ObjectKind::Polygon { points, rotation }
                    } else {
                        ObjectKind::Polyline { points, rotation }
                    }
                }
                "text" => ObjectKind::Text {
                    style: read_text(&c)?,
                    size,
                    rotation,
                },
                _ => continue,
            };
            break;
        }
        kind
    };

    Ok(Object {
        id: attr_or(node, "id", 0)?,
        name: attr_or(node, "name", String::new())?,
        class: class_attr(node),
        position: Vec2::new(attr_or(node, "x", 0.0)?, attr_or(node, "y", 0.0)?),
        visible: flag(node, "visible", true)?,
        properties: read_properties(node)?,
        kind,
    })
}

fn read_text(node: &Node) -> Result<TextStyle> {
    let defaults = TextStyle::default();
    let halign = match node.attribute("halign") {
        None => defaults.halign,
        Some(s) => HAlign::parse(s).ok_or_else(|| MapError::InvalidAttribute {
            element: element(node),
            attribute: "halign",
            value: s.to_owned(),
        })?,
    };
    let valign = match node.attribute("valign") {
        None => defaults.valign,
        Some(s) => VAlign::parse(s).ok_or_else(|| MapError::InvalidAttribute {
            element: element(node),
            attribute: "valign",
            value: s.to_owned(),
        })?,
    };
    Ok(TextStyle {
        text: node.text().unwrap_or_default().to_owned(),
        font_family: attr_or(node, "fontfamily", defaults.font_family)?,
        pixel_size: attr_or(node, "pixelsize", defaults.pixel_size)?,
        wrap: flag(node, "wrap", defaults.wrap)?,
        color: attr_or(node, "color", defaults.color)?,
        bold: flag(node, "bold", defaults.bold)?,
        italic: flag(node, "italic", defaults.italic)?,
        underline: flag(node, "underline", defaults.underline)?,
        strikeout: flag(node, "strikeout", defaults.strikeout)?,
        kerning: flag(node, "kerning", defaults.kerning)?,
        halign,
        valign,
    })
}

/// Parses a `.tsx` document. Image paths resolve against `base_dir`, the tileset's own
/// directory.
pub(crate) fn parse_tileset(text: &str, base_dir: &Path) -> Result<TileSet> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if !root.has_tag_name("tileset") {
        return Err(MapError::MalformedDocument {
            element: element(&root),
            reason: "expected <tileset> at the root".into(),
        });
    }
    read_tileset(&root, base_dir)
}

fn read_tileset(node: &Node, base_dir: &Path) -> Result<TileSet> {
    let tile_offset = match child(node, "tileoffset") {
        Some(o) => IVec2::new(attr_or(&o, "x", 0)?, attr_or(&o, "y", 0)?),
        None => IVec2::ZERO,
    };

    let mut tileset = TileSet {
        name: attr_or(node, "name", String::new())?,
        class: class_attr(node).unwrap_or_default(),
        tile_size: UVec2::new(attr(node, "tilewidth")?, attr(node, "tileheight")?),
        tile_count: attr_or(node, "tilecount", 0)?,
        columns: attr_or(node, "columns", 0)?,
        spacing: attr_or(node, "spacing", 0)?,
        margin: attr_or(node, "margin", 0)?,
        tile_offset,
        image: child(node, "image").map(|i| read_image(&i, base_dir)).transpose()?,
        properties: read_properties(node)?,
        tiles: Default::default(),
    };
    tileset.fill_counts_from_image();

    for t in children(node, "tile") {
        let id: u32 = attr(&t, "id")?;
        tileset.insert_tile(id, read_tile(&t, base_dir)?);
    }
    trace!(name = %tileset.name, tiles = tileset.tiles.len(), "decoded tileset");
    Ok(tileset)
}

fn read_tile(node: &Node, base_dir: &Path) -> Result<Tile> {
    let width: Option<u32> = attr_opt(node, "width")?;
    let height: Option<u32> = attr_opt(node, "height")?;
    let rect = match width.zip(height) {
        Some((width, height)) => Some(TileRect {
            x: attr_or(node, "x", 0)?,
            y: attr_or(node, "y", 0)?,
            width,
            height,
        }),
        None => None,
    };

    let animation = match child(node, "animation") {
        Some(anim) => children(&anim, "frame")
            .map(|f| {
                Ok(Frame {
                    tile_id: attr(&f, "tileid")?,
                    duration: attr(&f, "duration")?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let collision = match child(node, "objectgroup") {
        Some(group) => children(&group, "object")
            .map(|o| read_object(&o))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Tile {
        image: child(node, "image").map(|i| read_image(&i, base_dir)).transpose()?,
        rect,
        class: class_attr(node),
        probability: attr_or(node, "probability", 1.0)?,
        animation,
        collision,
        properties: read_properties(node)?,
    })
}
