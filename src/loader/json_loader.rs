//! JSON front end for `.tmj`/`.json` maps and `.tsj` tilesets.

use std::path::Path;
use std::sync::Arc;

use glam::{IVec2, UVec2, Vec2};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use super::{resolve_path, Loader, ResourceReader};
use crate::color::Color;
use crate::error::{MapError, Result};
use crate::gid::TileGid;
use crate::layer::{ImageLayer, Layer, LayerKind, LayerTag, TileGrid};
use crate::map::{Map, MapHeader, Orientation, RenderOrder};
use crate::object::{HAlign, Object, ObjectKind, TextStyle, VAlign};
use crate::order::LayerGroups;
use crate::properties::{decode_properties, Properties, RawProperty};
use crate::registry::TileSetRef;
use crate::tile_data::{decode_tile_data, CsvTokenPolicy};
use crate::tileset::{Frame, ImageRef, Tile, TileRect, TileSet};

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

/// Older files write the format version as a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonVersion {
    Text(String),
    Number(serde_json::Number),
}

impl JsonVersion {
    fn into_string(self) -> String {
        match self {
            JsonVersion::Text(s) => s,
            JsonVersion::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct JsonMap {
    version: Option<JsonVersion>,
    tiledversion: Option<String>,
    #[serde(default)]
    class: String,
    orientation: String,
    renderorder: Option<String>,
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    infinite: bool,
    backgroundcolor: Option<String>,
    staggeraxis: Option<String>,
    staggerindex: Option<String>,
    hexsidelength: Option<u32>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonValue>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

/// Tile data is a GID array for CSV layers and a string for encoded ones.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonData {
    Gids(Vec<u32>),
    Encoded(String),
}

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    class: String,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default = "one")]
    parallaxx: f32,
    #[serde(default = "one")]
    parallaxy: f32,
    tintcolor: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,

    // tilelayer
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    data: Option<JsonData>,
    encoding: Option<String>,
    compression: Option<String>,
    chunks: Option<JsonValue>,

    // objectgroup
    #[serde(default)]
    objects: Vec<JsonObject>,

    // group
    #[serde(default)]
    layers: Vec<JsonLayer>,

    // imagelayer
    image: Option<String>,
    imagewidth: Option<u32>,
    imageheight: Option<u32>,
    transparentcolor: Option<String>,
    #[serde(default)]
    repeatx: bool,
    #[serde(default)]
    repeaty: bool,
}

#[derive(Deserialize)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    class: String,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    tilecount: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    tileoffset: Option<JsonOffset>,
    image: Option<String>,
    imagewidth: Option<u32>,
    imageheight: Option<u32>,
    transparentcolor: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonOffset {
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default = "one")]
    probability: f32,
    image: Option<String>,
    imagewidth: Option<u32>,
    imageheight: Option<u32>,
    #[serde(default)]
    x: u32,
    #[serde(default)]
    y: u32,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    animation: Vec<JsonFrame>,
    #[serde(default)]
    objectgroup: JsonObjectGroup,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Deserialize, Default)]
struct JsonObjectGroup {
    #[serde(default)]
    objects: Vec<JsonObject>,
}

#[derive(Deserialize)]
pub(crate) struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    ellipse: bool,
    polygon: Option<Vec<JsonObjectPoint>>,
    polyline: Option<Vec<JsonObjectPoint>>,
    text: Option<JsonText>,
    gid: Option<u32>,
    template: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct JsonText {
    #[serde(default)]
    text: String,
    fontfamily: Option<String>,
    pixelsize: Option<u32>,
    #[serde(default)]
    wrap: bool,
    color: Option<String>,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    underline: bool,
    #[serde(default)]
    strikeout: bool,
    #[serde(default = "default_true")]
    kerning: bool,
    halign: Option<String>,
    valign: Option<String>,
}

fn parse_color(element: &str, attribute: &'static str, text: Option<String>) -> Result<Option<Color>> {
    text.filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| MapError::InvalidAttribute {
                element: element.to_owned(),
                attribute,
                value: s.clone(),
            })
        })
        .transpose()
}

/// Untyped properties take their type from the JSON value.
fn raw_property(prop: JsonProperty) -> RawProperty {
    let JsonProperty { name, kind, value } = prop;

    let inferred = match &value {
        JsonValue::Bool(_) => Some("bool"),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some("int"),
        JsonValue::Number(_) => Some("float"),
        _ => None,
    };
    let declared_type = kind.or_else(|| inferred.map(str::to_owned));

    let value = match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        other => Some(other.to_string()),
    };

    RawProperty {
        name,
        declared_type,
        value,
        body: None,
    }
}

pub(crate) fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties> {
    decode_properties(props.into_iter().map(raw_property))
}

fn image_ref(
    base_dir: &Path,
    element: &str,
    source: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    transparent: Option<String>,
) -> Result<Option<ImageRef>> {
    let Some(source) = source.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    Ok(Some(ImageRef {
        source: resolve_path(base_dir, &source),
        size: width.zip(height).map(|(w, h)| UVec2::new(w, h)),
        transparent: parse_color(element, "transparentcolor", transparent)?,
    }))
}

fn text_to_style(text: JsonText) -> Result<TextStyle> {
    let defaults = TextStyle::default();
    let halign = match text.halign {
        None => defaults.halign,
        Some(s) => HAlign::parse(&s).ok_or_else(|| MapError::InvalidAttribute {
            element: "text".into(),
            attribute: "halign",
            value: s.clone(),
        })?,
    };
    let valign = match text.valign {
        None => defaults.valign,
        Some(s) => VAlign::parse(&s).ok_or_else(|| MapError::InvalidAttribute {
            element: "text".into(),
            attribute: "valign",
            value: s.clone(),
        })?,
    };
    Ok(TextStyle {
        text: text.text,
        font_family: text.fontfamily.unwrap_or(defaults.font_family),
        pixel_size: text.pixelsize.unwrap_or(defaults.pixel_size),
        wrap: text.wrap,
        color: parse_color("text", "color", text.color)?.unwrap_or(defaults.color),
        bold: text.bold,
        italic: text.italic,
        underline: text.underline,
        strikeout: text.strikeout,
        kerning: text.kerning,
        halign,
        valign,
    })
}

fn object_from_json(obj: JsonObject) -> Result<Object> {
    if obj.template.is_some() {
        return Err(MapError::Unsupported("object templates".into()));
    }

    let size = Vec2::new(obj.width, obj.height);
    let rotation = obj.rotation;
    let points = |pts: Vec<JsonObjectPoint>| -> Vec<Vec2> {
        pts.into_iter().map(|p| Vec2::new(p.x, p.y)).collect()
    };

    let kind = if let Some(gid) = obj.gid {
        ObjectKind::Tile {
            gid: TileGid(gid),
            size,
            rotation,
        }
    } else if obj.point {
        ObjectKind::Point
    } else if obj.ellipse {
        ObjectKind::Ellipse { size, rotation }
    } else if let Some(pts) = obj.polygon {
        ObjectKind::Polygon {
            points: points(pts),
            rotation,
        }
    } else if let Some(pts) = obj.polyline {
        ObjectKind::Polyline {
            points: points(pts),
            rotation,
        }
    } else if let Some(text) = obj.text {
        ObjectKind::Text {
            style: text_to_style(text)?,
            size,
            rotation,
        }
    } else {
        ObjectKind::Rectangle { size, rotation }
    };

    // `class` replaced `type` in Tiled 1.9
    let class = [obj.class, obj.kind].into_iter().find(|s| !s.is_empty());

    Ok(Object {
        id: obj.id,
        name: obj.name,
        class,
        position: Vec2::new(obj.x, obj.y),
        visible: obj.visible,
        properties: properties_from_json(obj.properties)?,
        kind,
    })
}

fn tileset_from_json(ts: JsonTileset, base_dir: &Path) -> Result<TileSet> {
    let image = image_ref(
        base_dir,
        "tileset",
        ts.image,
        ts.imagewidth,
        ts.imageheight,
        ts.transparentcolor,
    )?;

    let mut tileset = TileSet {
        name: ts.name,
        class: ts.class,
        tile_size: UVec2::new(ts.tilewidth, ts.tileheight),
        tile_count: ts.tilecount,
        columns: ts.columns,
        spacing: ts.spacing,
        margin: ts.margin,
        tile_offset: ts.tileoffset.map_or(IVec2::ZERO, |o| IVec2::new(o.x, o.y)),
        image,
        properties: properties_from_json(ts.properties)?,
        tiles: Default::default(),
    };
    tileset.fill_counts_from_image();

    for tile in ts.tiles {
        let id = tile.id;
        let rect = tile.width.zip(tile.height).map(|(width, height)| TileRect {
            x: tile.x,
            y: tile.y,
            width,
            height,
        });
        let decoded = Tile {
            image: image_ref(base_dir, "tile", tile.image, tile.imagewidth, tile.imageheight, None)?,
            rect,
            class: [tile.class, tile.kind].into_iter().find(|s| !s.is_empty()),
            probability: tile.probability,
            animation: tile
                .animation
                .into_iter()
                .map(|f| Frame {
                    tile_id: f.tileid,
                    duration: f.duration,
                })
                .collect(),
            collision: tile
                .objectgroup
                .objects
                .into_iter()
                .map(object_from_json)
                .collect::<Result<Vec<_>>>()?,
            properties: properties_from_json(tile.properties)?,
        };
        tileset.insert_tile(id, decoded);
    }
    Ok(tileset)
}

/// Parses a `.tsj` document; image paths resolve against `base_dir`.
pub(crate) fn parse_tileset(text: &str, base_dir: &Path) -> Result<TileSet> {
    let ts: JsonTileset = serde_json::from_str(text)?;
    tileset_from_json(ts, base_dir)
}

/// Parses a map document. Called through [`Loader::parse_map_json`].
pub(crate) fn parse_map<R: ResourceReader>(loader: &mut Loader<R>, text: &str, base_dir: &Path) -> Result<Map> {
    let j: JsonMap = serde_json::from_str(text)?;
    if j.infinite {
        return Err(MapError::Unsupported("infinite maps".into()));
    }

    let header = MapHeader {
        version: j.version.map(JsonVersion::into_string).unwrap_or_default(),
        tiled_version: j.tiledversion,
        class: j.class,
        width: j.width,
        height: j.height,
        tile_width: j.tilewidth,
        tile_height: j.tileheight,
        orientation: Orientation::from_parts(
            &j.orientation,
            j.staggeraxis.as_deref(),
            j.staggerindex.as_deref(),
            j.hexsidelength,
        )?,
        render_order: match j.renderorder {
            Some(s) => s.parse()?,
            None => RenderOrder::default(),
        },
        background_color: parse_color("map", "backgroundcolor", j.backgroundcolor)?,
    };

    let mut tilesets = Vec::with_capacity(j.tilesets.len());
    for entry in j.tilesets {
        let first_gid = entry
            .get("firstgid")
            .and_then(JsonValue::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| MapError::MissingAttribute {
                element: "tileset".into(),
                attribute: "firstgid",
            })?;
        let reference = match entry.get("source").and_then(JsonValue::as_str) {
            Some(source) => {
                let path = resolve_path(base_dir, source);
                TileSetRef {
                    first_gid,
                    tileset: loader.load_tileset(&path)?,
                    source: Some(path),
                }
            }
            None => {
                let embedded: JsonTileset = serde_json::from_value(entry)?;
                TileSetRef {
                    first_gid,
                    tileset: Arc::new(tileset_from_json(embedded, base_dir)?),
                    source: None,
                }
            }
        };
        trace!(first_gid, name = %reference.tileset.name, "bound tileset");
        tilesets.push(reference);
    }

    let policy = loader.config().csv_tokens;
    let layers = layers_from_json(j.layers, base_dir, policy)?;
    let properties = properties_from_json(j.properties)?;
    debug!(layers = layers.len(), tilesets = tilesets.len(), "decoded json map");

    Map::assemble(header, tilesets, layers, properties, loader.config().require_resolved_gids)
}

fn layers_from_json(layers: Vec<JsonLayer>, base_dir: &Path, policy: CsvTokenPolicy) -> Result<Vec<Layer>> {
    let mut groups = LayerGroups::new();
    for l in layers {
        let tag = LayerTag::from_json_type(&l.kind).ok_or_else(|| MapError::MalformedDocument {
            element: "layer".into(),
            reason: format!("unknown layer type '{}'", l.kind),
        })?;
        groups.record(tag);
        groups.push(layer_from_json(tag, l, base_dir, policy)?);
    }
    groups.restore_order()
}

fn layer_from_json(tag: LayerTag, l: JsonLayer, base_dir: &Path, policy: CsvTokenPolicy) -> Result<Layer> {
    let kind = match tag {
        LayerTag::Tile => {
            if l.chunks.is_some() {
                return Err(MapError::Unsupported("chunked tile data".into()));
            }
            let gids = match l.data {
                Some(JsonData::Gids(raw)) => raw.into_iter().map(TileGid).collect(),
                Some(JsonData::Encoded(text)) => decode_tile_data(
                    l.encoding.as_deref().unwrap_or("csv"),
                    l.compression.as_deref(),
                    &text,
                    policy,
                )?,
                None => Vec::new(),
            };
            let actual = gids.len();
            LayerKind::Tile(TileGrid::new(l.width, l.height, gids).ok_or_else(|| MapError::InvalidLayerSize {
                layer: l.name.clone(),
                expected: l.width as usize * l.height as usize,
                actual,
            })?)
        }
        LayerTag::Objects => LayerKind::Objects(
            l.objects
                .into_iter()
                .map(object_from_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        LayerTag::Group => LayerKind::Group(layers_from_json(l.layers, base_dir, policy)?),
        LayerTag::Image => LayerKind::Image(ImageLayer {
            image: image_ref(base_dir, "imagelayer", l.image, l.imagewidth, l.imageheight, l.transparentcolor)?,
            repeat_x: l.repeatx,
            repeat_y: l.repeaty,
        }),
    };
    trace!(layer = %l.name, %tag, "decoded layer");

    Ok(Layer {
        id: l.id,
        name: l.name,
        class: l.class,
        offset: Vec2::new(l.offsetx, l.offsety),
        parallax: Vec2::new(l.parallaxx, l.parallaxy),
        opacity: l.opacity,
        visible: l.visible,
        locked: l.locked,
        tint: parse_color("layer", "tintcolor", l.tintcolor)?,
        properties: properties_from_json(l.properties)?,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Property;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("tiled_ir_json_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    const TILESET_JSON: &str = r#"{
      "name":"terrain",
      "tilewidth":16,
      "tileheight":16,
      "tilecount":4,
      "columns":2,
      "image":"tiles.png",
      "imagewidth":32,
      "imageheight":32,
      "properties":[{"name":"biome","type":"string","value":"forest"}],
      "tiles":[
        {
          "id":0,
          "properties":[{"name":"damage","type":"int","value":10}],
          "objectgroup":{
            "objects":[
              {"id":1,"name":"hitbox","type":"shape","properties":[{"name":"sensor","type":"bool","value":false}]}
            ]
          }
        }
      ]
    }"#;

    #[test]
    fn parses_properties_for_map_layer_object_tileset_and_tile() {
        let dir = temp_dir();
        let map_path = dir.join("map.tmj");
        let ts_path = dir.join("tileset.tsj");

        let map_json = r#"{
          "version": 1.2,
          "orientation": "orthogonal",
          "width": 2,
          "height": 2,
          "tilewidth": 16,
          "tileheight": 16,
          "properties": [
            {"name":"is_night","type":"bool","value":true},
            {"name":"gravity","type":"float","value":9.8},
            {"name":"theme","type":"string","value":"forest"}
          ],
          "layers": [
            {
              "type":"tilelayer",
              "name":"ground",
              "width":2,
              "height":2,
              "data":[1,0,0,0],
              "properties":[
                {"name":"is_solid","type":"bool","value":true},
                {"name":"difficulty","type":"int","value":3}
              ]
            },
            {
              "type":"objectgroup",
              "name":"spawns",
              "objects":[
                {
                  "id": 7,
                  "name":"spawn_1",
                  "type":"spawn",
                  "point": true,
                  "properties":[{"name":"kind","type":"string","value":"player"}]
                }
              ],
              "properties":[{"name":"enabled","type":"bool","value":true}]
            }
          ],
          "tilesets":[{"firstgid":1,"source":"tileset.tsj"}]
        }"#;

        fs::write(&map_path, map_json).expect("failed to write map");
        fs::write(&ts_path, TILESET_JSON).expect("failed to write tileset");

        let map = Loader::new().load_map(&map_path).expect("decode");
        assert_eq!(map.version, "1.2");

        assert_eq!(map.properties.get_bool("is_night"), Some(true));
        assert_eq!(map.properties.get_f32("gravity"), Some(9.8));
        assert_eq!(map.properties.get_string("theme"), Some("forest"));

        assert_eq!(map.layers[0].properties.get_bool("is_solid"), Some(true));
        assert_eq!(map.layers[0].properties.get_i32("difficulty"), Some(3));

        match &map.layers[1].kind {
            LayerKind::Objects(objects) => {
                assert_eq!(objects.len(), 1);
                assert_eq!(objects[0].kind, ObjectKind::Point);
                assert_eq!(objects[0].class.as_deref(), Some("spawn"));
                assert_eq!(objects[0].properties.get_string("kind"), Some("player"));
            }
            _ => panic!("expected object layer"),
        }

        let reference = &map.tilesets()[0];
        assert_eq!(reference.source.as_deref(), Some(ts_path.as_path()));
        let ts = &reference.tileset;
        assert_eq!(ts.properties.get_string("biome"), Some("forest"));
        assert_eq!(ts.image.as_ref().map(|i| i.source.clone()), Some(dir.join("tiles.png")));
        let tile = ts.tile(0).expect("tile 0");
        assert_eq!(tile.properties.get_i32("damage"), Some(10));
        assert_eq!(tile.collision.len(), 1);
        assert_eq!(tile.collision[0].properties.get_bool("sensor"), Some(false));

        let resolved = map.resolve(TileGid(1)).expect("gid 1 resolves");
        assert_eq!(resolved.local, 0);
    }

    #[test]
    fn keeps_large_int_property_values() {
        let map_json = r#"{
          "orientation":"orthogonal","width":1,"height":1,"tilewidth":16,"tileheight":16,
          "properties": [
            {"name":"big_id","type":"int","value":5000000000},
            {"name":"untyped_count","value":12},
            {"name":"untyped_ratio","value":0.5}
          ]
        }"#;
        let map = Loader::new().parse_map_json(map_json, Path::new("")).expect("decode");
        assert_eq!(map.properties.get_i64("big_id"), Some(5_000_000_000));
        assert_eq!(map.properties.get_i32("big_id"), None);
        assert_eq!(map.properties.get("untyped_count"), Some(&Property::Int(12)));
        assert_eq!(map.properties.get("untyped_ratio"), Some(&Property::Double(0.5)));
    }

    #[test]
    fn returns_typed_error_for_malformed_json() {
        let err = Loader::new().parse_map_json("{ not json", Path::new("")).unwrap_err();
        assert!(matches!(err, MapError::Json(_)));
    }

    #[test]
    fn returns_typed_error_for_missing_tileset_file() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        let map_json = r#"{
          "orientation":"orthogonal","width":1,"height":1,
          "tilewidth": 16,
          "tileheight": 16,
          "layers": [],
          "tilesets":[{"firstgid":1,"source":"missing_tileset.json"}]
        }"#;
        fs::write(&map_path, map_json).expect("failed to write map");

        let err = Loader::new().load_map(&map_path).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn unresolved_gid_is_an_error_only_when_required() {
        let map_json = r#"{
          "orientation":"orthogonal","width":1,"height":1,"tilewidth":16,"tileheight":16,
          "layers": [{"type":"tilelayer","name":"ground","width":1,"height":1,"data":[99]}],
          "tilesets":[{"firstgid":1,"name":"one","tilewidth":16,"tileheight":16,"tilecount":1,"columns":1,"image":"tiles.png"}]
        }"#;

        let map = Loader::new().parse_map_json(map_json, Path::new("")).expect("lenient");
        assert!(map.resolve(TileGid(99)).is_none());

        let config = crate::loader::LoaderConfig {
            require_resolved_gids: true,
            ..Default::default()
        };
        let err = Loader::new()
            .with_config(config)
            .parse_map_json(map_json, Path::new(""))
            .unwrap_err();
        assert!(matches!(err, MapError::UnresolvedGid(99)));
    }

    #[test]
    fn tileset_without_tilecount_uses_image_size() {
        let map_json = r#"{
          "orientation":"orthogonal","width":1,"height":1,"tilewidth":8,"tileheight":8,
          "layers": [{"type":"tilelayer","name":"ground","width":1,"height":1,"data":[4]}],
          "tilesets":[{"firstgid":1,"name":"t","tilewidth":8,"tileheight":8,"image":"t.png","imagewidth":16,"imageheight":16}]
        }"#;
        let config = crate::loader::LoaderConfig {
            require_resolved_gids: true,
            ..Default::default()
        };
        let map = Loader::new()
            .with_config(config)
            .parse_map_json(map_json, Path::new(""))
            .expect("map");
        let resolved = map.resolve(TileGid(4)).expect("gid 4");
        assert_eq!(resolved.local, 3);
        assert_eq!(resolved.tileset().columns, 2);
        assert!(map.resolve(TileGid(5)).is_none());
    }

    #[test]
    fn unknown_property_type_degrades_to_error_marker() {
        let map_json = r#"{
          "orientation":"orthogonal","width":1,"height":1,"tilewidth":16,"tileheight":16,
          "properties": [
            {"name":"mystery","type":"not_supported","value":"x"}
          ]
        }"#;
        let map = Loader::new().parse_map_json(map_json, Path::new("")).expect("decode");
        assert_eq!(
            map.properties.get("mystery"),
            Some(&Property::Error {
                declared_type: "not_supported".into(),
                raw: "x".into()
            })
        );
    }

    #[test]
    fn string_data_goes_through_tile_data_codec() {
        let csv = r#"{
          "orientation":"orthogonal","width":3,"height":2,"tilewidth":8,"tileheight":8,
          "layers": [{"type":"tilelayer","name":"t","width":3,"height":2,"encoding":"csv","data":"1,2,3\n4,5,6"}]
        }"#;
        let map = Loader::new().parse_map_json(csv, Path::new("")).expect("csv");
        let (_, grid) = map.tile_layer(&crate::LayerFilter::name("t")).expect("layer");
        assert_eq!(grid.get(2, 1), Some(TileGid(6)));

        let base64 = csv.replace("\"encoding\":\"csv\"", "\"encoding\":\"base64\",\"compression\":\"zlib\"");
        let err = Loader::new().parse_map_json(&base64, Path::new("")).unwrap_err();
        assert!(matches!(
            err,
            MapError::UnsupportedTileDataFormat { ref encoding, compression: Some(ref c) } if encoding == "base64" && c == "zlib"
        ));
    }

    #[test]
    fn nested_groups_keep_document_order() {
        let map_json = r#"{
          "orientation":"isometric","width":1,"height":1,"tilewidth":16,"tileheight":8,
          "layers": [
            {"type":"imagelayer","name":"sky","image":"../art/sky.png","repeatx":true},
            {"type":"group","name":"world","layers":[
              {"type":"tilelayer","name":"floor","width":1,"height":1,"data":[0]},
              {"type":"objectgroup","name":"things","objects":[]}
            ]}
          ]
        }"#;
        let map = Loader::new().parse_map_json(map_json, Path::new("/game/maps")).expect("decode");
        assert_eq!(map.orientation, Orientation::Isometric);
        let names: Vec<&str> = map.iter_layers().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["sky", "world", "floor", "things"]);

        let (_, image) = map.image_layer(&crate::LayerFilter::name("sky")).expect("image layer");
        assert!(image.repeat_x);
        assert_eq!(
            image.image.as_ref().map(|i| i.source.clone()),
            Some(PathBuf::from("/game/art/sky.png"))
        );
    }
}
