use std::str::FromStr;

use glam::UVec2;

use crate::color::Color;
use crate::error::{LayerQueryError, MapError, Result};
use crate::gid::TileGid;
use crate::layer::{ImageLayer, Layer, LayerKind, LayerTag, TileGrid};
use crate::object::Object;
use crate::properties::Properties;
use crate::registry::{ResolvedTile, TileSetRef, TileSetRegistry};

/// Which axis is staggered on staggered and hexagonal maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerAxis {
    /// Every other column is shifted.
    X,
    /// Every other row is shifted.
    Y,
}

/// Whether the odd or the even rows (or columns) are shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerIndex {
    /// Odd rows or columns are shifted.
    Odd,
    /// Even rows or columns are shifted.
    Even,
}

/// Projection of the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Square grid.
    Orthogonal,
    /// Diamond grid.
    Isometric,
    /// Isometric tiles laid out in shifted rows or columns.
    Staggered {
        /// Staggered axis.
        axis: StaggerAxis,
        /// Shifted parity.
        index: StaggerIndex,
    },
    /// Hexagonal tiles.
    Hexagonal {
        /// Staggered axis.
        axis: StaggerAxis,
        /// Shifted parity.
        index: StaggerIndex,
        /// Length of the flat side, in pixels.
        side_length: u32,
    },
}

impl Orientation {
    /// Builds an orientation from its attribute values.
    ///
    /// Hexagonal maps need all three of `staggeraxis`, `staggerindex` and
    /// `hexsidelength`; staggered maps fall back to Tiled's defaults (`y`, `odd`).
    pub fn from_parts(
        orientation: &str,
        stagger_axis: Option<&str>,
        stagger_index: Option<&str>,
        hex_side_length: Option<u32>,
    ) -> Result<Self> {
        let axis = stagger_axis.map(parse_axis).transpose()?;
        let index = stagger_index.map(parse_index).transpose()?;
        match orientation {
            "orthogonal" => Ok(Orientation::Orthogonal),
            "isometric" => Ok(Orientation::Isometric),
            "staggered" => Ok(Orientation::Staggered {
                axis: axis.unwrap_or(StaggerAxis::Y),
                index: index.unwrap_or(StaggerIndex::Odd),
            }),
            "hexagonal" => match (axis, index, hex_side_length) {
                (Some(axis), Some(index), Some(side_length)) => Ok(Orientation::Hexagonal {
                    axis,
                    index,
                    side_length,
                }),
                _ => {
                    let mut missing = Vec::new();
                    if axis.is_none() {
                        missing.push("staggeraxis");
                    }
                    if index.is_none() {
                        missing.push("staggerindex");
                    }
                    if hex_side_length.is_none() {
                        missing.push("hexsidelength");
                    }
                    Err(MapError::MissingOrientationInfo(missing))
                }
            },
            other => Err(MapError::UnknownOrientation(other.to_owned())),
        }
    }
}

fn parse_axis(s: &str) -> Result<StaggerAxis> {
    match s {
        "x" => Ok(StaggerAxis::X),
        "y" => Ok(StaggerAxis::Y),
        other => Err(MapError::InvalidAttribute {
            element: "map".into(),
            attribute: "staggeraxis",
            value: other.to_owned(),
        }),
    }
}

fn parse_index(s: &str) -> Result<StaggerIndex> {
    match s {
        "odd" => Ok(StaggerIndex::Odd),
        "even" => Ok(StaggerIndex::Even),
        other => Err(MapError::InvalidAttribute {
            element: "map".into(),
            attribute: "staggerindex",
            value: other.to_owned(),
        }),
    }
}

/// Order in which the editor draws tiles. Only meaningful for orthogonal maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderOrder {
    /// `right-down`, the default.
    #[default]
    RightDown,
    /// `right-up`.
    RightUp,
    /// `left-down`.
    LeftDown,
    /// `left-up`.
    LeftUp,
}

impl FromStr for RenderOrder {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "right-down" => Ok(RenderOrder::RightDown),
            "right-up" => Ok(RenderOrder::RightUp),
            "left-down" => Ok(RenderOrder::LeftDown),
            "left-up" => Ok(RenderOrder::LeftUp),
            other => Err(MapError::UnknownRenderOrder(other.to_owned())),
        }
    }
}

/// A fully assembled map document.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    /// Format version, e.g. `1.10`.
    pub version: String,
    /// Version of the editor that saved the file.
    pub tiled_version: Option<String>,
    /// User-defined class; empty when unset.
    pub class: String,
    /// Grid width in tiles.
    pub width: u32,
    /// Grid height in tiles.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Grid projection.
    pub orientation: Orientation,
    /// Tile draw order.
    pub render_order: RenderOrder,
    /// Fill color behind all layers.
    pub background_color: Option<Color>,
    /// Custom properties.
    pub properties: Properties,
    /// Top-level layers in document order.
    pub layers: Vec<Layer>,
    registry: TileSetRegistry,
}

/// Fields of a map that are not layers or tilesets.
#[derive(Debug, Clone)]
pub(crate) struct MapHeader {
    pub version: String,
    pub tiled_version: Option<String>,
    pub class: String,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    pub background_color: Option<Color>,
}

impl Map {
    /// Final assembly step shared by the front ends.
    ///
    /// Checks every tile layer (including those nested in groups) against the grid size,
    /// and, when `require_resolved` is set, that every non-empty GID resolves.
    pub(crate) fn assemble(
        header: MapHeader,
        tilesets: Vec<TileSetRef>,
        layers: Vec<Layer>,
        properties: Properties,
        require_resolved: bool,
    ) -> Result<Self> {
        let map = Map {
            version: header.version,
            tiled_version: header.tiled_version,
            class: header.class,
            width: header.width,
            height: header.height,
            tile_width: header.tile_width,
            tile_height: header.tile_height,
            orientation: header.orientation,
            render_order: header.render_order,
            background_color: header.background_color,
            properties,
            layers,
            registry: TileSetRegistry::new(tilesets),
        };

        let expected = map.width as usize * map.height as usize;
        for layer in map.iter_layers() {
            match &layer.kind {
                LayerKind::Tile(grid) => {
                    if grid.width() != map.width || grid.height() != map.height {
                        return Err(MapError::InvalidLayerSize {
                            layer: layer.name.clone(),
                            expected,
                            actual: grid.gids().len(),
                        });
                    }
                    if require_resolved {
                        for (_, _, gid) in grid.tiles() {
                            map.registry.require(gid)?;
                        }
                    }
                }
                LayerKind::Objects(objects) if require_resolved => {
                    for gid in objects.iter().filter_map(Object::tile_gid) {
                        map.registry.require(gid)?;
                    }
                }
                _ => {}
            }
        }
        Ok(map)
    }

    /// Tile size in pixels.
    pub fn tile_size(&self) -> UVec2 {
        UVec2::new(self.tile_width, self.tile_height)
    }

    /// Tileset references in declaration order.
    pub fn tilesets(&self) -> &[TileSetRef] {
        self.registry.references()
    }

    /// The GID lookup table built from [`tilesets`](Self::tilesets).
    pub fn registry(&self) -> &TileSetRegistry {
        &self.registry
    }

    /// See [`TileSetRegistry::resolve`].
    pub fn resolve(&self, gid: TileGid) -> Option<ResolvedTile<'_>> {
        self.registry.resolve(gid)
    }

    /// Every layer, depth-first, groups before their children.
    pub fn iter_layers(&self) -> LayerIter<'_> {
        LayerIter {
            stack: vec![self.layers.iter()],
        }
    }

    /// Finds the single layer matching every criterion of `filter`, searching groups too.
    pub fn find_layer(&self, filter: &LayerFilter) -> Result<&Layer, LayerQueryError> {
        if filter.is_empty() {
            return Err(LayerQueryError::NoFiltersSpecified);
        }
        let matches: Vec<&Layer> = self.iter_layers().filter(|l| filter.matches(l)).collect();
        match matches.as_slice() {
            [] => Err(LayerQueryError::NoLayersMatchedFilters),
            [layer] => Ok(*layer),
            many => Err(LayerQueryError::MultipleLayersMatchedFilters(many.len())),
        }
    }

    /// The one layer matching `filter`, which must be a tile layer.
    pub fn tile_layer(&self, filter: &LayerFilter) -> Result<(&Layer, &TileGrid), LayerQueryError> {
        let layer = self.find_layer(filter)?;
        match &layer.kind {
            LayerKind::Tile(grid) => Ok((layer, grid)),
            other => Err(wrong_kind(LayerTag::Tile, other)),
        }
    }

    /// Like [`tile_layer`](Self::tile_layer), for object layers.
    pub fn object_layer(&self, filter: &LayerFilter) -> Result<(&Layer, &[Object]), LayerQueryError> {
        let layer = self.find_layer(filter)?;
        match &layer.kind {
            LayerKind::Objects(objects) => Ok((layer, objects)),
            other => Err(wrong_kind(LayerTag::Objects, other)),
        }
    }

    /// Like [`tile_layer`](Self::tile_layer), for groups.
    pub fn group_layer(&self, filter: &LayerFilter) -> Result<(&Layer, &[Layer]), LayerQueryError> {
        let layer = self.find_layer(filter)?;
        match &layer.kind {
            LayerKind::Group(children) => Ok((layer, children)),
            other => Err(wrong_kind(LayerTag::Group, other)),
        }
    }

    /// Like [`tile_layer`](Self::tile_layer), for image layers.
    pub fn image_layer(&self, filter: &LayerFilter) -> Result<(&Layer, &ImageLayer), LayerQueryError> {
        let layer = self.find_layer(filter)?;
        match &layer.kind {
            LayerKind::Image(image) => Ok((layer, image)),
            other => Err(wrong_kind(LayerTag::Image, other)),
        }
    }

    /// Every object in every object layer, groups included.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.iter_layers().flat_map(|l| match &l.kind {
            LayerKind::Objects(objects) => objects.as_slice(),
            _ => &[][..],
        })
    }
}

fn wrong_kind(expected: LayerTag, found: &LayerKind) -> LayerQueryError {
    LayerQueryError::MatchedLayerWrongKind {
        expected,
        found: found.tag(),
    }
}

/// Depth-first iterator over a layer tree.
pub struct LayerIter<'a> {
    stack: Vec<std::slice::Iter<'a, Layer>>,
}

impl<'a> Iterator for LayerIter<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(iter) = self.stack.last_mut() {
            if let Some(layer) = iter.next() {
                if let LayerKind::Group(children) = &layer.kind {
                    self.stack.push(children.iter());
                }
                return Some(layer);
            }
            self.stack.pop();
        }
        None
    }
}

/// Criteria for [`Map::find_layer`]. Every criterion that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerFilter {
    /// Exact layer name.
    pub name: Option<String>,
    /// Layer id.
    pub id: Option<u32>,
    /// Layer kind.
    pub kind: Option<LayerTag>,
}

impl LayerFilter {
    /// Matches by name.
    pub fn name(name: impl Into<String>) -> Self {
        LayerFilter {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Matches by id.
    pub fn id(id: u32) -> Self {
        LayerFilter {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Also requires the layer to be of `kind`.
    pub fn with_kind(mut self, kind: LayerTag) -> Self {
        self.kind = Some(kind);
        self
    }

    /// No criteria set; such a filter matches every layer.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.id.is_none() && self.kind.is_none()
    }

    /// Whether `layer` meets every criterion that is set.
    pub fn matches(&self, layer: &Layer) -> bool {
        self.name.as_deref().map_or(true, |n| n == layer.name)
            && self.id.map_or(true, |id| id == layer.id)
            && self.kind.map_or(true, |k| k == layer.tag())
    }
}
