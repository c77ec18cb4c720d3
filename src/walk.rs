//! Traversal of a layer tree by engine adapters.
//!
//! An adapter implements [`LayerVisitor`] for the layer kinds it can build and hands it
//! to [`walk`]. Kinds it leaves unimplemented fail with [`MapError::UnknownLayerType`].
//! [`AdapterRegistry`] lets an application keep several adapters around and pick one by
//! the layer kinds a map needs.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use tracing::trace;

use crate::error::{MapError, Result};
use crate::layer::{ImageLayer, Layer, LayerKind, LayerTag, TileGrid};
use crate::object::Object;

/// Callbacks invoked by [`walk`], one per layer, in document order.
///
/// `Container` is whatever the engine attaches layers to (a scene node, an entity, ...).
/// A group callback returns the container its children are attached to.
pub trait LayerVisitor {
    /// Engine-side node that layers attach to.
    type Container;

    /// A tile layer. The default fails with [`MapError::UnknownLayerType`], as do the
    /// other `visit_*` defaults.
    fn visit_tile_layer(&mut self, _parent: &mut Self::Container, _layer: &Layer, _grid: &TileGrid) -> Result<()> {
        Err(MapError::UnknownLayerType(LayerTag::Tile))
    }

    /// An object layer.
    fn visit_object_layer(
        &mut self,
        _parent: &mut Self::Container,
        _layer: &Layer,
        _objects: &[Object],
    ) -> Result<()> {
        Err(MapError::UnknownLayerType(LayerTag::Objects))
    }

    /// A group, before its children. Returns the container for the children.
    fn visit_group_layer(&mut self, _parent: &mut Self::Container, _layer: &Layer) -> Result<Self::Container> {
        Err(MapError::UnknownLayerType(LayerTag::Group))
    }

    /// An image layer.
    fn visit_image_layer(
        &mut self,
        _parent: &mut Self::Container,
        _layer: &Layer,
        _image: &ImageLayer,
    ) -> Result<()> {
        Err(MapError::UnknownLayerType(LayerTag::Image))
    }

    /// Called once a group's children have been walked, with the container the group
    /// callback returned.
    fn finish_group(&mut self, _parent: &mut Self::Container, _layer: &Layer, _child: Self::Container) -> Result<()> {
        Ok(())
    }
}

/// Visits `layers` in order, recursing into groups with the container their callback
/// returned. The first error stops the walk.
pub fn walk<V>(layers: &[Layer], parent: &mut V::Container, visitor: &mut V) -> Result<()>
where
    V: LayerVisitor + ?Sized,
{
    for layer in layers {
        trace!(layer = %layer.name, kind = %layer.tag(), "visiting layer");
        match &layer.kind {
            LayerKind::Tile(grid) => visitor.visit_tile_layer(parent, layer, grid)?,
            LayerKind::Objects(objects) => visitor.visit_object_layer(parent, layer, objects)?,
            LayerKind::Image(image) => visitor.visit_image_layer(parent, layer, image)?,
            LayerKind::Group(children) => {
                let mut child = visitor.visit_group_layer(parent, layer)?;
                walk(children, &mut child, visitor)?;
                visitor.finish_group(parent, layer, child)?;
            }
        }
    }
    Ok(())
}

bitflags! {
    /// Layer kinds an adapter can build.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Tile layers.
        const TILE_LAYERS = 1 << 0;
        /// Object layers.
        const OBJECT_LAYERS = 1 << 1;
        /// Groups.
        const GROUP_LAYERS = 1 << 2;
        /// Image layers.
        const IMAGE_LAYERS = 1 << 3;
    }
}

impl Capabilities {
    /// The single flag for one layer kind.
    pub fn for_tag(tag: LayerTag) -> Self {
        match tag {
            LayerTag::Tile => Capabilities::TILE_LAYERS,
            LayerTag::Objects => Capabilities::OBJECT_LAYERS,
            LayerTag::Group => Capabilities::GROUP_LAYERS,
            LayerTag::Image => Capabilities::IMAGE_LAYERS,
        }
    }

    /// The kinds present anywhere in a layer tree.
    pub fn required_by(layers: &[Layer]) -> Self {
        layers.iter().fold(Capabilities::empty(), |acc, layer| {
            acc | Capabilities::for_tag(layer.tag()) | Capabilities::required_by(layer.children())
        })
    }
}

type Constructor<C> = Box<dyn Fn() -> Box<dyn LayerVisitor<Container = C>>>;

/// Adapter constructors keyed by the layer kinds they handle.
pub struct AdapterRegistry<C> {
    constructors: HashMap<Capabilities, Constructor<C>>,
}

impl<C> Default for AdapterRegistry<C> {
    fn default() -> Self {
        AdapterRegistry {
            constructors: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for AdapterRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl<C> AdapterRegistry<C> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor, replacing any earlier one for the same capability set.
    pub fn register<F>(&mut self, capabilities: Capabilities, constructor: F)
    where
        F: Fn() -> Box<dyn LayerVisitor<Container = C>> + 'static,
    {
        self.constructors.insert(capabilities, Box::new(constructor));
    }

    /// Builds the adapter registered for exactly `capabilities`.
    pub fn create(&self, capabilities: Capabilities) -> Option<Box<dyn LayerVisitor<Container = C>>> {
        self.constructors.get(&capabilities).map(|make| make())
    }

    /// Builds the adapter with the fewest capabilities that still covers `required`.
    pub fn best_for(&self, required: Capabilities) -> Option<Box<dyn LayerVisitor<Container = C>>> {
        self.constructors
            .iter()
            .filter(|(caps, _)| caps.contains(required))
            .min_by_key(|(caps, _)| (caps.bits().count_ones(), caps.bits()))
            .map(|(_, make)| make())
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
