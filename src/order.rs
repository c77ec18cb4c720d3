//! Layer order recovery.
//!
//! Front ends decode sibling layer elements one tag at a time, so each kind arrives as
//! its own list. [`LayerGroups`] holds those lists as FIFO queues and
//! [`LayerGroups::restore_order`] replays the tag sequence seen while scanning the
//! parent element to rebuild the original interleaving.

use std::collections::VecDeque;

use crate::error::{MapError, Result};
use crate::layer::{Layer, LayerTag};

/// Decoded layers queued per tag, plus the order the tags occurred in.
#[derive(Debug, Default)]
pub struct LayerGroups {
    queues: [VecDeque<Layer>; 4],
    occurrences: Vec<LayerTag>,
}

impl LayerGroups {
    /// Empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that an element with this tag was seen at the next position.
    pub fn record(&mut self, tag: LayerTag) {
        self.occurrences.push(tag);
    }

    /// Queues a decoded layer behind the earlier layers of the same tag.
    pub fn push(&mut self, layer: Layer) {
        self.queues[layer.tag().slot()].push_back(layer);
    }

    /// Queues every layer of one tag, in order.
    pub fn extend(&mut self, layers: impl IntoIterator<Item = Layer>) {
        for layer in layers {
            self.push(layer);
        }
    }

    /// Tags recorded so far, in document order.
    pub fn occurrences(&self) -> &[LayerTag] {
        &self.occurrences
    }

    /// Replays the recorded occurrences, popping one queued layer per tag.
    ///
    /// Fails with [`MapError::StructuralMismatch`] if a queue runs dry, or if layers are
    /// left over once the replay is done.
    pub fn restore_order(self) -> Result<Vec<Layer>> {
        let LayerGroups {
            mut queues,
            occurrences,
        } = self;

        let mut out = Vec::with_capacity(occurrences.len());
        for (position, tag) in occurrences.into_iter().enumerate() {
            let layer = queues[tag.slot()].pop_front().ok_or_else(|| MapError::StructuralMismatch {
                tag,
                reason: format!("no decoded layer left for occurrence {position}"),
            })?;
            out.push(layer);
        }

        for tag in LayerTag::ALL {
            let left = queues[tag.slot()].len();
            if left > 0 {
                return Err(MapError::StructuralMismatch {
                    tag,
                    reason: format!("{left} decoded layer(s) were never placed"),
                });
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{ImageLayer, LayerKind, TileGrid};

    fn tile(name: &str) -> Layer {
        Layer::new(name, LayerKind::Tile(TileGrid::new(0, 0, vec![]).expect("grid")))
    }

    fn objects(name: &str) -> Layer {
        Layer::new(name, LayerKind::Objects(vec![]))
    }

    fn group(name: &str) -> Layer {
        Layer::new(name, LayerKind::Group(vec![]))
    }

    fn names(layers: &[Layer]) -> Vec<&str> {
        layers.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn replays_interleaving() {
        let mut groups = LayerGroups::new();
        for tag in [LayerTag::Tile, LayerTag::Objects, LayerTag::Tile, LayerTag::Group] {
            groups.record(tag);
        }
        groups.extend([tile("ground"), tile("deco")]);
        groups.push(objects("spawns"));
        groups.push(group("fx"));

        let layers = groups.restore_order().expect("restore");
        assert_eq!(names(&layers), vec!["ground", "spawns", "deco", "fx"]);
        let tags: Vec<_> = layers.iter().map(Layer::tag).collect();
        assert_eq!(tags, vec![LayerTag::Tile, LayerTag::Objects, LayerTag::Tile, LayerTag::Group]);
    }

    #[test]
    fn exhausted_queue_is_a_mismatch() {
        let mut groups = LayerGroups::new();
        groups.record(LayerTag::Image);
        groups.record(LayerTag::Image);
        groups.push(Layer::new("sky", LayerKind::Image(ImageLayer::default())));

        let err = groups.restore_order().unwrap_err();
        assert!(matches!(err, MapError::StructuralMismatch { tag: LayerTag::Image, .. }));
    }

    #[test]
    fn leftover_layers_are_a_mismatch() {
        let mut groups = LayerGroups::new();
        groups.record(LayerTag::Tile);
        groups.extend([tile("a"), tile("b")]);

        let err = groups.restore_order().unwrap_err();
        assert!(matches!(err, MapError::StructuralMismatch { tag: LayerTag::Tile, .. }));
    }

    #[test]
    fn empty_groups_restore_to_nothing() {
        assert!(LayerGroups::new().restore_order().expect("restore").is_empty());
    }
}
