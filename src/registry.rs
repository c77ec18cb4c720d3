use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{MapError, Result};
use crate::gid::TileGid;
use crate::tileset::{Tile, TileSet};

/// A tileset bound into a map at `first_gid`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSetRef {
    /// GID of the tileset's first tile.
    pub first_gid: u32,
    /// The tileset, shared with other maps that reference the same file.
    pub tileset: Arc<TileSet>,
    /// The external file it came from; `None` for tilesets embedded in the map.
    pub source: Option<PathBuf>,
}

/// Result of resolving a GID.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTile<'a> {
    /// The binding the GID fell into.
    pub reference: &'a TileSetRef,
    /// Index within the tileset.
    pub local: u32,
    /// Per-tile metadata, if the tileset has any for this tile.
    pub tile: Option<&'a Tile>,
}

impl<'a> ResolvedTile<'a> {
    /// The tileset the tile belongs to.
    pub fn tileset(&self) -> &'a TileSet {
        &self.reference.tileset
    }
}

/// Resolves GIDs against a map's tilesets.
///
/// References keep their declaration order; a descending `first_gid` index is built once
/// here, so callers never need to sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileSetRegistry {
    refs: Vec<TileSetRef>,
    descending: Vec<usize>,
}

impl TileSetRegistry {
    /// Builds the lookup over `refs`, given in declaration order.
    pub fn new(refs: Vec<TileSetRef>) -> Self {
        let mut descending: Vec<usize> = (0..refs.len()).collect();
        descending.sort_by(|&a, &b| refs[b].first_gid.cmp(&refs[a].first_gid));
        TileSetRegistry { refs, descending }
    }

    /// References in declaration order.
    pub fn references(&self) -> &[TileSetRef] {
        &self.refs
    }

    /// Number of bound tilesets.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether no tilesets are bound.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Finds the tileset and local index for a GID. Flip flags are ignored.
    ///
    /// The reference with the greatest `first_gid` not above the index wins, so
    /// overlapping ranges resolve to the more specific binding. `None` for empty cells
    /// and for indices past the end of that tileset.
    pub fn resolve(&self, gid: TileGid) -> Option<ResolvedTile<'_>> {
        let index = gid.index();
        if index == 0 {
            return None;
        }
        let reference = self
            .descending
            .iter()
            .map(|&i| &self.refs[i])
            .find(|r| r.first_gid <= index)?;

        let local = index - reference.first_gid;
        if !reference.tileset.contains(local) {
            return None;
        }
        Some(ResolvedTile {
            reference,
            local,
            tile: reference.tileset.tile(local),
        })
    }

    /// Like [`resolve`](Self::resolve), for callers that need the tile to exist.
    pub fn require(&self, gid: TileGid) -> Result<ResolvedTile<'_>> {
        self.resolve(gid).ok_or(MapError::UnresolvedGid(gid.raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;

    fn tileset(name: &str, count: u32) -> Arc<TileSet> {
        let mut ts = TileSet::new(name, UVec2::splat(16));
        ts.tile_count = count;
        Arc::new(ts)
    }

    fn bind(first_gid: u32, tileset: Arc<TileSet>) -> TileSetRef {
        TileSetRef {
            first_gid,
            tileset,
            source: None,
        }
    }

    #[test]
    fn resolves_across_two_tilesets() {
        let registry = TileSetRegistry::new(vec![bind(1, tileset("a", 10)), bind(11, tileset("b", 5))]);

        let hit = registry.resolve(TileGid(5)).expect("gid 5");
        assert_eq!((hit.tileset().name.as_str(), hit.local), ("a", 4));

        let hit = registry.resolve(TileGid(11)).expect("gid 11");
        assert_eq!((hit.tileset().name.as_str(), hit.local), ("b", 0));

        assert!(registry.resolve(TileGid(20)).is_none());
        assert!(registry.resolve(TileGid(0)).is_none());
    }

    #[test]
    fn declaration_order_does_not_matter() {
        let registry = TileSetRegistry::new(vec![bind(11, tileset("b", 5)), bind(1, tileset("a", 10))]);
        assert_eq!(registry.resolve(TileGid(10)).map(|r| r.tileset().name.clone()), Some("a".into()));
        assert_eq!(registry.references()[0].first_gid, 11);
    }

    #[test]
    fn flip_flags_are_ignored() {
        let registry = TileSetRegistry::new(vec![bind(1, tileset("a", 10))]);
        let gid = TileGid::pack(3, true, true, false).expect("pack");
        assert_eq!(registry.resolve(gid).map(|r| r.local), Some(2));
    }

    #[test]
    fn overlapping_ranges_prefer_highest_first_gid() {
        let registry = TileSetRegistry::new(vec![bind(1, tileset("wide", 100)), bind(50, tileset("narrow", 10))]);
        let hit = registry.resolve(TileGid(55)).expect("gid 55");
        assert_eq!((hit.tileset().name.as_str(), hit.local), ("narrow", 5));
    }

    #[test]
    fn attaches_sparse_tile_metadata() {
        let mut ts = TileSet::new("a", UVec2::splat(16));
        ts.tile_count = 4;
        ts.insert_tile(2, Tile { probability: 0.25, ..Tile::default() });
        let registry = TileSetRegistry::new(vec![bind(1, Arc::new(ts))]);

        assert_eq!(registry.resolve(TileGid(3)).and_then(|r| r.tile).map(|t| t.probability), Some(0.25));
        let bare = registry.resolve(TileGid(2)).expect("gid 2");
        assert!(bare.tile.is_none());
    }

    #[test]
    fn require_reports_unresolved_gid() {
        let registry = TileSetRegistry::new(vec![bind(1, tileset("a", 2))]);
        let err = registry.require(TileGid(9)).unwrap_err();
        assert!(matches!(err, MapError::UnresolvedGid(9)));
    }
}
