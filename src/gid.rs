use std::fmt;

use crate::error::{MapError, Result};

/// Horizontal flip flag (bit 31).
pub const FLIP_H: u32 = 0x8000_0000;
/// Vertical flip flag (bit 30).
pub const FLIP_V: u32 = 0x4000_0000;
/// Diagonal flip flag (bit 29), i.e. swap x and y.
pub const FLIP_D: u32 = 0x2000_0000;
/// Tile index bits.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// Global tile identifier: a tile index in the low 29 bits and flip flags in the top 3.
///
/// Equality compares the raw value, so the same tile placed with different flips is a
/// different `TileGid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileGid(pub u32);

impl TileGid {
    /// The empty cell.
    pub const EMPTY: TileGid = TileGid(0);

    /// Packs an index and flip flags into a GID.
    ///
    /// Fails with [`MapError::TileIndexOutOfRange`] instead of truncating an index that
    /// needs more than 29 bits.
    pub fn pack(index: u32, flip_h: bool, flip_v: bool, flip_d: bool) -> Result<Self> {
        if index & !GID_MASK != 0 {
            return Err(MapError::TileIndexOutOfRange(index));
        }
        let mut raw = index;
        if flip_h {
            raw |= FLIP_H;
        }
        if flip_v {
            raw |= FLIP_V;
        }
        if flip_d {
            raw |= FLIP_D;
        }
        Ok(TileGid(raw))
    }

    /// Splits the GID into `(index, flip_h, flip_v, flip_d)`.
    #[inline]
    pub fn unpack(self) -> (u32, bool, bool, bool) {
        (self.index(), self.flip_h(), self.flip_v(), self.flip_d())
    }

    /// The value as stored in the document, flags included.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    /// Tile index with the flip flags masked off.
    #[inline] pub fn index(self) -> u32 { self.0 & GID_MASK }
    /// Flipped horizontally.
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    /// Flipped vertically.
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    /// Flipped anti-diagonally.
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    /// An empty cell has index 0, whatever its flags say.
    #[inline] pub fn is_empty(self) -> bool { self.index() == 0 }
}

impl From<u32> for TileGid {
    fn from(raw: u32) -> Self {
        TileGid(raw)
    }
}

impl fmt::Display for TileGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())?;
        if self.0 & !GID_MASK != 0 {
            f.write_str("[")?;
            if self.flip_h() {
                f.write_str("h")?;
            }
            if self.flip_v() {
                f.write_str("v")?;
            }
            if self.flip_d() {
                f.write_str("d")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
