//! Tile layer data decoding.
//!
//! Only uncompressed CSV is decoded. Base64 and every compression scheme are recognised
//! and rejected with [`MapError::UnsupportedTileDataFormat`].

use serde::Deserialize;
use tracing::warn;

use crate::error::{MapError, Result};
use crate::gid::TileGid;

/// What to do with a CSV token that is not a `u32`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvTokenPolicy {
    /// Fail the load with [`MapError::InvalidTileToken`].
    #[default]
    Strict,
    /// Substitute an empty cell and keep going.
    Lenient,
}

/// Decodes the body of a `<data>` element.
///
/// `encoding` and `compression` are the attribute values as written; anything other
/// than `csv` with no compression is reported back verbatim.
pub fn decode_tile_data(
    encoding: &str,
    compression: Option<&str>,
    text: &str,
    policy: CsvTokenPolicy,
) -> Result<Vec<TileGid>> {
    match (encoding, compression) {
        ("csv", None | Some("")) => decode_csv(text, policy),
        _ => Err(MapError::UnsupportedTileDataFormat {
            encoding: encoding.to_owned(),
            compression: compression.map(str::to_owned),
        }),
    }
}

/// Parses comma/newline separated decimal GIDs.
pub fn decode_csv(text: &str, policy: CsvTokenPolicy) -> Result<Vec<TileGid>> {
    let tokens = text
        .split(|c| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let mut out = Vec::new();
    for (position, token) in tokens.enumerate() {
        match token.parse::<u32>() {
            Ok(raw) => out.push(TileGid(raw)),
            Err(_) if policy == CsvTokenPolicy::Lenient => {
                warn!(token, position, "invalid tile token replaced with empty cell");
                out.push(TileGid::EMPTY);
            }
            Err(_) => {
                return Err(MapError::InvalidTileToken {
                    token: token.to_owned(),
                    position,
                })
            }
        }
    }
    Ok(out)
}
