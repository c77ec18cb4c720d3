use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::layer::LayerTag;

/// Errors that abort loading a document.
///
/// Apart from [`Property::Error`](crate::Property::Error) values, which degrade in place,
/// any failure while assembling a map is fatal: no partial document is ever returned.
#[derive(Debug, Error)]
pub enum MapError {
    /// Reading a document or one of its dependencies failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The XML front end rejected the document.
    #[error("malformed XML document: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The JSON front end rejected the document.
    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed, but its structure is not what a Tiled document looks like.
    #[error("malformed document at <{element}>: {reason}")]
    MalformedDocument {
        /// Element (or JSON object) where the problem was found.
        element: String,
        /// What was wrong.
        reason: String,
    },

    /// A required attribute was absent.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: &'static str,
    },

    /// An attribute was present but could not be parsed.
    #[error("<{element}> attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: &'static str,
        /// The raw attribute text.
        value: String,
    },

    /// Replaying the layer occurrence sequence did not line up with the decoded groups.
    #[error("layer order mismatch for <{tag}>: {reason}")]
    StructuralMismatch {
        /// Layer tag whose queue did not match.
        tag: LayerTag,
        /// What went wrong.
        reason: String,
    },

    /// Tile data used an encoding/compression pair this crate does not decode.
    #[error(
        "unsupported tile data format (encoding: {encoding}, compression: {})",
        compression.as_deref().unwrap_or("none")
    )]
    UnsupportedTileDataFormat {
        /// Declared encoding, verbatim.
        encoding: String,
        /// Declared compression, verbatim; `None` when absent.
        compression: Option<String>,
    },

    /// A CSV token was not an unsigned 32-bit integer.
    #[error("invalid tile data token '{token}' at position {position}")]
    InvalidTileToken {
        /// The offending token.
        token: String,
        /// Index of the token in the grid.
        position: usize,
    },

    /// A tile layer's data length does not match the map grid.
    #[error("layer '{layer}' has {actual} tiles, expected {expected}")]
    InvalidLayerSize {
        /// Name of the layer.
        layer: String,
        /// Map width * height.
        expected: usize,
        /// Number of decoded tiles.
        actual: usize,
    },

    /// A property declared a type but carried neither a value nor body text.
    #[error("property '{name}' of type '{declared_type}' has no value")]
    PropertyHasNoValue {
        /// Property name.
        name: String,
        /// Declared type tag.
        declared_type: String,
    },

    /// A hexagonal map is missing orientation attributes.
    #[error("hexagonal map is missing {}", .0.join(", "))]
    MissingOrientationInfo(Vec<&'static str>),

    /// The orientation attribute is not one Tiled writes.
    #[error("unknown map orientation '{0}'")]
    UnknownOrientation(String),

    /// The render order attribute is not one Tiled writes.
    #[error("unknown render order '{0}'")]
    UnknownRenderOrder(String),

    /// A GID did not resolve to any tileset, and the caller required it to.
    #[error("tile gid {0} does not belong to any tileset")]
    UnresolvedGid(u32),

    /// A tile index does not fit in the 29 bits a GID reserves for it.
    #[error("tile index {0} does not fit in 29 bits")]
    TileIndexOutOfRange(u32),

    /// A visitor was handed a layer kind it does not handle.
    #[error("visitor does not handle {0} layers")]
    UnknownLayerType(LayerTag),

    /// The file extension does not name a supported document format.
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A recognised but unimplemented feature, such as infinite maps.
    #[error("unsupported feature: {0}")]
    Unsupported(String),
}

/// Errors returned by the layer query API on [`Map`](crate::Map).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerQueryError {
    /// The filter had no criteria set.
    #[error("no layer filters specified")]
    NoFiltersSpecified,
    /// No layer satisfied every criterion.
    #[error("no layers matched the filters")]
    NoLayersMatchedFilters,
    /// More than one layer satisfied every criterion.
    #[error("{0} layers matched the filters")]
    MultipleLayersMatchedFilters(usize),
    /// A single layer matched, but not of the requested kind.
    #[error("matched layer is a {found} layer, expected {expected}")]
    MatchedLayerWrongKind {
        /// Kind the caller asked for.
        expected: LayerTag,
        /// Kind of the layer that matched.
        found: LayerTag,
    },
}

/// Result with [`MapError`] as the default error.
pub type Result<T, E = MapError> = std::result::Result<T, E>;
