//! Loading documents from storage.
//!
//! The [`Loader`] reads bytes through a [`ResourceReader`], picks a front end from the
//! file extension and passes the document's directory down explicitly, so every relative
//! path is resolved against the document that contains it. External tilesets are
//! interned by resolved path: maps that share a tileset file share one `Arc<TileSet>`.

pub(crate) mod json_loader;
mod tmx;

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::map::Map;
use crate::tile_data::CsvTokenPolicy;
use crate::tileset::TileSet;

/// Loader settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// How to treat CSV tile tokens that are not integers.
    pub csv_tokens: CsvTokenPolicy,
    /// Fail the load if any non-empty GID in the map does not resolve to a tileset.
    pub require_resolved_gids: bool,
}

/// Source of document text.
pub trait ResourceReader {
    /// Reads the whole document at `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl ResourceReader for FsReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves documents from memory, keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    /// An empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `text` under `path`, replacing any earlier entry.
    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }
}

impl ResourceReader for MemoryReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display())))
    }
}

/// Document syntax, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.tmx`, `.tsx` and `.xml`.
    Xml,
    /// `.tmj`, `.tsj` and `.json`.
    Json,
}

impl Format {
    /// Picks the format from `path`'s extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tmx" | "tsx" | "xml") => Ok(Format::Xml),
            Some("tmj" | "tsj" | "json") => Ok(Format::Json),
            _ => Err(MapError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Joins a document-relative path onto the document's directory.
pub(crate) fn resolve_path(base_dir: &Path, relative: &str) -> PathBuf {
    normalize(&base_dir.join(relative))
}

/// Lexically removes `.` and `name/..` pairs.
///
/// A `..` that has no normal component before it is kept, so `../a` stays `../a`.
/// At the root it is dropped, since `/..` is `/`.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Loads maps and tilesets, caching external tilesets by path.
#[derive(Debug)]
pub struct Loader<R = FsReader> {
    config: LoaderConfig,
    reader: R,
    tilesets: HashMap<PathBuf, Arc<TileSet>>,
}

impl Default for Loader<FsReader> {
    fn default() -> Self {
        Loader::with_reader(FsReader)
    }
}

impl Loader<FsReader> {
    /// A loader reading from the filesystem with default settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: ResourceReader> Loader<R> {
    /// A loader reading through `reader` with default settings.
    pub fn with_reader(reader: R) -> Self {
        Loader {
            config: LoaderConfig::default(),
            reader,
            tilesets: HashMap::new(),
        }
    }

    /// Replaces the settings.
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Current settings.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of distinct external tilesets loaded so far.
    pub fn cached_tilesets(&self) -> usize {
        self.tilesets.len()
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.reader.read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a `.tmx`, `.tmj` or `.json` map.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<Map> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let text = self.read(path)?;
        let base_dir = parent_dir(path);
        debug!(path = %path.display(), ?format, "loading map");
        match format {
            Format::Xml => self.parse_tmx(&text, &base_dir),
            Format::Json => self.parse_map_json(&text, &base_dir),
        }
    }

    /// Parses TMX text; relative paths resolve against `base_dir`.
    pub fn parse_tmx(&mut self, text: &str, base_dir: &Path) -> Result<Map> {
        tmx::parse_map(self, text, base_dir)
    }

    /// Parses Tiled JSON map text; relative paths resolve against `base_dir`.
    pub fn parse_map_json(&mut self, text: &str, base_dir: &Path) -> Result<Map> {
        json_loader::parse_map(self, text, base_dir)
    }

    /// Loads an external tileset, or returns the cached copy.
    pub fn load_tileset(&mut self, path: impl AsRef<Path>) -> Result<Arc<TileSet>> {
        let path = normalize(path.as_ref());
        if let Some(tileset) = self.tilesets.get(&path) {
            debug!(path = %path.display(), "tileset cache hit");
            return Ok(Arc::clone(tileset));
        }

        let format = Format::from_path(&path)?;
        let text = self.read(&path)?;
        let base_dir = parent_dir(&path);
        debug!(path = %path.display(), ?format, "loading tileset");
        let tileset = match format {
            Format::Xml => tmx::parse_tileset(&text, &base_dir)?,
            Format::Json => json_loader::parse_tileset(&text, &base_dir)?,
        };

        let tileset = Arc::new(tileset);
        self.tilesets.insert(path, Arc::clone(&tileset));
        Ok(tileset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("a/b.tmx")).expect("tmx"), Format::Xml);
        assert_eq!(Format::from_path(Path::new("b.tsj")).expect("tsj"), Format::Json);
        let err = Format::from_path(Path::new("foo.png")).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedFormat(ref p) if p == Path::new("foo.png")));
    }

    #[test]
    fn resolve_path_collapses_parent_components() {
        assert_eq!(
            resolve_path(Path::new("/game/maps"), "../tilesets/terrain.tsx"),
            PathBuf::from("/game/tilesets/terrain.tsx")
        );
        assert_eq!(resolve_path(Path::new("maps"), "./a.png"), PathBuf::from("maps/a.png"));
    }

    #[test]
    fn resolve_path_keeps_parents_it_cannot_pop() {
        assert_eq!(resolve_path(Path::new(""), "../shared/t.tsx"), PathBuf::from("../shared/t.tsx"));
        assert_eq!(resolve_path(Path::new("maps"), "../../t.tsx"), PathBuf::from("../t.tsx"));
        assert_eq!(resolve_path(Path::new("../maps"), "../t.tsx"), PathBuf::from("../t.tsx"));
        assert_eq!(resolve_path(Path::new("/"), "../t.tsx"), PathBuf::from("/t.tsx"));
    }

    #[test]
    fn memory_reader_keeps_leading_parent_distinct() {
        let mut reader = MemoryReader::new();
        reader.insert("../shared/t.tsx", "right");
        reader.insert("shared/t.tsx", "wrong");
        let text = reader.read_to_string(Path::new("./../shared/t.tsx")).expect("entry");
        assert_eq!(text, "right");
    }

    #[test]
    fn tileset_above_a_relative_map_dir_is_found() {
        let mut reader = MemoryReader::new();
        reader.insert(
            "../shared/t.tsx",
            r#"<tileset name="right" tilewidth="8" tileheight="8" tilecount="1" columns="1"/>"#,
        );
        reader.insert(
            "shared/t.tsx",
            r#"<tileset name="wrong" tilewidth="8" tileheight="8" tilecount="1" columns="1"/>"#,
        );
        reader.insert(
            "level.tmx",
            r#"<map version="1.10" orientation="orthogonal" width="1" height="1" tilewidth="8" tileheight="8">
 <tileset firstgid="1" source="../shared/t.tsx"/>
 <layer id="1" name="ground" width="1" height="1"><data encoding="csv">1</data></layer>
</map>"#,
        );

        let mut loader = Loader::with_reader(reader);
        let map = loader.load_map("level.tmx").expect("map");
        let bound = &map.registry().references()[0];
        assert_eq!(bound.tileset.name, "right");
        assert_eq!(bound.source.as_deref(), Some(Path::new("../shared/t.tsx")));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: LoaderConfig = serde_json::from_str(r#"{"csv_tokens":"lenient"}"#).expect("config");
        assert_eq!(config.csv_tokens, CsvTokenPolicy::Lenient);
        assert!(!config.require_resolved_gids);
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut loader = Loader::with_reader(MemoryReader::new());
        let err = loader.load_map("nowhere/map.tmx").unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }
}
