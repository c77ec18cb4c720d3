//! Tiled project file (`.tiled-project`) metadata.
//!
//! The project is read as-is and not interpreted; it mostly tells an application where
//! the object-types file and extensions live. Keys this crate does not model are kept
//! in [`Project::extra`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{MapError, Result};
use crate::loader::{resolve_path, ResourceReader};

/// A `.tiled-project` document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Automapping rules file path.
    #[serde(default)]
    pub automapping_rules_file: String,

    /// Path to the extensions folder.
    #[serde(default)]
    pub extensions_path: String,

    /// Folders shown in the project view.
    #[serde(default)]
    pub folders: Vec<String>,

    /// Object-types file, relative to the project file.
    #[serde(default)]
    pub object_types_file: String,

    /// Custom commands.
    #[serde(default)]
    pub commands: Vec<Command>,

    /// Everything else in the file (property types, compatibility version, ...).
    #[serde(flatten)]
    pub extra: JsonMap<String, JsonValue>,
}

/// A custom command configured in the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Command {
    /// Arguments passed to the executable; may contain `%mapfile` style placeholders.
    pub arguments: String,
    /// Executable to run.
    pub command: String,
    /// Whether the command shows up in the editor.
    pub enabled: bool,
    /// Save the current document before running.
    pub save_before_execute: bool,
    /// Key sequence, e.g. `Ctrl+E`.
    pub shortcut: String,
    /// Show the command's output in the console.
    pub show_output: bool,
    /// Directory the command runs in.
    pub working_directory: String,
}

impl Project {
    /// Parses project JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a project file through `reader`.
    pub fn load<R: ResourceReader>(reader: &R, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = reader.read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// The object-types file resolved against `project_dir`, if one is configured.
    pub fn object_types_path(&self, project_dir: &Path) -> Option<PathBuf> {
        (!self.object_types_file.is_empty()).then(|| resolve_path(project_dir, &self.object_types_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryReader;

    const PROJECT: &str = r#"{
        "automappingRulesFile": "rules.txt",
        "commands": [
            {
                "arguments": "%mapfile",
                "command": "export.sh",
                "enabled": true,
                "saveBeforeExecute": true,
                "shortcut": "Ctrl+E",
                "showOutput": false,
                "workingDirectory": "%mappath"
            }
        ],
        "compatibilityVersion": 1100,
        "extensionsPath": "extensions",
        "folders": ["maps", "tilesets"],
        "objectTypesFile": "../shared/objecttypes.xml",
        "propertyTypes": []
    }"#;

    #[test]
    fn parses_known_keys_and_keeps_the_rest() {
        let project = Project::from_json(PROJECT).expect("project");
        assert_eq!(project.automapping_rules_file, "rules.txt");
        assert_eq!(project.extensions_path, "extensions");
        assert_eq!(project.folders, vec!["maps", "tilesets"]);
        assert_eq!(project.commands.len(), 1);
        let command = &project.commands[0];
        assert_eq!(command.command, "export.sh");
        assert!(command.save_before_execute);
        assert!(!command.show_output);
        assert_eq!(command.working_directory, "%mappath");

        assert_eq!(project.extra.get("compatibilityVersion"), Some(&JsonValue::from(1100)));
        assert!(project.extra.contains_key("propertyTypes"));
    }

    #[test]
    fn object_types_path_is_relative_to_project_dir() {
        let project = Project::from_json(PROJECT).expect("project");
        assert_eq!(
            project.object_types_path(Path::new("/work/game")),
            Some(PathBuf::from("/work/shared/objecttypes.xml"))
        );
        assert_eq!(Project::default().object_types_path(Path::new("/work")), None);
    }

    #[test]
    fn load_reads_through_the_reader() {
        let mut reader = MemoryReader::new();
        reader.insert("game/game.tiled-project", PROJECT);
        let project = Project::load(&reader, "game/game.tiled-project").expect("project");
        assert_eq!(project.object_types_file, "../shared/objecttypes.xml");

        let err = Project::load(&reader, "other.tiled-project").unwrap_err();
        assert!(matches!(err, MapError::Io { ref path, .. } if path == Path::new("other.tiled-project")));
    }

    #[test]
    fn empty_object_is_a_valid_project() {
        let project = Project::from_json("{}").expect("project");
        assert!(project.commands.is_empty());
        assert!(project.extra.is_empty());
    }
}
