use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::world::animation::Direction;

/// One entry of a per-map `<map stem>_npcs.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NpcDefinition {
    pub name: String,
    pub image_src: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub moving_direction: Option<Direction>,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct NpcDefinitions {
    entries: BTreeMap<String, NpcDefinition>,
}

impl NpcDefinitions {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, NpcDefinition)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&NpcDefinition> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum NpcDefinitionError {
    #[error("failed to read npc definitions {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse npc definitions {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the definitions file at `path`; a missing file yields `None`.
pub fn load_npc_definitions(path: &Path) -> Result<Option<NpcDefinitions>, NpcDefinitionError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(NpcDefinitionError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_npc_definitions(path, &raw).map(Some)
}

pub fn parse_npc_definitions(path: &Path, raw: &str) -> Result<NpcDefinitions, NpcDefinitionError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, NpcDefinitions>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        NpcDefinitionError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(raw: &str) -> Result<NpcDefinitions, NpcDefinitionError> {
        parse_npc_definitions(Path::new("map1_npcs.json"), raw)
    }

    #[test]
    fn optional_fields_take_defaults() {
        let defs = parse(
            r#"{"guard": {"name": "Guard", "image_src": "guard.png", "lines": []}}"#,
        )
        .expect("parse");
        let guard = defs.get("guard").expect("guard");
        assert_eq!(guard.direction, Direction::Down);
        assert_eq!(guard.moving_direction, None);
        assert!(guard.lines.is_empty());
    }

    #[test]
    fn reads_all_fields() {
        let defs = parse(
            r#"{
                "walker": {
                    "name": "Walker",
                    "image_src": "walker.png",
                    "direction": "left",
                    "moving_direction": "up",
                    "lines": ["Nice day.", "Bye."]
                }
            }"#,
        )
        .expect("parse");
        let walker = defs.get("walker").expect("walker");
        assert_eq!(walker.direction, Direction::Left);
        assert_eq!(walker.moving_direction, Some(Direction::Up));
        assert_eq!(walker.lines, vec!["Nice day.", "Bye."]);
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn missing_lines_is_an_error_with_path() {
        let err = parse(r#"{"guard": {"name": "Guard", "image_src": "guard.png"}}"#)
            .expect_err("lines required");
        let NpcDefinitionError::Parse { json_path, .. } = err else {
            panic!("expected parse error");
        };
        assert_eq!(json_path, "guard");
    }

    #[test]
    fn unknown_direction_reports_field_path() {
        let err = parse(
            r#"{"guard": {"name": "G", "image_src": "g.png", "direction": "north", "lines": []}}"#,
        )
        .expect_err("bad direction");
        let NpcDefinitionError::Parse { json_path, .. } = err else {
            panic!("expected parse error");
        };
        assert_eq!(json_path, "guard.direction");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let temp = TempDir::new().expect("temp");
        let loaded = load_npc_definitions(&temp.path().join("absent_npcs.json")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn present_file_is_parsed() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("map1_npcs.json");
        fs::write(
            &path,
            r#"{"elder": {"name": "Elder", "image_src": "elder.png", "lines": ["Hi"]}}"#,
        )
        .expect("write");
        let loaded = load_npc_definitions(&path).expect("load").expect("present");
        assert_eq!(loaded.get("elder").map(|def| def.name.as_str()), Some("Elder"));
    }
}
