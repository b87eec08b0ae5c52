use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::map::MapData;
use crate::world::animation::{AnimationError, SpriteSheet};

mod names;
mod npc_defs;
mod tmx;

pub use names::{npc_definitions_name, validate_asset_name, AssetNameError};
pub use npc_defs::{
    load_npc_definitions, parse_npc_definitions, NpcDefinition, NpcDefinitionError,
    NpcDefinitions,
};
pub use tmx::{parse_tmx, SourceLocation, TmxError, TmxErrorCode};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid asset name '{name}': {source}")]
    InvalidName {
        name: String,
        #[source]
        source: AssetNameError,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse map '{map_id}': {source}")]
    Map {
        map_id: String,
        #[source]
        source: TmxError,
    },
    #[error(transparent)]
    NpcDefinitions(#[from] NpcDefinitionError),
    #[error("failed to read sprite sheet {path}: {source}")]
    SpriteImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    SpriteSheet(#[from] AnimationError),
    #[error("asset '{name}' is not available")]
    NotFound { name: String },
}

/// A map together with its optional per-map NPC definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct MapAssets {
    pub map: MapData,
    pub npc_definitions: Option<NpcDefinitions>,
}

/// Where the overworld reads maps, NPC definitions and sprite sheets from.
pub trait AssetSource {
    fn load_map(&self, map_id: &str) -> Result<MapAssets, AssetError>;

    fn sprite_sheet(&self, image_src: &str) -> Result<SpriteSheet, AssetError>;
}

/// Reads assets from a `data/` directory laid out as `maps/`, `npcs/` and
/// `npcs/sprites/`.
#[derive(Debug, Clone)]
pub struct FileAssets {
    data_dir: PathBuf,
}

impl FileAssets {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn map_path(&self, map_id: &str) -> Result<PathBuf, AssetError> {
        checked_name(map_id)?;
        Ok(self.data_dir.join("maps").join(map_id))
    }

    pub fn npc_definitions_path(&self, map_id: &str) -> Result<PathBuf, AssetError> {
        checked_name(map_id)?;
        Ok(self
            .data_dir
            .join("npcs")
            .join(npc_definitions_name(map_id)))
    }

    pub fn sprite_path(&self, image_src: &str) -> Result<PathBuf, AssetError> {
        checked_name(image_src)?;
        Ok(self.data_dir.join("npcs").join("sprites").join(image_src))
    }
}

impl AssetSource for FileAssets {
    fn load_map(&self, map_id: &str) -> Result<MapAssets, AssetError> {
        let path = self.map_path(map_id)?;
        let raw = fs::read_to_string(&path).map_err(|source| AssetError::Read {
            path: path.clone(),
            source,
        })?;
        let map = parse_tmx(&path, &raw).map_err(|source| AssetError::Map {
            map_id: map_id.to_string(),
            source,
        })?;
        let npc_path = self.npc_definitions_path(map_id)?;
        let npc_definitions = load_npc_definitions(&npc_path)?;
        debug!(
            map = map_id,
            npc_definitions = npc_definitions.as_ref().map_or(0, NpcDefinitions::len),
            "map_assets_read"
        );
        Ok(MapAssets {
            map,
            npc_definitions,
        })
    }

    fn sprite_sheet(&self, image_src: &str) -> Result<SpriteSheet, AssetError> {
        let path = self.sprite_path(image_src)?;
        let (width, height) =
            image::image_dimensions(&path).map_err(|source| AssetError::SpriteImage {
                path: path.clone(),
                source,
            })?;
        Ok(SpriteSheet::from_image_size(image_src, width, height)?)
    }
}

/// In-memory assets, for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    maps: HashMap<String, MapAssets>,
    sprite_sizes: HashMap<String, (u32, u32)>,
}

impl MemoryAssets {
    pub fn insert_map(
        &mut self,
        map_id: impl Into<String>,
        map: MapData,
        npc_definitions: Option<NpcDefinitions>,
    ) {
        self.maps.insert(
            map_id.into(),
            MapAssets {
                map,
                npc_definitions,
            },
        );
    }

    pub fn insert_sprite_sheet(&mut self, image_src: impl Into<String>, width: u32, height: u32) {
        self.sprite_sizes.insert(image_src.into(), (width, height));
    }
}

impl AssetSource for MemoryAssets {
    fn load_map(&self, map_id: &str) -> Result<MapAssets, AssetError> {
        checked_name(map_id)?;
        self.maps
            .get(map_id)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                name: map_id.to_string(),
            })
    }

    fn sprite_sheet(&self, image_src: &str) -> Result<SpriteSheet, AssetError> {
        checked_name(image_src)?;
        let (width, height) =
            self.sprite_sizes
                .get(image_src)
                .copied()
                .ok_or_else(|| AssetError::NotFound {
                    name: image_src.to_string(),
                })?;
        Ok(SpriteSheet::from_image_size(image_src, width, height)?)
    }
}

fn checked_name(name: &str) -> Result<(), AssetError> {
    validate_asset_name(name).map_err(|source| AssetError::InvalidName {
        name: name.to_string(),
        source,
    })
}
