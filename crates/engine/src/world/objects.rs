use thiserror::Error;
use tracing::debug;

use crate::assets::{AssetError, AssetSource, NpcDefinitions};
use crate::geometry::{Rect, Vec2};
use crate::map::{MapData, MapObject};

use super::animation::AnimationError;
use super::npc::Npc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    pub rect: Rect,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sign {
    pub rect: Rect,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub rect: Rect,
    pub item_name: String,
}

/// A map object record after classification by its `name` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldObject {
    Blocker(Rect),
    Portal(Portal),
    Sign(Sign),
    Item(Item),
    NpcSpawn { rect: Rect, definition: String },
    PlayerSpawn(Rect),
}

impl WorldObject {
    /// Returns `None` for tags the overworld does not know.
    pub fn classify(record: &MapObject) -> Option<Self> {
        let rect = record.rect();
        let payload = record.kind.clone();
        let object = match record.name.as_str() {
            "blocker" => Self::Blocker(rect),
            "portal" => Self::Portal(Portal {
                rect,
                destination: payload,
            }),
            "sign" => Self::Sign(Sign {
                rect,
                message: payload,
            }),
            "item" => Self::Item(Item {
                rect,
                item_name: payload,
            }),
            "npc" => Self::NpcSpawn {
                rect,
                definition: payload,
            },
            "player" => Self::PlayerSpawn(rect),
            _ => return None,
        };
        Some(object)
    }
}

#[derive(Debug, Error)]
pub enum PopulateError {
    #[error("npc object references unknown definition '{key}'")]
    UnknownNpcDefinition { key: String },
    #[error("failed to load sprite sheet for npc '{key}': {source}")]
    NpcSprite {
        key: String,
        #[source]
        source: AssetError,
    },
    #[error("npc '{key}' has an invalid sprite sheet: {source}")]
    NpcAnimation {
        key: String,
        #[source]
        source: AnimationError,
    },
}

/// Queryable world objects of one loaded map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldObjectIndex {
    pub blockers: Vec<Rect>,
    pub portals: Vec<Portal>,
    pub signs: Vec<Sign>,
    pub items: Vec<Item>,
    pub npcs: Vec<Npc>,
    pub player_spawn: Option<(i32, i32)>,
}

impl WorldObjectIndex {
    /// Builds the index from every object record of `map`.
    ///
    /// NPC spawns are skipped when the map has no definitions file; with a
    /// file present, an unknown key is an error. The last `player` object
    /// sets the spawn point.
    pub fn populate(
        map: &MapData,
        npc_definitions: Option<&NpcDefinitions>,
        assets: &dyn AssetSource,
    ) -> Result<Self, PopulateError> {
        let mut index = Self::default();
        let mut skipped_npcs = 0usize;
        for record in &map.objects {
            let Some(object) = WorldObject::classify(record) else {
                continue;
            };
            match object {
                WorldObject::Blocker(rect) => index.blockers.push(rect),
                WorldObject::Portal(portal) => index.portals.push(portal),
                WorldObject::Sign(sign) => index.signs.push(sign),
                WorldObject::Item(item) => index.items.push(item),
                WorldObject::PlayerSpawn(rect) => index.player_spawn = Some(rect.center()),
                WorldObject::NpcSpawn { rect, definition } => {
                    let Some(definitions) = npc_definitions else {
                        skipped_npcs += 1;
                        continue;
                    };
                    index
                        .npcs
                        .push(spawn_npc(rect, &definition, definitions, assets)?);
                }
            }
        }

        if skipped_npcs > 0 {
            debug!(skipped = skipped_npcs, "npc_spawns_skipped_without_definitions");
        }
        Ok(index)
    }

    pub fn player_spawn_point(&self) -> Option<Vec2> {
        self.player_spawn
            .map(|(x, y)| Vec2::new(x as f32, y as f32))
    }
}

fn spawn_npc(
    rect: Rect,
    key: &str,
    definitions: &NpcDefinitions,
    assets: &dyn AssetSource,
) -> Result<Npc, PopulateError> {
    let definition =
        definitions
            .get(key)
            .ok_or_else(|| PopulateError::UnknownNpcDefinition {
                key: key.to_string(),
            })?;
    let sheet = assets
        .sprite_sheet(&definition.image_src)
        .map_err(|source| PopulateError::NpcSprite {
            key: key.to_string(),
            source,
        })?;
    let (center_x, center_y) = rect.center();
    Npc::new(
        definition.name.clone(),
        sheet,
        definition.direction,
        definition.moving_direction,
        definition.lines.clone(),
        Vec2::new(center_x as f32, center_y as f32),
    )
    .map_err(|source| PopulateError::NpcAnimation {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MemoryAssets, NpcDefinition};
    use crate::world::animation::Direction;

    fn object(name: &str, kind: &str, x: f32, y: f32, w: f32, h: f32) -> MapObject {
        MapObject {
            name: name.to_string(),
            kind: kind.to_string(),
            x,
            y,
            width: w,
            height: h,
        }
    }

    fn map(objects: Vec<MapObject>) -> MapData {
        MapData {
            width_tiles: 20,
            height_tiles: 20,
            tile_width: 16,
            tile_height: 16,
            tilesets: Vec::new(),
            layers: Vec::new(),
            objects,
        }
    }

    fn elder_definitions() -> NpcDefinitions {
        NpcDefinitions::from_entries([(
            "elder".to_string(),
            NpcDefinition {
                name: "Elder".to_string(),
                image_src: "elder.png".to_string(),
                direction: Direction::Left,
                moving_direction: None,
                lines: vec!["Welcome, traveller.".to_string()],
            },
        )])
    }

    fn assets() -> MemoryAssets {
        let mut assets = MemoryAssets::default();
        assets.insert_sprite_sheet("elder.png", 256, 128);
        assets
    }

    #[test]
    fn classifies_every_known_tag() {
        let map = map(vec![
            object("blocker", "", 0.0, 0.0, 16.0, 16.0),
            object("portal", "map2.tmx", 32.0, 0.0, 16.0, 16.0),
            object("sign", "Welcome", 64.0, 0.0, 16.0, 16.0),
            object("item", "potion", 96.0, 0.0, 16.0, 16.0),
            object("player", "", 100.0, 100.0, 10.0, 20.0),
        ]);
        let index = WorldObjectIndex::populate(&map, None, &assets()).expect("populate");

        assert_eq!(index.blockers, vec![Rect::new(0, 0, 16, 16)]);
        assert_eq!(index.portals[0].destination, "map2.tmx");
        assert_eq!(index.signs[0].message, "Welcome");
        assert_eq!(index.items[0].item_name, "potion");
        assert_eq!(index.player_spawn, Some((105, 110)));
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let map = map(vec![
            object("chest", "gold", 0.0, 0.0, 16.0, 16.0),
            object("", "", 0.0, 0.0, 16.0, 16.0),
        ]);
        let index = WorldObjectIndex::populate(&map, None, &assets()).expect("populate");
        assert_eq!(index, WorldObjectIndex::default());
    }

    #[test]
    fn last_player_spawn_wins() {
        let map = map(vec![
            object("player", "", 0.0, 0.0, 10.0, 10.0),
            object("player", "", 200.0, 40.0, 10.0, 10.0),
        ]);
        let index = WorldObjectIndex::populate(&map, None, &assets()).expect("populate");
        assert_eq!(index.player_spawn_point(), Some(Vec2::new(205.0, 45.0)));
    }

    #[test]
    fn npc_spawns_skipped_without_definitions_file() {
        let map = map(vec![object("npc", "elder", 0.0, 0.0, 32.0, 32.0)]);
        let index = WorldObjectIndex::populate(&map, None, &assets()).expect("populate");
        assert!(index.npcs.is_empty());
    }

    #[test]
    fn npc_placed_at_object_centre_with_definition_fields() {
        let map = map(vec![object("npc", "elder", 100.0, 60.0, 32.0, 16.0)]);
        let definitions = elder_definitions();
        let index =
            WorldObjectIndex::populate(&map, Some(&definitions), &assets()).expect("populate");

        let npc = &index.npcs[0];
        assert_eq!(npc.name(), "Elder");
        assert_eq!(npc.entity().position(), Vec2::new(116.0, 68.0));
        assert_eq!(npc.entity().direction(), Direction::Left);
        assert_eq!(npc.moving_direction(), None);
    }

    #[test]
    fn unknown_npc_key_is_an_error() {
        let map = map(vec![object("npc", "ghost", 0.0, 0.0, 32.0, 32.0)]);
        let definitions = elder_definitions();
        let err = WorldObjectIndex::populate(&map, Some(&definitions), &assets())
            .expect_err("unknown key");
        assert!(matches!(
            err,
            PopulateError::UnknownNpcDefinition { ref key } if key == "ghost"
        ));
    }

    #[test]
    fn missing_npc_sprite_is_an_error() {
        let map = map(vec![object("npc", "elder", 0.0, 0.0, 32.0, 32.0)]);
        let definitions = elder_definitions();
        let err = WorldObjectIndex::populate(&map, Some(&definitions), &MemoryAssets::default())
            .expect_err("missing sprite");
        assert!(matches!(err, PopulateError::NpcSprite { .. }));
    }
}
