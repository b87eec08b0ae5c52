use thiserror::Error;
use tracing::{debug, info};

use crate::assets::{AssetError, AssetSource};
use crate::camera::{Camera, Viewport};
use crate::geometry::Vec2;
use crate::map::MapData;
use crate::world::{
    AnimationError, MovementInput, Npc, PlayerCharacter, PopulateError, WorldObjectIndex,
    NPC_MOVE_SPEED,
};

mod dialog;
mod draw;
mod interaction;

pub use dialog::{SignDialog, DIALOG_BORDER_PX};
pub use draw::{DialogDraw, DrawList, SpriteDraw};
pub use interaction::{detect, CollisionType, Interaction};

pub const DEFAULT_ZOOM: f32 = 1.5;
pub const DEFAULT_PLAYER_SPEED: f32 = 100.0;
pub const DEFAULT_RUN_MULTIPLIER: f32 = 2.0;
pub const DEFAULT_PLAYER_SPRITE: &str = "male_sprite_model.png";

#[derive(Debug, Clone, PartialEq)]
pub struct OverworldConfig {
    pub zoom: f32,
    /// Pixels per second.
    pub player_speed: f32,
    pub run_multiplier: f32,
    pub npc_speed: f32,
    pub player_sprite: String,
    pub viewport: Viewport,
}

impl Default for OverworldConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            player_speed: DEFAULT_PLAYER_SPEED,
            run_multiplier: DEFAULT_RUN_MULTIPLIER,
            npc_speed: NPC_MOVE_SPEED,
            player_sprite: DEFAULT_PLAYER_SPRITE.to_string(),
            viewport: Viewport::new(800, 600),
        }
    }
}

#[derive(Debug, Error)]
pub enum OverworldError {
    #[error("failed to load player sprite '{image_src}': {source}")]
    PlayerSprite {
        image_src: String,
        #[source]
        source: AssetError,
    },
    #[error("player sprite is unusable: {0}")]
    PlayerAnimation(#[source] AnimationError),
    #[error("failed to load map '{map_id}': {source}")]
    MapAssets {
        map_id: String,
        #[source]
        source: AssetError,
    },
    #[error("failed to populate map '{map_id}': {source}")]
    Populate {
        map_id: String,
        #[source]
        source: PopulateError,
    },
    #[error("map '{map_id}' has no player spawn object")]
    MissingSpawn { map_id: String },
}

/// A map that finished loading but is not mounted yet.
struct PreparedMap {
    map_id: String,
    map: MapData,
    index: WorldObjectIndex,
    spawn: Vec2,
}

/// Owns the mounted map, the player, the NPC roster and the interaction
/// state, and drives them once per simulation tick.
pub struct Overworld<A: AssetSource> {
    config: OverworldConfig,
    assets: A,
    map_id: String,
    map: MapData,
    camera: Camera,
    index: WorldObjectIndex,
    player: PlayerCharacter,
    current_interaction: Option<Interaction>,
    is_interacting: bool,
    dialog: Option<SignDialog>,
}

impl<A: AssetSource> Overworld<A> {
    pub fn new(
        config: OverworldConfig,
        assets: A,
        start_map: &str,
    ) -> Result<Self, OverworldError> {
        let sheet = assets
            .sprite_sheet(&config.player_sprite)
            .map_err(|source| OverworldError::PlayerSprite {
                image_src: config.player_sprite.clone(),
                source,
            })?;
        let player = PlayerCharacter::new(sheet).map_err(OverworldError::PlayerAnimation)?;
        let prepared = prepare_map(&assets, start_map)?;

        let mut overworld = Self {
            camera: Camera::new((0, 0), config.viewport, config.zoom),
            config,
            assets,
            map_id: String::new(),
            map: MapData::default(),
            index: WorldObjectIndex::default(),
            player,
            current_interaction: None,
            is_interacting: false,
            dialog: None,
        };
        overworld.mount(prepared);
        Ok(overworld)
    }

    pub fn config(&self) -> &OverworldConfig {
        &self.config
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn map(&self) -> &MapData {
        &self.map
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn index(&self) -> &WorldObjectIndex {
        &self.index
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.index.npcs
    }

    pub fn player(&self) -> &PlayerCharacter {
        &self.player
    }

    pub fn collision_type(&self) -> CollisionType {
        self.current_interaction
            .map_or(CollisionType::None, Interaction::collision_type)
    }

    pub fn current_interaction(&self) -> Option<Interaction> {
        self.current_interaction
    }

    pub fn is_interacting(&self) -> bool {
        self.is_interacting
    }

    pub fn dialog(&self) -> Option<&SignDialog> {
        self.dialog.as_ref()
    }

    pub fn handle_movement(&mut self, input: MovementInput) {
        self.player.apply_input(
            input,
            self.config.player_speed,
            self.config.run_multiplier,
        );
    }

    /// Advances one tick. Entering a portal mounts its destination and ends
    /// the tick before blockers are checked.
    pub fn update(&mut self, dt: f32) -> Result<(), OverworldError> {
        let moving = self.player.is_moving();
        self.player.entity_mut().set_paused(!moving);
        for npc in &mut self.index.npcs {
            npc.apply_script(self.config.npc_speed);
        }

        self.player.entity_mut().tick(dt);
        for npc in &mut self.index.npcs {
            npc.entity_mut().tick(dt);
        }

        self.current_interaction = detect(
            self.player.entity().rect(),
            &self.index.signs,
            &self.index.portals,
            &self.index.items,
        );
        match self.current_interaction {
            Some(Interaction::Portal(portal)) => {
                if let Some(destination) = self
                    .index
                    .portals
                    .get(portal)
                    .map(|portal| portal.destination.clone())
                {
                    info!(from = %self.map_id, to = %destination, "portal_entered");
                    return self.load_new_map(&destination);
                }
            }
            None => {
                if self.is_interacting {
                    debug!(map = %self.map_id, "interaction_left");
                }
                self.is_interacting = false;
                self.dialog = None;
            }
            Some(_) => {}
        }

        if self
            .player
            .entity()
            .feet()
            .first_intersecting(&self.index.blockers)
            .is_some()
        {
            self.player.entity_mut().revert_last_move();
        }
        Ok(())
    }

    /// Opens or closes the sign the player stands on. Does nothing elsewhere.
    pub fn interact(&mut self) {
        let Some(Interaction::Sign(sign)) = self.current_interaction else {
            return;
        };
        if self.is_interacting {
            self.is_interacting = false;
            self.dialog = None;
            debug!(map = %self.map_id, "sign_closed");
        } else if let Some(sign) = self.index.signs.get(sign) {
            self.is_interacting = true;
            self.dialog = Some(SignDialog::new(sign.message.clone(), self.config.viewport));
            info!(map = %self.map_id, message_len = sign.message.len(), "sign_opened");
        }
    }

    /// Replaces everything but the player with `map_id`. The current state is
    /// left untouched when loading fails.
    pub fn load_new_map(&mut self, map_id: &str) -> Result<(), OverworldError> {
        let prepared = prepare_map(&self.assets, map_id)?;
        self.mount(prepared);
        Ok(())
    }

    pub fn draw(&mut self) -> DrawList {
        let (center_x, center_y) = self.player.entity().rect().center();
        self.camera
            .center_on(Vec2::new(center_x as f32, center_y as f32));

        let layer = self.map.player_layer_index();
        let mut sprites = Vec::with_capacity(self.index.npcs.len() + 1);
        sprites.push(SpriteDraw::for_entity(
            self.player.entity(),
            layer,
            &self.camera,
        ));
        sprites.extend(
            self.index
                .npcs
                .iter()
                .map(|npc| SpriteDraw::for_entity(npc.entity(), layer, &self.camera)),
        );
        draw::sort_sprites(&mut sprites);

        let dialog = self
            .dialog
            .as_ref()
            .filter(|_| self.is_interacting)
            .map(|dialog| DialogDraw {
                rect: dialog.screen_rect(self.config.viewport),
                message: dialog.message().to_string(),
            });

        DrawList {
            camera: self.camera,
            player_layer: layer,
            sprites,
            dialog,
        }
    }

    fn mount(&mut self, prepared: PreparedMap) {
        let PreparedMap {
            map_id,
            map,
            index,
            spawn,
        } = prepared;

        self.camera = Camera::new(map.pixel_size(), self.config.viewport, self.config.zoom);
        self.player.entity_mut().set_position(spawn);
        self.player.reset_movement();
        self.current_interaction = None;
        self.is_interacting = false;
        self.dialog = None;

        info!(
            map = %map_id,
            width_px = map.pixel_size().0,
            height_px = map.pixel_size().1,
            blockers = index.blockers.len(),
            portals = index.portals.len(),
            signs = index.signs.len(),
            items = index.items.len(),
            npcs = index.npcs.len(),
            "map_loaded"
        );
        self.map_id = map_id;
        self.map = map;
        self.index = index;
    }
}

fn prepare_map(assets: &dyn AssetSource, map_id: &str) -> Result<PreparedMap, OverworldError> {
    let loaded = assets
        .load_map(map_id)
        .map_err(|source| OverworldError::MapAssets {
            map_id: map_id.to_string(),
            source,
        })?;
    let index = WorldObjectIndex::populate(&loaded.map, loaded.npc_definitions.as_ref(), assets)
        .map_err(|source| OverworldError::Populate {
            map_id: map_id.to_string(),
            source,
        })?;
    let spawn = index
        .player_spawn_point()
        .ok_or_else(|| OverworldError::MissingSpawn {
            map_id: map_id.to_string(),
        })?;
    Ok(PreparedMap {
        map_id: map_id.to_string(),
        map: loaded.map,
        index,
        spawn,
    })
}
