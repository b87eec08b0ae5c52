pub mod animation;
mod entity;
mod npc;
mod objects;
mod player;

pub use animation::{AnimationError, AnimationState, Direction, SpriteSheet, WalkCycles};
pub use entity::{Entity, SpriteFrame, FEET_HEIGHT_PX};
pub use npc::{Npc, NPC_MOVE_SPEED};
pub use objects::{Item, PopulateError, Portal, Sign, WorldObject, WorldObjectIndex};
pub use player::{MovementFlags, MovementInput, PlayerCharacter};
