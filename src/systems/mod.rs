mod ai;
mod broadphase;
mod collision;
mod combat;
mod physics;
mod player;
mod resolve;

pub use ai::ai_system;
pub use broadphase::{SpatialHash, DEFAULT_CELL_SIZE};
pub use collision::collision_system;
pub use combat::{combat_system, HIT_IFRAMES};
pub use physics::physics_system;
pub use player::{player_system, MovementConfig};
pub use resolve::{resolve_contacts, GROUND_TOLERANCE, ONE_WAY_TAG, SKIN_EPSILON};
