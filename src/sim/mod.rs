//! Deterministic particle simulation
//!
//! All physics lives here. This module must stay pure and deterministic:
//! - Fixed timestep for the body pipeline
//! - Seeded RNG only
//! - Stable iteration order (by body index, pairs by overlap then index)
//! - No rendering, audio or platform dependencies

pub mod body;
pub mod boundary;
pub mod collision;
pub mod modes;
pub mod sleep;
pub mod spatial;
pub mod state;
pub mod tick;
pub mod wall;
pub mod worms;

pub use body::{Body, BodyId, BodyKind};
pub use boundary::{Arena, BoundaryPolicy, Rect, WallResponse, resolve_boundary};
pub use collision::{ContactEvent, ContactKind, SolverParams, resolve_ball_collisions};
pub use modes::{Mode, ModeId, PhysicsParams};
pub use sleep::{update_sleep, wake_near};
pub use spatial::{CollisionPair, SpatialHash};
pub use state::Simulation;
pub use tick::{FrameClock, FrameReport, TickInput, tick};
pub use wall::{Edge, RubberWalls};
pub use worms::{Organism, WormWorld};
