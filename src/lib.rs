//! A 2D rigid-body physics core: Verlet integration, SAT collision
//! detection with a persistent contact cache, a sequential-impulse
//! velocity solver with warm starting and Coulomb friction, and a
//! Gauss-Seidel distance-constraint solver.
//!
//! [`engine::Engine`] is the entry point: build a [`world::World`]'s
//! worth of bodies and constraints with [`body`]/[`constraint`]/[`shapes`],
//! then call [`engine::Engine::update`] once per frame.

pub mod body;
pub mod collision;
pub mod composite;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod pair;
pub mod resolver;
pub mod shapes;
pub mod sleeping;
pub mod world;

pub use body::{Body, BodyId, BodyOptions};
pub use composite::{Composite, CompositeId};
pub use constraint::{Constraint, ConstraintId, ConstraintOptions};
pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, Result};
pub use world::World;
