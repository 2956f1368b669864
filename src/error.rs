//! The closed error taxonomy of the engine.
//!
//! Most degenerate conditions the solver runs into (coincident constraint
//! endpoints, zero-overlap SAT axes, a constraint between two static
//! bodies) are handled silently per the design notes — they are not
//! programmer mistakes, just uninteresting physical configurations.
//! What's left here is genuinely exceptional: bad geometry at
//! construction time, and references to ids the world doesn't know
//! about.

use thiserror::Error;

/// Errors the engine's public API can return.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A body or part was constructed from geometry that cannot be
    /// integrated: fewer than 3 vertices, or a polygon with zero area.
    #[error("invalid geometry: {reason}")]
    InvalidGeometry {
        /// Human-readable reason, e.g. "fewer than 3 vertices".
        reason: String,
    },

    /// A `BodyId` was passed to an operation but is no longer (or was
    /// never) present in the world.
    #[error("unknown body id")]
    UnknownBody,

    /// A `ConstraintId` was passed to an operation but is no longer (or
    /// was never) present in the world.
    #[error("unknown constraint id")]
    UnknownConstraint,

    /// A `CompositeId` was passed to an operation but is no longer (or
    /// was never) present in the world.
    #[error("unknown composite id")]
    UnknownComposite,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
