//! The arena that owns every body, constraint, and composite.
//!
//! Grounded on `original_source/engine/core/engine.py`'s implicit
//! world/`Composite` root, reshaped around `slotmap` arenas the way
//! `tversteeg-castle-game` uses `hecs::World` as its single body store
//! in `physics::Physics`.

use slotmap::SlotMap;

use crate::body::{Body, BodyId, BodyOptions};
use crate::composite::{Composite, CompositeId};
use crate::constraint::{Constraint, ConstraintId, ConstraintOptions};
use crate::error::{EngineError, Result};

/// Owns every body, constraint, and composite, and the root composite
/// they all ultimately belong to.
pub struct World {
    pub(crate) bodies: SlotMap<BodyId, Body>,
    pub(crate) constraints: SlotMap<ConstraintId, Constraint>,
    pub(crate) composites: SlotMap<CompositeId, Composite>,
    /// The implicit top-level composite every directly-created body and
    /// constraint belongs to, mirroring `engine.world` in the reference
    /// engine.
    pub root: CompositeId,
}

impl World {
    /// Builds an empty world with just its root composite.
    pub fn new() -> Self {
        let mut composites = SlotMap::with_key();
        let root = composites.insert_with_key(Composite::new);

        Self {
            bodies: SlotMap::with_key(),
            constraints: SlotMap::with_key(),
            composites,
            root,
        }
    }

    /// Constructs a body and adds it to the root composite.
    pub fn create_body(&mut self, options: BodyOptions) -> Result<BodyId> {
        let body = Body::new(BodyId::default(), options)?;
        let id = self.bodies.insert(body);
        self.bodies[id].id = id;
        self.composites[self.root].bodies.push(id);
        Ok(id)
    }

    /// Constructs a constraint and adds it to the root composite.
    pub fn create_constraint(&mut self, options: ConstraintOptions) -> Result<ConstraintId> {
        if let Some(body_a) = options.body_a {
            if self.bodies.get(body_a).is_none() {
                return Err(EngineError::UnknownBody);
            }
        }
        if let Some(body_b) = options.body_b {
            if self.bodies.get(body_b).is_none() {
                return Err(EngineError::UnknownBody);
            }
        }

        let constraint = Constraint::new(ConstraintId::default(), options);
        let id = self.constraints.insert(constraint);
        self.constraints[id].id = id;
        self.composites[self.root].constraints.push(id);
        self.composites[self.root].set_modified(true);
        Ok(id)
    }

    /// Removes a body from the world and every composite that lists it.
    pub fn remove_body(&mut self, id: BodyId) -> Result<()> {
        if self.bodies.remove(id).is_none() {
            return Err(EngineError::UnknownBody);
        }
        for composite in self.composites.values_mut() {
            composite.bodies.retain(|b| *b != id);
            composite.set_modified(true);
        }
        Ok(())
    }

    /// Removes a constraint from the world and every composite that
    /// lists it.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<()> {
        if self.constraints.remove(id).is_none() {
            return Err(EngineError::UnknownConstraint);
        }
        for composite in self.composites.values_mut() {
            composite.constraints.retain(|c| *c != id);
            composite.set_modified(true);
        }
        Ok(())
    }

    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.bodies.get(id).ok_or(EngineError::UnknownBody)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body> {
        self.bodies.get_mut(id).ok_or(EngineError::UnknownBody)
    }

    pub fn constraint(&self, id: ConstraintId) -> Result<&Constraint> {
        self.constraints
            .get(id)
            .ok_or(EngineError::UnknownConstraint)
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> Result<&mut Constraint> {
        self.constraints
            .get_mut(id)
            .ok_or(EngineError::UnknownConstraint)
    }

    pub fn composite(&self, id: CompositeId) -> Result<&Composite> {
        self.composites
            .get(id)
            .ok_or(EngineError::UnknownComposite)
    }

    pub fn composite_mut(&mut self, id: CompositeId) -> Result<&mut Composite> {
        self.composites
            .get_mut(id)
            .ok_or(EngineError::UnknownComposite)
    }

    /// Every body in the world, flattened from the root composite down.
    pub fn all_bodies(&self) -> Vec<BodyId> {
        self.composites[self.root].all_bodies(&self.composites)
    }

    /// Every constraint in the world, flattened from the root composite
    /// down.
    pub fn all_constraints(&self) -> Vec<ConstraintId> {
        self.composites[self.root].all_constraints(&self.composites)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
