//! Hierarchical grouping of bodies, constraints, and nested composites.
//!
//! Grounded on `original_source/engine/body/composite.py`. Ownership is
//! tracked purely through `Composite::bodies`/`constraints`/`composites`
//! — never through a `parent` pointer stored on the body itself, which
//! in the reference engine is reserved for compound-body parent/child
//! relationships (see `body.rs`'s `Part` embedding).

use slotmap::{new_key_type, SlotMap};

use crate::body::BodyId;
use crate::constraint::ConstraintId;

new_key_type! {
    /// Stable handle to a [`Composite`] living in a [`crate::World`].
    pub struct CompositeId;
}

/// Any of the three object kinds a composite can contain, used at the
/// `add`/`remove`/`move_object` boundary where the reference engine
/// dispatches on a `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Body(BodyId),
    Constraint(ConstraintId),
    Composite(CompositeId),
}

/// A named group of bodies, constraints, and nested composites.
///
/// `all_bodies`/`all_constraints`/`all_composites` walk the full
/// composite/sub-composite tree on every call; there is no cached
/// flattening. `modified` is tracked (and flipped by `add`/`remove`/
/// `set_modified`) but nothing currently reads it back — the reference
/// engine's `cache.allBodies` invalidation this mirrors in intent isn't
/// wired up to an actual cache here.
#[derive(Debug, Clone)]
pub struct Composite {
    pub label: String,
    pub bodies: Vec<BodyId>,
    pub constraints: Vec<ConstraintId>,
    pub composites: Vec<CompositeId>,
    modified: bool,
}

impl Composite {
    pub(crate) fn new(_id: CompositeId) -> Self {
        Self {
            label: "Composite".into(),
            bodies: Vec::new(),
            constraints: Vec::new(),
            composites: Vec::new(),
            modified: true,
        }
    }

    /// Marks this composite's cached flattening stale (or fresh).
    pub fn set_modified(&mut self, is_modified: bool) {
        self.modified = is_modified;
    }

    /// Adds an item directly to this composite (does not recurse into
    /// nested composites — callers that need deep add should route
    /// through [`World`] helpers that know the arena).
    pub fn add(&mut self, item: Item) {
        match item {
            Item::Body(id) => {
                if !self.bodies.contains(&id) {
                    self.bodies.push(id);
                }
            }
            Item::Constraint(id) => {
                if !self.constraints.contains(&id) {
                    self.constraints.push(id);
                }
            }
            Item::Composite(id) => {
                if !self.composites.contains(&id) {
                    self.composites.push(id);
                }
            }
        }
        self.modified = true;
    }

    /// Removes an item directly from this composite.
    pub fn remove(&mut self, item: Item) {
        match item {
            Item::Body(id) => self.bodies.retain(|b| *b != id),
            Item::Constraint(id) => self.constraints.retain(|c| *c != id),
            Item::Composite(id) => self.composites.retain(|c| *c != id),
        }
        self.modified = true;
    }

    /// Recursively flattens every body in this composite and its
    /// nested composites.
    pub fn all_bodies(&self, arena: &SlotMap<CompositeId, Composite>) -> Vec<BodyId> {
        let mut out = self.bodies.clone();
        for &child_id in &self.composites {
            if let Some(child) = arena.get(child_id) {
                out.extend(child.all_bodies(arena));
            }
        }
        out
    }

    /// Recursively flattens every constraint in this composite and its
    /// nested composites.
    pub fn all_constraints(&self, arena: &SlotMap<CompositeId, Composite>) -> Vec<ConstraintId> {
        let mut out = self.constraints.clone();
        for &child_id in &self.composites {
            if let Some(child) = arena.get(child_id) {
                out.extend(child.all_constraints(arena));
            }
        }
        out
    }

    /// Recursively flattens every nested composite id, including
    /// `self` is excluded (only descendants).
    pub fn all_composites(&self, arena: &SlotMap<CompositeId, Composite>) -> Vec<CompositeId> {
        let mut out = self.composites.clone();
        for &child_id in &self.composites {
            if let Some(child) = arena.get(child_id) {
                out.extend(child.all_composites(arena));
            }
        }
        out
    }
}
