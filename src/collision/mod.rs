//! Collision detection: broadphase candidate generation followed by
//! SAT narrowphase confirmation.

pub mod broadphase;
pub mod narrowphase;

use crate::world::World;
pub use narrowphase::Collision;

/// Runs the full detection pipeline over `bodies`: broadphase to narrow
/// down candidates, then narrowphase SAT to confirm and describe each
/// actual overlap.
pub fn collisions(bodies: &[crate::body::BodyId], world: &World) -> Vec<Collision> {
    puffin::profile_scope!("collision::collisions");

    let candidates = {
        puffin::profile_scope!("collision::broadphase");
        broadphase::find_candidates(bodies, world)
    };

    puffin::profile_scope!("collision::narrowphase");
    candidates
        .into_iter()
        .filter_map(|pair| narrowphase::collides(pair.a, pair.b, world))
        .collect()
}
