//! Minimal pub/sub used by [`crate::engine`] to announce step lifecycle
//! and collision lifecycle moments.
//!
//! `original_source` has no standalone `events.py` — this is inferred
//! purely from how `engine.py` calls `Events.trigger(engine, 'afterUpdate', ...)`
//! at fixed points in `update`. Rather than porting Matter.js's
//! named-event-on-an-object-bag pattern (which has no clean static
//! typing in Rust), every listener here receives every event as a
//! single enum and filters what it cares about — simpler, and every
//! variant below corresponds to one of the triggers actually called
//! from `engine.py`.

use crate::pair::PairId;

/// One moment in the simulation lifecycle a listener might care about.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Fired once per `update`, before any integration happens.
    BeforeUpdate { timestamp: f64 },
    /// Fired once per `update`, after velocities/forces are cleared.
    AfterUpdate { timestamp: f64 },
    /// Pairs that newly became active this step.
    CollisionStart { pairs: Vec<PairId> },
    /// Pairs that stayed active this step.
    CollisionActive { pairs: Vec<PairId> },
    /// Pairs that stopped being active this step.
    CollisionEnd { pairs: Vec<PairId> },
}

/// Holds every registered listener and fans events out to all of them.
#[derive(Default)]
pub struct Events {
    listeners: Vec<Box<dyn FnMut(&EngineEvent)>>,
}

impl Events {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Registers a listener that will see every future event.
    pub fn on(&mut self, listener: impl FnMut(&EngineEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drops every registered listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Fans `event` out to every listener in registration order.
    pub fn trigger(&mut self, event: EngineEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for Events {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Events")
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_see_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut events = Events::new();

        let seen_clone = Rc::clone(&seen);
        events.on(move |event| {
            if let EngineEvent::BeforeUpdate { timestamp } = event {
                seen_clone.borrow_mut().push(*timestamp);
            }
        });

        events.trigger(EngineEvent::BeforeUpdate { timestamp: 16.6 });
        events.trigger(EngineEvent::AfterUpdate { timestamp: 16.6 });
        events.trigger(EngineEvent::BeforeUpdate { timestamp: 33.2 });

        assert_eq!(*seen.borrow(), vec![16.6, 33.2]);
    }

    #[test]
    fn clear_removes_all_listeners() {
        let seen = Rc::new(RefCell::new(0));
        let mut events = Events::new();

        let seen_clone = Rc::clone(&seen);
        events.on(move |_| {
            *seen_clone.borrow_mut() += 1;
        });
        events.clear();
        events.trigger(EngineEvent::AfterUpdate { timestamp: 0.0 });

        assert_eq!(*seen.borrow(), 0);
    }
}
