//! Collision dispatch: fans solver contact events out to registered listeners.
//!
//! Listeners are registered per geometry and are not owned by the shapes; the
//! same listener may be registered on several geometries. Notification is
//! symmetric but listener sets are independent: a listener registered only on
//! geometry A sees `(A, B)`, never `(B, A)`. The live collision count tracks
//! currently overlapping fixture pairs, incremented once per begin event and
//! decremented once per end event, regardless of how many listeners fire.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::physics::ContactEvent;
use crate::scene::GeometryId;

/// Callback invoked when a geometry it is registered on starts touching
/// another geometry.
pub trait CollisionListener {
    fn collided(&mut self, own: GeometryId, other: GeometryId);
}

/// Shared listener handle. Dispatch is single-threaded and synchronous within
/// the simulation step.
pub type SharedListener = Rc<RefCell<dyn CollisionListener>>;

/// Per-geometry listener registry plus the live collision counter.
#[derive(Default)]
pub struct CollisionDispatcher {
    listeners: HashMap<GeometryId, Vec<SharedListener>>,
    collisions: u32,
}

impl CollisionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener on one geometry.
    pub fn register(&mut self, geometry: GeometryId, listener: SharedListener) {
        self.listeners.entry(geometry).or_default().push(listener);
    }

    /// Removes a previously registered listener from one geometry.
    pub fn unregister(&mut self, geometry: GeometryId, listener: &SharedListener) {
        if let Some(list) = self.listeners.get_mut(&geometry) {
            list.retain(|l| !Rc::ptr_eq(l, listener));
        }
    }

    /// Number of currently overlapping fixture pairs.
    pub fn collision_count(&self) -> u32 {
        self.collisions
    }

    /// Drops all registrations and zeroes the counter. Called on scene load.
    pub fn reset(&mut self) {
        self.listeners.clear();
        self.collisions = 0;
    }

    /// Processes the contact events of one solver step in order.
    pub fn handle(&mut self, events: &[ContactEvent]) {
        for event in events {
            match *event {
                ContactEvent::Began(a, b) => {
                    self.notify(a, b);
                    self.notify(b, a);
                    self.collisions += 1;
                }
                // The solver guarantees a matching begin for every end, so
                // the counter cannot underflow for well-formed sequences.
                ContactEvent::Ended(_, _) => {
                    self.collisions = self.collisions.saturating_sub(1);
                }
            }
        }
    }

    fn notify(&mut self, own: GeometryId, other: GeometryId) {
        if let Some(list) = self.listeners.get(&own) {
            for listener in list {
                listener.borrow_mut().collided(own, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(GeometryId, GeometryId)>,
    }

    impl CollisionListener for Recorder {
        fn collided(&mut self, own: GeometryId, other: GeometryId) {
            self.seen.push((own, other));
        }
    }

    #[test]
    fn listener_sees_own_geometry_first() {
        let mut dispatcher = CollisionDispatcher::new();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        dispatcher.register(GeometryId(1), recorder.clone());

        dispatcher.handle(&[ContactEvent::Began(GeometryId(1), GeometryId(2))]);
        dispatcher.handle(&[ContactEvent::Began(GeometryId(3), GeometryId(1))]);

        let seen = &recorder.borrow().seen;
        assert_eq!(
            *seen,
            vec![
                (GeometryId(1), GeometryId(2)),
                (GeometryId(1), GeometryId(3)),
            ]
        );
    }

    #[test]
    fn counter_tracks_begin_minus_end() {
        let mut dispatcher = CollisionDispatcher::new();
        let a = GeometryId(1);
        let b = GeometryId(2);
        let c = GeometryId(3);

        dispatcher.handle(&[ContactEvent::Began(a, b), ContactEvent::Began(a, c)]);
        assert_eq!(dispatcher.collision_count(), 2);
        dispatcher.handle(&[ContactEvent::Ended(a, b)]);
        assert_eq!(dispatcher.collision_count(), 1);
        dispatcher.handle(&[ContactEvent::Ended(a, c)]);
        assert_eq!(dispatcher.collision_count(), 0);
    }

    #[test]
    fn counted_once_per_pair_not_per_listener() {
        let mut dispatcher = CollisionDispatcher::new();
        let first = Rc::new(RefCell::new(Recorder::default()));
        let second = Rc::new(RefCell::new(Recorder::default()));
        dispatcher.register(GeometryId(1), first);
        dispatcher.register(GeometryId(1), second);
        dispatcher.register(GeometryId(2), Rc::new(RefCell::new(Recorder::default())));

        dispatcher.handle(&[ContactEvent::Began(GeometryId(1), GeometryId(2))]);
        assert_eq!(dispatcher.collision_count(), 1);
    }

    #[test]
    fn unregister_stops_notifications() {
        let mut dispatcher = CollisionDispatcher::new();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let shared: SharedListener = recorder.clone();
        dispatcher.register(GeometryId(1), shared.clone());
        dispatcher.unregister(GeometryId(1), &shared);

        dispatcher.handle(&[ContactEvent::Began(GeometryId(1), GeometryId(2))]);
        assert_eq!(dispatcher.collision_count(), 1);
        assert!(recorder.borrow().seen.is_empty());
    }
}
