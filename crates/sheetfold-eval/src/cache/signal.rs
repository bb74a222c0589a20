//! The "recalculation caches are stale" notification.
//!
//! The owner of the recalculation epoch holds one [`RecalcSignal`] and emits
//! it whenever cached computations may be out of date (structural edits, a
//! new workbook). Listeners are held weakly so a dropped cache never keeps
//! itself alive through its subscription.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Token returned by [`RecalcSignal::connect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

pub trait RecalcListener {
    fn caches_cleared(&self);
}

#[derive(Default)]
pub struct RecalcSignal {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(HandlerId, Weak<dyn RecalcListener>)>>,
}

impl RecalcSignal {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn connect(&self, listener: Weak<dyn RecalcListener>) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Returns whether `id` was connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(h, _)| *h != id);
        listeners.len() != before
    }

    /// Notify every live listener. Listeners may disconnect (or connect)
    /// while being notified.
    pub fn emit(&self) {
        let snapshot: Vec<Weak<dyn RecalcListener>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|(_, l)| l.strong_count() > 0);
            listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in snapshot.iter().filter_map(Weak::upgrade) {
            listener.caches_cleared();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, l)| l.strong_count() > 0)
            .count()
    }
}
