//! Simple event bus for decoupled communication between the core and the view.
//!
//! The bus is single-threaded (WASM constraint) and uses interior mutability
//! via RefCell. Events are buffered and drained by the view on each tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use companion_types::event::CompanionEvent;

/// Shared event bus: clone-cheap via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<CompanionEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Publish an event.
    pub fn emit(&self, event: CompanionEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<CompanionEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
