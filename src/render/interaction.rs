//! Click handler indirection.
//!
//! Node bindings live longer than one rebuild, while the click callback is
//! replaced on every rebuild. Bindings hold a clone of a [`HandlerCell`] and
//! always reach the handler that is current when the click happens.

use std::cell::RefCell;
use std::rc::Rc;

type Handler<A> = Rc<dyn Fn(&A)>;

/// Shared slot holding the current handler.
pub struct HandlerCell<A> {
    current: Rc<RefCell<Option<Handler<A>>>>,
}

impl<A> HandlerCell<A> {
    pub fn new() -> Self {
        Self {
            current: Rc::new(RefCell::new(None)),
        }
    }

    /// Replace the handler seen by every clone of this cell.
    pub fn set(&self, handler: impl Fn(&A) + 'static) {
        *self.current.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn clear(&self) {
        *self.current.borrow_mut() = None;
    }

    pub fn is_set(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Invoke the current handler. Returns `false` if none is installed.
    ///
    /// The handler may replace itself while running.
    pub fn call(&self, arg: &A) -> bool {
        let handler = self.current.borrow().clone();
        match handler {
            Some(handler) => {
                handler(arg);
                true
            }
            None => false,
        }
    }
}

impl<A> Clone for HandlerCell<A> {
    fn clone(&self) -> Self {
        Self {
            current: Rc::clone(&self.current),
        }
    }
}

impl<A> Default for HandlerCell<A> {
    fn default() -> Self {
        Self::new()
    }
}
