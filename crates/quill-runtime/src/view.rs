#![forbid(unsafe_code)]

//! Mirrored display nodes.
//!
//! An [`EntityView`] stands in for one DOM node that shows an entity's
//! counters. Several views may mirror one hash; each keeps the last state
//! the channel told it about, the way a custom element mirrors its
//! attributes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use quill_core::{CounterState, EntityReference};

use crate::channel::{CounterChannel, Subscription};

/// A display node bound to one entity through the counter channel.
#[derive(Debug)]
pub struct EntityView {
    entity: EntityReference,
    shown: Rc<RefCell<CounterState>>,
    renders: Rc<Cell<u64>>,
    _subscription: Subscription,
}

impl EntityView {
    /// Attach a view showing `initial` (the server-rendered attributes).
    ///
    /// `initial` seeds the channel when the entity is new on the page;
    /// otherwise the view adopts the live state.
    pub fn attach(
        channel: &CounterChannel,
        entity: EntityReference,
        initial: CounterState,
    ) -> Self {
        channel.seed(&entity.hash, initial);
        let current = channel.snapshot(entity.hash.as_str()).unwrap_or(initial);
        let shown = Rc::new(RefCell::new(current));
        let renders = Rc::new(Cell::new(0));
        let subscription = {
            let shown = Rc::clone(&shown);
            let renders = Rc::clone(&renders);
            channel.subscribe(&entity.hash, move |state: &CounterState| {
                *shown.borrow_mut() = *state;
                renders.set(renders.get() + 1);
            })
        };
        Self {
            entity,
            shown,
            renders,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn entity(&self) -> &EntityReference {
        &self.entity
    }

    /// What the node currently displays.
    #[must_use]
    pub fn shown(&self) -> CounterState {
        *self.shown.borrow()
    }

    /// How many times the node re-rendered since attach.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders.get()
    }
}
