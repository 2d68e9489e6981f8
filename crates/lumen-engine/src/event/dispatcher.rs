use super::types::{Event, EventKind, EventType};

type Handler<C> = Box<dyn FnMut(&mut C, &Event)>;

/// Routes events to at most one handler per [`EventKind`].
///
/// Handlers receive a `&mut C` supplied at dispatch time, so they can mutate
/// application state without capturing it. Registering a second handler for
/// the same kind replaces the first.
pub struct EventDispatcher<C = ()> {
    handlers: [Option<Handler<C>>; EventKind::COUNT],
}

impl<C> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EventDispatcher<C> {
    pub fn new() -> Self {
        Self {
            handlers: std::array::from_fn(|_| None),
        }
    }

    /// Installs `handler` for events of type `E`.
    ///
    /// Returns `true` when a previously registered handler was replaced.
    pub fn add_listener<E, F>(&mut self, mut handler: F) -> bool
    where
        E: EventType,
        F: FnMut(&mut C, &E) + 'static,
    {
        let slot = &mut self.handlers[E::KIND.index()];
        let replaced = slot.is_some();
        if replaced {
            log::debug!("replacing {} listener", E::KIND);
        }

        *slot = Some(Box::new(move |ctx: &mut C, event: &Event| {
            if let Some(payload) = E::from_event(event) {
                handler(ctx, payload);
            }
        }));

        replaced
    }

    /// Removes the handler for `kind`. Returns `true` if one was registered.
    pub fn remove_listener(&mut self, kind: EventKind) -> bool {
        self.handlers[kind.index()].take().is_some()
    }

    pub fn has_listener(&self, kind: EventKind) -> bool {
        self.handlers[kind.index()].is_some()
    }

    /// Invokes the handler registered for `event.kind()`, if any.
    pub fn dispatch(&mut self, ctx: &mut C, event: &Event) {
        if let Some(handler) = self.handlers[event.kind().index()].as_mut() {
            handler(ctx, event);
        }
    }
}
