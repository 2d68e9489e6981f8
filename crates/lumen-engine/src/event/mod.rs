//! Typed event model.
//!
//! Platform notifications are translated into a closed [`Event`] enum, one
//! payload struct per variant. An [`EventDispatcher`] holds at most one handler
//! per [`EventKind`] and invokes it synchronously; events are never queued.

mod dispatcher;
mod types;

pub use dispatcher::EventDispatcher;
pub use types::{
    Event,
    EventKind,
    EventType,
    KeyPressed,
    KeyReleased,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
    WindowClose,
    WindowResize,
};
