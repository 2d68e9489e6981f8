use std::fmt;

use crate::input::{KeyCode, MouseButton};

/// Framebuffer resized to `width` × `height` physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowResize {
    pub width: u32,
    pub height: u32,
}

/// The user asked to close the window.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowClose;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyPressed {
    pub key: KeyCode,
    /// OS auto-repeat rather than the initial press.
    pub repeat: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyReleased {
    pub key: KeyCode,
}

/// Mouse button pressed at cursor position `(x, y)` in physical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseButtonPressed {
    pub button: MouseButton,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseButtonReleased {
    pub button: MouseButton,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseMoved {
    pub x: f64,
    pub y: f64,
}

/// A single window or device notification.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Event {
    WindowResize(WindowResize),
    WindowClose(WindowClose),
    KeyPressed(KeyPressed),
    KeyReleased(KeyReleased),
    MouseButtonPressed(MouseButtonPressed),
    MouseButtonReleased(MouseButtonReleased),
    MouseMoved(MouseMoved),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::WindowResize(_) => EventKind::WindowResize,
            Event::WindowClose(_) => EventKind::WindowClose,
            Event::KeyPressed(_) => EventKind::KeyPressed,
            Event::KeyReleased(_) => EventKind::KeyReleased,
            Event::MouseButtonPressed(_) => EventKind::MouseButtonPressed,
            Event::MouseButtonReleased(_) => EventKind::MouseButtonReleased,
            Event::MouseMoved(_) => EventKind::MouseMoved,
        }
    }
}

/// Discriminant of [`Event`], usable as a dense array index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum EventKind {
    WindowResize = 0,
    WindowClose,
    KeyPressed,
    KeyReleased,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
}

impl EventKind {
    pub const COUNT: usize = 7;

    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::WindowResize,
        EventKind::WindowClose,
        EventKind::KeyPressed,
        EventKind::KeyReleased,
        EventKind::MouseButtonPressed,
        EventKind::MouseButtonReleased,
        EventKind::MouseMoved,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            EventKind::WindowResize => "WindowResize",
            EventKind::WindowClose => "WindowClose",
            EventKind::KeyPressed => "KeyPressed",
            EventKind::KeyReleased => "KeyReleased",
            EventKind::MouseButtonPressed => "MouseButtonPressed",
            EventKind::MouseButtonReleased => "MouseButtonReleased",
            EventKind::MouseMoved => "MouseMoved",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Implemented by each event payload so handlers can be registered by type.
pub trait EventType: Sized + 'static {
    const KIND: EventKind;

    /// Borrows the payload out of `event` when the kinds match.
    fn from_event(event: &Event) -> Option<&Self>;
}

macro_rules! event_type {
    ($($ty:ident),* $(,)?) => {
        $(
            impl EventType for $ty {
                const KIND: EventKind = EventKind::$ty;

                #[inline]
                fn from_event(event: &Event) -> Option<&Self> {
                    match event {
                        Event::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Event {
                #[inline]
                fn from(value: $ty) -> Self {
                    Event::$ty(value)
                }
            }
        )*
    };
}

event_type!(
    WindowResize,
    WindowClose,
    KeyPressed,
    KeyReleased,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_indices_are_dense() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(EventKind::ALL.len(), EventKind::COUNT);
    }

    #[test]
    fn event_kind_matches_payload() {
        let ev: Event = KeyPressed { key: KeyCode::W, repeat: false }.into();
        assert_eq!(ev.kind(), EventKind::KeyPressed);
        assert_eq!(ev.kind(), KeyPressed::KIND);

        let resize: Event = WindowResize { width: 640, height: 480 }.into();
        assert_eq!(resize.kind(), EventKind::WindowResize);
    }

    #[test]
    fn from_event_rejects_other_kinds() {
        let ev: Event = MouseMoved { x: 1.0, y: 2.0 }.into();
        assert!(KeyPressed::from_event(&ev).is_none());
        assert_eq!(MouseMoved::from_event(&ev), Some(&MouseMoved { x: 1.0, y: 2.0 }));
    }
}
