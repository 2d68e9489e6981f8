use std::fmt;

/// Keyboard key identifier.
///
/// Numbering follows the GLFW key table: printable keys use their upper-case
/// ASCII value, named keys start at 256, and [`KeyCode::LAST`] is the highest
/// defined code. The dense range lets input state live in a flat array.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const SPACE: Self = Self(32);
    pub const APOSTROPHE: Self = Self(39);
    pub const COMMA: Self = Self(44);
    pub const MINUS: Self = Self(45);
    pub const PERIOD: Self = Self(46);
    pub const SLASH: Self = Self(47);

    pub const DIGIT_0: Self = Self(48);
    pub const DIGIT_1: Self = Self(49);
    pub const DIGIT_2: Self = Self(50);
    pub const DIGIT_3: Self = Self(51);
    pub const DIGIT_4: Self = Self(52);
    pub const DIGIT_5: Self = Self(53);
    pub const DIGIT_6: Self = Self(54);
    pub const DIGIT_7: Self = Self(55);
    pub const DIGIT_8: Self = Self(56);
    pub const DIGIT_9: Self = Self(57);

    pub const SEMICOLON: Self = Self(59);
    pub const EQUAL: Self = Self(61);

    pub const A: Self = Self(65);
    pub const B: Self = Self(66);
    pub const C: Self = Self(67);
    pub const D: Self = Self(68);
    pub const E: Self = Self(69);
    pub const F: Self = Self(70);
    pub const G: Self = Self(71);
    pub const H: Self = Self(72);
    pub const I: Self = Self(73);
    pub const J: Self = Self(74);
    pub const K: Self = Self(75);
    pub const L: Self = Self(76);
    pub const M: Self = Self(77);
    pub const N: Self = Self(78);
    pub const O: Self = Self(79);
    pub const P: Self = Self(80);
    pub const Q: Self = Self(81);
    pub const R: Self = Self(82);
    pub const S: Self = Self(83);
    pub const T: Self = Self(84);
    pub const U: Self = Self(85);
    pub const V: Self = Self(86);
    pub const W: Self = Self(87);
    pub const X: Self = Self(88);
    pub const Y: Self = Self(89);
    pub const Z: Self = Self(90);

    pub const LEFT_BRACKET: Self = Self(91);
    pub const BACKSLASH: Self = Self(92);
    pub const RIGHT_BRACKET: Self = Self(93);
    pub const GRAVE_ACCENT: Self = Self(96);

    pub const ESCAPE: Self = Self(256);
    pub const ENTER: Self = Self(257);
    pub const TAB: Self = Self(258);
    pub const BACKSPACE: Self = Self(259);
    pub const INSERT: Self = Self(260);
    pub const DELETE: Self = Self(261);
    pub const RIGHT: Self = Self(262);
    pub const LEFT: Self = Self(263);
    pub const DOWN: Self = Self(264);
    pub const UP: Self = Self(265);
    pub const PAGE_UP: Self = Self(266);
    pub const PAGE_DOWN: Self = Self(267);
    pub const HOME: Self = Self(268);
    pub const END: Self = Self(269);
    pub const CAPS_LOCK: Self = Self(280);
    pub const SCROLL_LOCK: Self = Self(281);
    pub const NUM_LOCK: Self = Self(282);
    pub const PRINT_SCREEN: Self = Self(283);
    pub const PAUSE: Self = Self(284);

    pub const F1: Self = Self(290);
    pub const F2: Self = Self(291);
    pub const F3: Self = Self(292);
    pub const F4: Self = Self(293);
    pub const F5: Self = Self(294);
    pub const F6: Self = Self(295);
    pub const F7: Self = Self(296);
    pub const F8: Self = Self(297);
    pub const F9: Self = Self(298);
    pub const F10: Self = Self(299);
    pub const F11: Self = Self(300);
    pub const F12: Self = Self(301);

    pub const KEYPAD_0: Self = Self(320);
    pub const KEYPAD_1: Self = Self(321);
    pub const KEYPAD_2: Self = Self(322);
    pub const KEYPAD_3: Self = Self(323);
    pub const KEYPAD_4: Self = Self(324);
    pub const KEYPAD_5: Self = Self(325);
    pub const KEYPAD_6: Self = Self(326);
    pub const KEYPAD_7: Self = Self(327);
    pub const KEYPAD_8: Self = Self(328);
    pub const KEYPAD_9: Self = Self(329);

    pub const LEFT_SHIFT: Self = Self(340);
    pub const LEFT_CONTROL: Self = Self(341);
    pub const LEFT_ALT: Self = Self(342);
    pub const LEFT_SUPER: Self = Self(343);
    pub const RIGHT_SHIFT: Self = Self(344);
    pub const RIGHT_CONTROL: Self = Self(345);
    pub const RIGHT_ALT: Self = Self(346);
    pub const RIGHT_SUPER: Self = Self(347);
    pub const MENU: Self = Self(348);

    /// Highest defined key code.
    pub const LAST: Self = Self::MENU;

    /// Number of slots needed to index every defined key code.
    pub const COUNT: usize = Self::LAST.0 as usize + 1;

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the printable character for codes up to [`KeyCode::GRAVE_ACCENT`].
    pub fn as_char(self) -> Option<char> {
        if (Self::SPACE.0..=Self::GRAVE_ACCENT.0).contains(&self.0) {
            char::from_u32(u32::from(self.0))
        } else {
            None
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) => write!(f, "'{c}'"),
            None => write!(f, "key#{}", self.0),
        }
    }
}

/// Mouse button identifier (GLFW numbering, `0..=7`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MouseButton(pub u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);
    pub const MIDDLE: Self = Self(2);
    pub const BACK: Self = Self(3);
    pub const FORWARD: Self = Self(4);

    pub const LAST: Self = Self(7);
    pub const COUNT: usize = Self::LAST.0 as usize + 1;

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::LEFT => f.write_str("left"),
            Self::RIGHT => f.write_str("right"),
            Self::MIDDLE => f.write_str("middle"),
            Self(n) => write!(f, "button#{n}"),
        }
    }
}
