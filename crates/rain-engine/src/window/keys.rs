//! Key codes as scripts see them (GLFW numbering).

use winit::keyboard::KeyCode;

pub const SPACE: i32 = 32;
pub const APOSTROPHE: i32 = 39;
pub const COMMA: i32 = 44;
pub const MINUS: i32 = 45;
pub const PERIOD: i32 = 46;
pub const SLASH: i32 = 47;
/// `0`..`9` are `DIGIT_0 + n`.
pub const DIGIT_0: i32 = 48;
pub const SEMICOLON: i32 = 59;
pub const EQUAL: i32 = 61;
/// `A`..`Z` are `A + n`.
pub const A: i32 = 65;
pub const LEFT_BRACKET: i32 = 91;
pub const BACKSLASH: i32 = 92;
pub const RIGHT_BRACKET: i32 = 93;
pub const GRAVE_ACCENT: i32 = 96;
pub const ESCAPE: i32 = 256;
pub const ENTER: i32 = 257;
pub const TAB: i32 = 258;
pub const BACKSPACE: i32 = 259;
pub const INSERT: i32 = 260;
pub const DELETE: i32 = 261;
pub const RIGHT: i32 = 262;
pub const LEFT: i32 = 263;
pub const DOWN: i32 = 264;
pub const UP: i32 = 265;
pub const PAGE_UP: i32 = 266;
pub const PAGE_DOWN: i32 = 267;
pub const HOME: i32 = 268;
pub const END: i32 = 269;
/// `F1`..`F12` are `F1 + n`.
pub const F1: i32 = 290;
pub const LEFT_SHIFT: i32 = 340;
pub const LEFT_CONTROL: i32 = 341;
pub const LEFT_ALT: i32 = 342;
pub const LEFT_SUPER: i32 = 343;
pub const RIGHT_SHIFT: i32 = 344;
pub const RIGHT_CONTROL: i32 = 345;
pub const RIGHT_ALT: i32 = 346;
pub const RIGHT_SUPER: i32 = 347;

/// Script key code for a physical key, if it has one.
pub fn from_winit(code: KeyCode) -> Option<i32> {
    let key = match code {
        KeyCode::Space => SPACE,
        KeyCode::Quote => APOSTROPHE,
        KeyCode::Comma => COMMA,
        KeyCode::Minus => MINUS,
        KeyCode::Period => PERIOD,
        KeyCode::Slash => SLASH,
        KeyCode::Semicolon => SEMICOLON,
        KeyCode::Equal => EQUAL,
        KeyCode::BracketLeft => LEFT_BRACKET,
        KeyCode::Backslash => BACKSLASH,
        KeyCode::BracketRight => RIGHT_BRACKET,
        KeyCode::Backquote => GRAVE_ACCENT,

        KeyCode::Digit0 => DIGIT_0,
        KeyCode::Digit1 => DIGIT_0 + 1,
        KeyCode::Digit2 => DIGIT_0 + 2,
        KeyCode::Digit3 => DIGIT_0 + 3,
        KeyCode::Digit4 => DIGIT_0 + 4,
        KeyCode::Digit5 => DIGIT_0 + 5,
        KeyCode::Digit6 => DIGIT_0 + 6,
        KeyCode::Digit7 => DIGIT_0 + 7,
        KeyCode::Digit8 => DIGIT_0 + 8,
        KeyCode::Digit9 => DIGIT_0 + 9,

        KeyCode::KeyA => A,
        KeyCode::KeyB => A + 1,
        KeyCode::KeyC => A + 2,
        KeyCode::KeyD => A + 3,
        KeyCode::KeyE => A + 4,
        KeyCode::KeyF => A + 5,
        KeyCode::KeyG => A + 6,
        KeyCode::KeyH => A + 7,
        KeyCode::KeyI => A + 8,
        KeyCode::KeyJ => A + 9,
        KeyCode::KeyK => A + 10,
        KeyCode::KeyL => A + 11,
        KeyCode::KeyM => A + 12,
        KeyCode::KeyN => A + 13,
        KeyCode::KeyO => A + 14,
        KeyCode::KeyP => A + 15,
        KeyCode::KeyQ => A + 16,
        KeyCode::KeyR => A + 17,
        KeyCode::KeyS => A + 18,
        KeyCode::KeyT => A + 19,
        KeyCode::KeyU => A + 20,
        KeyCode::KeyV => A + 21,
        KeyCode::KeyW => A + 22,
        KeyCode::KeyX => A + 23,
        KeyCode::KeyY => A + 24,
        KeyCode::KeyZ => A + 25,

        KeyCode::Escape => ESCAPE,
        KeyCode::Enter => ENTER,
        KeyCode::Tab => TAB,
        KeyCode::Backspace => BACKSPACE,
        KeyCode::Insert => INSERT,
        KeyCode::Delete => DELETE,
        KeyCode::ArrowRight => RIGHT,
        KeyCode::ArrowLeft => LEFT,
        KeyCode::ArrowDown => DOWN,
        KeyCode::ArrowUp => UP,
        KeyCode::PageUp => PAGE_UP,
        KeyCode::PageDown => PAGE_DOWN,
        KeyCode::Home => HOME,
        KeyCode::End => END,

        KeyCode::F1 => F1,
        KeyCode::F2 => F1 + 1,
        KeyCode::F3 => F1 + 2,
        KeyCode::F4 => F1 + 3,
        KeyCode::F5 => F1 + 4,
        KeyCode::F6 => F1 + 5,
        KeyCode::F7 => F1 + 6,
        KeyCode::F8 => F1 + 7,
        KeyCode::F9 => F1 + 8,
        KeyCode::F10 => F1 + 9,
        KeyCode::F11 => F1 + 10,
        KeyCode::F12 => F1 + 11,

        KeyCode::ShiftLeft => LEFT_SHIFT,
        KeyCode::ControlLeft => LEFT_CONTROL,
        KeyCode::AltLeft => LEFT_ALT,
        KeyCode::SuperLeft => LEFT_SUPER,
        KeyCode::ShiftRight => RIGHT_SHIFT,
        KeyCode::ControlRight => RIGHT_CONTROL,
        KeyCode::AltRight => RIGHT_ALT,
        KeyCode::SuperRight => RIGHT_SUPER,

        _ => return None,
    };
    Some(key)
}
