//! Key name vocabulary
//!
//! Tool callers name keys the way automation scripts usually do: single
//! characters (`"a"`, `"7"`, `"/"`) or named keys with common aliases
//! (`"enter"`/`"return"`, `"ctrl"`, `"win"`, `"pgdn"`). [`KeyCode::parse`]
//! resolves a name; backends translate a `KeyCode` into their own key type.

/// Platform-neutral key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key, sent as that character
    Char(char),

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Modifiers
    Control,
    Alt,
    Shift,
    Meta,

    // Navigation
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // Locks and system keys
    CapsLock,
    Insert,
    PrintScreen,
    Pause,
    NumLock,
    ScrollLock,
}

impl KeyCode {
    /// Resolves a key name, returning `None` when it is not recognised
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(match c {
                ' ' => KeyCode::Space,
                '\n' | '\r' => KeyCode::Enter,
                '\t' => KeyCode::Tab,
                c => KeyCode::Char(c),
            });
        }

        let key = match name.trim().to_ascii_lowercase().as_str() {
            "f1" => KeyCode::F1,
            "f2" => KeyCode::F2,
            "f3" => KeyCode::F3,
            "f4" => KeyCode::F4,
            "f5" => KeyCode::F5,
            "f6" => KeyCode::F6,
            "f7" => KeyCode::F7,
            "f8" => KeyCode::F8,
            "f9" => KeyCode::F9,
            "f10" => KeyCode::F10,
            "f11" => KeyCode::F11,
            "f12" => KeyCode::F12,
            "ctrl" | "control" | "ctrlleft" | "ctrlright" => KeyCode::Control,
            "alt" | "altleft" | "altright" | "option" => KeyCode::Alt,
            "shift" | "shiftleft" | "shiftright" => KeyCode::Shift,
            "win" | "winleft" | "winright" | "meta" | "super" | "cmd" | "command" => {
                KeyCode::Meta
            }
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "backspace" | "bs" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "escape" | "esc" => KeyCode::Escape,
            "space" | "spacebar" => KeyCode::Space,
            "capslock" => KeyCode::CapsLock,
            "insert" | "ins" => KeyCode::Insert,
            "printscreen" | "prtsc" | "prtscr" | "print" => KeyCode::PrintScreen,
            "pause" => KeyCode::Pause,
            "numlock" => KeyCode::NumLock,
            "scrolllock" => KeyCode::ScrollLock,
            _ => return None,
        };
        Some(key)
    }
}
