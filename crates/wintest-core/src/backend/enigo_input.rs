//! Keyboard and mouse synthesis via `enigo`
//!
//! Each primitive opens its own input connection on a blocking thread. Held
//! keys must survive between calls (`keyboard_down` then `keyboard_up`), so
//! connections are opened with `release_keys_when_dropped` disabled.

use async_trait::async_trait;
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use super::InputSynthesizer;
use crate::{
    error::{AutomationError, AutomationResult},
    keys::KeyCode,
    model::{MouseButton, Point, PressAction, ScreenSize},
};

/// Input synthesizer backed by the platform's native injection API
#[derive(Debug, Default, Clone, Copy)]
pub struct EnigoInput;

impl EnigoInput {
    /// Opens a test connection, returning `None` when input cannot be injected
    /// on this host (no display, no permissions)
    pub fn connect() -> Option<Self> {
        match open() {
            Ok(_) => Some(Self),
            Err(e) => {
                tracing::warn!(error = %e, "Input synthesis unavailable");
                None
            }
        }
    }
}

fn settings() -> Settings {
    Settings {
        release_keys_when_dropped: false,
        ..Settings::default()
    }
}

fn open() -> AutomationResult<Enigo> {
    Enigo::new(&settings()).map_err(|e| AutomationError::platform("open input connection", format!("{e:?}")))
}

/// Runs `f` against a fresh connection on the blocking pool
async fn with_enigo<T, F>(operation: &'static str, f: F) -> AutomationResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Enigo) -> Result<T, enigo::InputError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut enigo = open()?;
        f(&mut enigo).map_err(|e| AutomationError::platform(operation, format!("{e:?}")))
    })
    .await
    .map_err(|e| AutomationError::platform(operation, format!("input task panicked: {e}")))?
}

fn direction(action: PressAction) -> Direction {
    match action {
        PressAction::Click => Direction::Click,
        PressAction::Down => Direction::Press,
        PressAction::Up => Direction::Release,
    }
}

fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
        MouseButton::Mouse4 => Button::Back,
        MouseButton::Mouse5 => Button::Forward,
    }
}

/// Enigo scrolls down for positive amounts; callers use positive for up
fn wheel_amount(clicks: i32) -> i32 {
    clicks.saturating_neg()
}

/// Translates a key, `None` when the platform has no equivalent
fn to_enigo_key(key: KeyCode) -> Option<Key> {
    let key = match key {
        KeyCode::Char(c) => Key::Unicode(c),
        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,
        KeyCode::Control => Key::Control,
        KeyCode::Alt => Key::Alt,
        KeyCode::Shift => Key::Shift,
        KeyCode::Meta => Key::Meta,
        KeyCode::Up => Key::UpArrow,
        KeyCode::Down => Key::DownArrow,
        KeyCode::Left => Key::LeftArrow,
        KeyCode::Right => Key::RightArrow,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Enter => Key::Return,
        KeyCode::Tab => Key::Tab,
        KeyCode::Escape => Key::Escape,
        KeyCode::Space => Key::Space,
        KeyCode::CapsLock => Key::CapsLock,
        // Virtual-key codes
        #[cfg(target_os = "windows")]
        KeyCode::Insert => Key::Other(0x2D),
        #[cfg(target_os = "windows")]
        KeyCode::PrintScreen => Key::Other(0x2C),
        #[cfg(target_os = "windows")]
        KeyCode::Pause => Key::Other(0x13),
        #[cfg(target_os = "windows")]
        KeyCode::NumLock => Key::Other(0x90),
        #[cfg(target_os = "windows")]
        KeyCode::ScrollLock => Key::Other(0x91),
        #[cfg(not(target_os = "windows"))]
        KeyCode::Insert
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::NumLock
        | KeyCode::ScrollLock => return None,
    };
    Some(key)
}

#[async_trait]
impl InputSynthesizer for EnigoInput {
    async fn key(&self, key: KeyCode, action: PressAction) -> AutomationResult<()> {
        let native = to_enigo_key(key).ok_or_else(|| AutomationError::UnknownKey {
            key: format!("{key:?}"),
        })?;
        with_enigo("key", move |e| e.key(native, direction(action))).await
    }

    async fn text(&self, text: &str) -> AutomationResult<()> {
        let text = text.to_string();
        with_enigo("text", move |e| e.text(&text)).await
    }

    async fn move_to(&self, x: i32, y: i32) -> AutomationResult<()> {
        with_enigo("move_mouse", move |e| e.move_mouse(x, y, Coordinate::Abs)).await
    }

    async fn button(&self, button: MouseButton, action: PressAction) -> AutomationResult<()> {
        let native = to_enigo_button(button);
        with_enigo("button", move |e| e.button(native, direction(action))).await
    }

    async fn scroll(&self, clicks: i32) -> AutomationResult<()> {
        // Positive enigo lengths scroll down
        with_enigo("scroll", move |e| e.scroll(wheel_amount(clicks), Axis::Vertical)).await
    }

    async fn position(&self) -> AutomationResult<Point> {
        let (x, y) = with_enigo("location", |e| e.location()).await?;
        Ok(Point::new(x, y))
    }

    async fn screen_size(&self) -> AutomationResult<ScreenSize> {
        #[cfg(target_os = "windows")]
        {
            let (width, height) = super::windows::virtual_screen_size();
            Ok(ScreenSize { width, height })
        }

        #[cfg(not(target_os = "windows"))]
        {
            let (width, height) = with_enigo("main_display", |e| e.main_display()).await?;
            Ok(ScreenSize { width, height })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_translation() {
        assert_eq!(to_enigo_button(MouseButton::Left), Button::Left);
        assert_eq!(to_enigo_button(MouseButton::Right), Button::Right);
        assert_eq!(to_enigo_button(MouseButton::Middle), Button::Middle);
        assert_eq!(to_enigo_button(MouseButton::Mouse4), Button::Back);
        assert_eq!(to_enigo_button(MouseButton::Mouse5), Button::Forward);
    }

    #[test]
    fn test_wheel_amount_flips_direction() {
        assert_eq!(wheel_amount(3), -3);
        assert_eq!(wheel_amount(-2), 2);
        assert_eq!(wheel_amount(0), 0);
        assert_eq!(wheel_amount(i32::MIN), i32::MAX);
    }

    #[test]
    fn test_key_translation() {
        assert_eq!(to_enigo_key(KeyCode::Char('a')), Some(Key::Unicode('a')));
        assert_eq!(to_enigo_key(KeyCode::Enter), Some(Key::Return));
        assert_eq!(to_enigo_key(KeyCode::Up), Some(Key::UpArrow));
        assert_eq!(to_enigo_key(KeyCode::Meta), Some(Key::Meta));
    }

    #[test]
    fn test_direction_mapping() {
        assert_eq!(direction(PressAction::Click), Direction::Click);
        assert_eq!(direction(PressAction::Down), Direction::Press);
        assert_eq!(direction(PressAction::Up), Direction::Release);
    }
}
