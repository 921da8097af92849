use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    // Navigation
    Quit,
    ShowHelp,
    CloseModal,
    OpenPalette,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Enter,

    // Input handling
    Character(char),
    Backspace,

    // Other
    Tick,
}

pub struct EventHandler {
    should_quit: bool,
}

impl EventHandler {
    pub fn new() -> Self {
        Self { should_quit: false }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn next_event(&mut self) -> Result<AppEvent> {
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key_event) => Ok(self.handle_key_event(key_event)),
                _ => Ok(AppEvent::Tick),
            }
        } else {
            Ok(AppEvent::Tick)
        }
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) -> AppEvent {
        match key_event {
            // Global quit with Ctrl+C
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.should_quit = true;
                AppEvent::Quit
            }

            KeyEvent {
                code: KeyCode::Char('p'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => AppEvent::OpenPalette,

            KeyEvent {
                code: KeyCode::Esc, ..
            } => AppEvent::CloseModal,

            KeyEvent {
                code: KeyCode::Tab, ..
            } => AppEvent::Tab,

            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => AppEvent::Enter,

            // Arrow keys always navigate; vim keys arrive as characters so
            // text inputs can take them.
            KeyEvent {
                code: KeyCode::Down, ..
            } => AppEvent::Down,

            KeyEvent {
                code: KeyCode::Up, ..
            } => AppEvent::Up,

            KeyEvent {
                code: KeyCode::Left, ..
            } => AppEvent::Left,

            KeyEvent {
                code: KeyCode::Right,
                ..
            } => AppEvent::Right,

            KeyEvent {
                code: KeyCode::Char('?'),
                modifiers: KeyModifiers::NONE | KeyModifiers::SHIFT,
                ..
            } => AppEvent::ShowHelp,

            KeyEvent {
                code: KeyCode::Char(c),
                modifiers: KeyModifiers::NONE,
                ..
            } => AppEvent::Character(c),

            KeyEvent {
                code: KeyCode::Char(c),
                modifiers: KeyModifiers::SHIFT,
                ..
            } => AppEvent::Character(c.to_uppercase().next().unwrap_or(c)),

            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => AppEvent::Backspace,

            _ => AppEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut handler = EventHandler::new();
        let event = handler.handle_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(event, AppEvent::Quit);
        assert!(handler.should_quit());
    }

    #[test]
    fn test_key_mapping() {
        let mut handler = EventHandler::new();
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Char('p'), KeyModifiers::CONTROL)),
            AppEvent::OpenPalette
        );
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Char('j'), KeyModifiers::NONE)),
            AppEvent::Character('j')
        );
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Char('f'), KeyModifiers::SHIFT)),
            AppEvent::Character('F')
        );
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            AppEvent::ShowHelp
        );
        assert!(!handler.should_quit());
    }
}
