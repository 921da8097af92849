use ratatui::style::Color;

use crate::application::Theme;
use crate::domain::{Priority, Status};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub highlight: Color,
}

impl ThemeColors {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                fg: Color::White,
                bg: Color::Reset,
                muted: Color::DarkGray,
                border: Color::Gray,
                accent: Color::Cyan,
                highlight: Color::DarkGray,
            },
            Theme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                muted: Color::Gray,
                border: Color::DarkGray,
                accent: Color::Blue,
                highlight: Color::Rgb(220, 220, 230),
            },
        }
    }
}

pub fn status_color(status: Status) -> Color {
    match status {
        Status::NotStarted => Color::Gray,
        Status::OnTrack => Color::Green,
        Status::AtRisk => Color::Yellow,
        Status::Delayed => Color::Red,
        Status::OnHold => Color::Magenta,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Gray,
        Priority::Medium => Color::Blue,
        Priority::High => Color::Yellow,
        Priority::Urgent => Color::Red,
    }
}
