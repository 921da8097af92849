use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use super::super::theme::ThemeColors;

/// Single-line text input. Backs the command palette and the prompts for
/// new projects, tasks and subtasks.
pub struct SearchBar {
    query: String,
    title: &'static str,
    placeholder: &'static str,
}

impl SearchBar {
    pub fn new(title: &'static str, placeholder: &'static str) -> Self {
        Self {
            query: String::new(),
            title,
            placeholder,
        }
    }

    /// Clears the text and relabels the input.
    pub fn prompt(&mut self, title: &'static str, placeholder: &'static str) {
        self.query.clear();
        self.title = title;
        self.placeholder = placeholder;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn insert_char(&mut self, c: char) {
        self.query.push(c);
    }

    pub fn delete_char(&mut self) {
        self.query.pop();
    }

    pub fn clear(&mut self) {
        self.query.clear();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(colors.accent));

        let (text, style) = if self.query.is_empty() {
            (self.placeholder, Style::default().fg(colors.muted))
        } else {
            (self.query.as_str(), Style::default().fg(colors.fg))
        };

        frame.render_widget(Paragraph::new(text).block(block).style(style), area);

        let cursor_x = area.x + 1 + self.query.chars().count() as u16;
        if cursor_x < area.x + area.width.saturating_sub(1) {
            frame.set_cursor_position(ratatui::layout::Position {
                x: cursor_x,
                y: area.y + 1,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_query() {
        let mut bar = SearchBar::new("Go to project", "Type a project name...");
        for c in "café".chars() {
            bar.insert_char(c);
        }
        bar.delete_char();
        assert_eq!(bar.query(), "caf");

        bar.clear();
        assert_eq!(bar.query(), "");
        bar.delete_char();
        assert_eq!(bar.query(), "");
    }

    #[test]
    fn test_prompt_resets_text() {
        let mut bar = SearchBar::new("New task", "Task text...");
        bar.insert_char('x');
        bar.prompt("New subtask", "Subtask text...");
        assert_eq!(bar.query(), "");
        assert_eq!(bar.title, "New subtask");
    }
}
