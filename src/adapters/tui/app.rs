use chrono::Local;
use color_eyre::Result;
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::sync::Arc;
use tokio::sync::watch;

use super::{
    event::{AppEvent, EventHandler},
    theme::{priority_color, status_color, ThemeColors},
    widgets::SearchBar,
};
use crate::application::{NotificationCenter, PreferenceValues, Preferences, ProjectStore, ViewMode};
use crate::domain::insights::{search_projects, BoardColumn, DashboardStats, ProjectFilter, ProjectProgress};
use crate::domain::{Notification, Project, ProjectDraft, ProjectId, Snapshot, Subtask, Task, TaskDraft};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputTarget {
    Project,
    Task,
    Subtask,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Main,
    Help,
    Notifications,
    Palette,
    Input(InputTarget),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusedPane {
    Projects,
    Tasks,
}

const GRID_COLUMNS: usize = 3;

pub struct App {
    store: Arc<ProjectStore>,
    notification_center: Arc<NotificationCenter>,
    preferences: Arc<Preferences>,
    changes: watch::Receiver<u64>,

    // UI State
    mode: AppMode,
    focused_pane: FocusedPane,
    prefs: PreferenceValues,

    // Projects and tasks
    snapshot: Snapshot,
    project_filter: ProjectFilter,
    project_state: TableState,
    task_state: TableState,
    board_column: usize,
    subtask_cursor: usize,

    // Notifications panel
    notifications: Vec<Notification>,
    notification_state: TableState,

    // Command palette
    search_bar: SearchBar,
    palette_state: TableState,

    // New project/task/subtask prompt
    input_bar: SearchBar,

    is_loading: bool,
    pending_syncs: usize,
    status_message: Option<String>,
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        None => state.select(Some(0)),
        Some(i) if i >= len => state.select(Some(len - 1)),
        Some(_) => {}
    }
}

fn step_selection(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let current = state.selected().unwrap_or(0);
    let next = match (forward, current) {
        (true, c) if c >= len - 1 => 0,
        (true, c) => c + 1,
        (false, 0) => len - 1,
        (false, c) => c - 1,
    };
    state.select(Some(next));
}

impl App {
    pub fn new(
        store: Arc<ProjectStore>,
        notification_center: Arc<NotificationCenter>,
        preferences: Arc<Preferences>,
    ) -> Self {
        let changes = store.subscribe();
        Self {
            store,
            notification_center,
            preferences,
            changes,
            mode: AppMode::Main,
            focused_pane: FocusedPane::Projects,
            prefs: PreferenceValues::default(),
            snapshot: Snapshot::default(),
            project_filter: ProjectFilter::All,
            project_state: TableState::default(),
            task_state: TableState::default(),
            board_column: 0,
            subtask_cursor: 0,
            notifications: Vec::new(),
            notification_state: TableState::default(),
            search_bar: SearchBar::new("Go to project", "Type a project name..."),
            palette_state: TableState::default(),
            input_bar: SearchBar::new("New task", "Task text..."),
            is_loading: false,
            pending_syncs: 0,
            status_message: None,
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        self.prefs = self.preferences.values().await;
        self.load().await;
        Ok(())
    }

    async fn load(&mut self) {
        self.is_loading = true;
        self.status_message = if self.store.fetch_all().await {
            None
        } else {
            Some("Failed to load data from API".to_string())
        };
        self.is_loading = false;
        self.reload().await;
    }

    async fn reload(&mut self) {
        self.snapshot = self.store.snapshot().await;
        self.notifications = self.notification_center.notifications().await;
        self.clamp_selections();
    }

    /// Picks up store changes and notices raised by the overdue watcher.
    pub async fn on_tick(&mut self) {
        if matches!(self.changes.has_changed(), Ok(true)) {
            self.changes.borrow_and_update();
            self.snapshot = self.store.snapshot().await;
            self.clamp_selections();
        }
        self.notifications = self.notification_center.notifications().await;
        clamp_selection(&mut self.notification_state, self.notifications.len());
        self.pending_syncs = self.store.pending_syncs().await;
    }

    fn visible_projects(&self) -> Vec<&Project> {
        self.snapshot
            .projects
            .iter()
            .filter(|p| self.project_filter.matches(p))
            .collect()
    }

    fn selected_project(&self) -> Option<&Project> {
        let idx = self.project_state.selected()?;
        self.visible_projects().get(idx).copied()
    }

    fn current_tasks(&self) -> &[Task] {
        match self.selected_project() {
            Some(project) => self.snapshot.tasks_for(&project.id),
            None => &[],
        }
    }

    fn board_tasks(&self) -> Vec<&Task> {
        let column = BoardColumn::ALL[self.board_column];
        self.current_tasks().iter().filter(|t| column.contains(t)).collect()
    }

    fn visible_task_count(&self) -> usize {
        match self.prefs.view_mode {
            ViewMode::Board => self.board_tasks().len(),
            ViewMode::List | ViewMode::Grid => self.current_tasks().len(),
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        let idx = self.task_state.selected()?;
        match self.prefs.view_mode {
            ViewMode::Board => self.board_tasks().get(idx).copied(),
            ViewMode::List | ViewMode::Grid => self.current_tasks().get(idx),
        }
    }

    fn selected_subtask(&self) -> Option<&Subtask> {
        self.selected_task()?.subtasks.get(self.subtask_cursor)
    }

    fn palette_results(&self) -> Vec<&Project> {
        search_projects(&self.snapshot.projects, self.search_bar.query())
    }

    fn clamp_selections(&mut self) {
        let projects = self.visible_projects().len();
        clamp_selection(&mut self.project_state, projects);
        let tasks = self.visible_task_count();
        clamp_selection(&mut self.task_state, tasks);
        let subtasks = self.selected_task().map_or(0, |t| t.subtasks.len());
        self.subtask_cursor = self.subtask_cursor.min(subtasks.saturating_sub(1));
    }

    fn select_project(&mut self, id: &ProjectId) {
        if !self.visible_projects().iter().any(|p| &p.id == id) {
            self.project_filter = ProjectFilter::All;
        }
        let idx = self.visible_projects().iter().position(|p| &p.id == id);
        self.project_state.select(idx);
        self.task_state.select(Some(0));
        self.clamp_selections();
    }

    pub async fn handle_event(&mut self, event: AppEvent) -> Result<bool> {
        if event == AppEvent::Quit {
            return Ok(true);
        }
        if event == AppEvent::Tick {
            self.on_tick().await;
            return Ok(false);
        }

        match self.mode {
            AppMode::Help => self.mode = AppMode::Main,
            AppMode::Palette => self.handle_palette_event(event),
            AppMode::Input(target) => self.handle_input_event(target, event).await,
            AppMode::Notifications => self.handle_notifications_event(event).await,
            AppMode::Main => return self.handle_main_event(event).await,
        }
        Ok(false)
    }

    fn handle_palette_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CloseModal => {
                self.search_bar.clear();
                self.mode = AppMode::Main;
            }
            AppEvent::Character(c) => {
                self.search_bar.insert_char(c);
                self.palette_state.select(Some(0));
            }
            AppEvent::Backspace => {
                self.search_bar.delete_char();
                self.palette_state.select(Some(0));
            }
            AppEvent::Down | AppEvent::Tab => {
                let len = self.palette_results().len();
                step_selection(&mut self.palette_state, len, true);
            }
            AppEvent::Up => {
                let len = self.palette_results().len();
                step_selection(&mut self.palette_state, len, false);
            }
            AppEvent::Enter => {
                let idx = self.palette_state.selected().unwrap_or(0);
                let chosen = self.palette_results().get(idx).map(|p| p.id.clone());
                if let Some(id) = chosen {
                    self.select_project(&id);
                    self.focused_pane = FocusedPane::Tasks;
                }
                self.search_bar.clear();
                self.mode = AppMode::Main;
            }
            _ => {}
        }
    }

    fn open_input(&mut self, target: InputTarget) {
        let (title, placeholder) = match target {
            InputTarget::Project => ("New project", "Project name..."),
            InputTarget::Task => ("New task", "Task text..."),
            InputTarget::Subtask => ("New subtask", "Subtask text..."),
        };
        self.input_bar.prompt(title, placeholder);
        self.mode = AppMode::Input(target);
    }

    async fn handle_input_event(&mut self, target: InputTarget, event: AppEvent) {
        match event {
            AppEvent::CloseModal => {
                self.input_bar.clear();
                self.mode = AppMode::Main;
            }
            AppEvent::Character(c) => self.input_bar.insert_char(c),
            AppEvent::ShowHelp => self.input_bar.insert_char('?'),
            AppEvent::Backspace => self.input_bar.delete_char(),
            AppEvent::Enter => {
                let text = self.input_bar.query().trim().to_string();
                self.input_bar.clear();
                self.mode = AppMode::Main;
                if !text.is_empty() {
                    self.submit_input(target, text).await;
                }
            }
            _ => {}
        }
    }

    async fn submit_input(&mut self, target: InputTarget, text: String) {
        match target {
            InputTarget::Project => match self.store.add_project(ProjectDraft::new(text)).await {
                Some(project) => {
                    self.reload().await;
                    self.select_project(&project.id);
                }
                None => self.status_message = Some("Failed to add project".to_string()),
            },
            InputTarget::Task => {
                let Some(project_id) = self.selected_project().map(|p| p.id.clone()) else {
                    return;
                };
                match self.store.add_task(&project_id, TaskDraft::new(text)).await {
                    Some(task) => {
                        self.reload().await;
                        let idx = self.current_tasks().iter().position(|t| t.id == task.id);
                        if idx.is_some() && self.prefs.view_mode != ViewMode::Board {
                            self.task_state.select(idx);
                        }
                    }
                    None => self.status_message = Some("Failed to add task".to_string()),
                }
            }
            InputTarget::Subtask => {
                let Some(task_id) = self.selected_task().map(|t| t.id.clone()) else {
                    return;
                };
                match self.store.add_subtask(&task_id, &text).await {
                    Some(_) => {
                        self.reload().await;
                        let count = self.selected_task().map_or(0, |t| t.subtasks.len());
                        self.subtask_cursor = count.saturating_sub(1);
                    }
                    None => self.status_message = Some("Failed to add subtask".to_string()),
                }
            }
        }
    }

    async fn handle_notifications_event(&mut self, event: AppEvent) {
        let len = self.notifications.len();
        let selected_id = self
            .notification_state
            .selected()
            .and_then(|i| self.notifications.get(i))
            .map(|n| n.id.clone());

        match event {
            AppEvent::CloseModal | AppEvent::Character('q') | AppEvent::Character('n') => {
                self.mode = AppMode::Main;
            }
            AppEvent::Down | AppEvent::Character('j') => {
                step_selection(&mut self.notification_state, len, true);
            }
            AppEvent::Up | AppEvent::Character('k') => {
                step_selection(&mut self.notification_state, len, false);
            }
            AppEvent::Enter | AppEvent::Character(' ') => {
                if let Some(id) = selected_id {
                    self.notification_center.mark_as_read(&id).await;
                }
            }
            AppEvent::Character('a') => self.notification_center.mark_all_as_read().await,
            AppEvent::Character('x') => {
                if let Some(id) = selected_id {
                    self.notification_center.delete(&id).await;
                }
            }
            AppEvent::Character('c') => self.notification_center.clear_all().await,
            _ => {}
        }

        self.notifications = self.notification_center.notifications().await;
        clamp_selection(&mut self.notification_state, self.notifications.len());
    }

    async fn handle_main_event(&mut self, event: AppEvent) -> Result<bool> {
        match event {
            AppEvent::ShowHelp => self.mode = AppMode::Help,
            AppEvent::OpenPalette | AppEvent::Character(':') => {
                self.search_bar.clear();
                self.palette_state.select(Some(0));
                self.mode = AppMode::Palette;
            }
            AppEvent::CloseModal => self.status_message = None,
            AppEvent::Tab => {
                self.focused_pane = match self.focused_pane {
                    FocusedPane::Projects => FocusedPane::Tasks,
                    FocusedPane::Tasks => FocusedPane::Projects,
                };
            }
            AppEvent::Enter if self.focused_pane == FocusedPane::Projects => {
                self.focused_pane = FocusedPane::Tasks;
            }
            AppEvent::Down | AppEvent::Character('j') => self.navigate(true),
            AppEvent::Up | AppEvent::Character('k') => self.navigate(false),
            AppEvent::Left | AppEvent::Character('h') => self.move_horizontal(false),
            AppEvent::Right | AppEvent::Character('l') => self.move_horizontal(true),
            AppEvent::Character(c) => return self.handle_command(c).await,
            _ => {}
        }
        Ok(false)
    }

    async fn handle_command(&mut self, c: char) -> Result<bool> {
        match c {
            'q' => return Ok(true),
            ' ' => {
                if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                    self.store.toggle_task(&id).await;
                    self.reload().await;
                }
            }
            'x' => {
                if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                    self.store.delete_task(&id).await;
                    self.reload().await;
                }
            }
            '[' => self.subtask_cursor = self.subtask_cursor.saturating_sub(1),
            ']' => {
                let count = self.selected_task().map_or(0, |t| t.subtasks.len());
                if self.subtask_cursor + 1 < count {
                    self.subtask_cursor += 1;
                }
            }
            's' => {
                let ids = self
                    .selected_task()
                    .zip(self.selected_subtask())
                    .map(|(task, subtask)| (task.id.clone(), subtask.id.clone()));
                if let Some((task_id, subtask_id)) = ids {
                    self.store.toggle_subtask(&task_id, &subtask_id).await;
                    self.reload().await;
                }
            }
            'D' => {
                let ids = self
                    .selected_task()
                    .zip(self.selected_subtask())
                    .map(|(task, subtask)| (task.id.clone(), subtask.id.clone()));
                if let Some((task_id, subtask_id)) = ids {
                    self.store.delete_subtask(&task_id, &subtask_id).await;
                    self.reload().await;
                }
            }
            'P' => self.open_input(InputTarget::Project),
            'a' if self.selected_project().is_some() => self.open_input(InputTarget::Task),
            'A' if self.selected_task().is_some() => self.open_input(InputTarget::Subtask),
            '<' | 'H' => self.move_selected_task(false).await,
            '>' | 'L' => self.move_selected_task(true).await,
            'f' => {
                if let Some(id) = self.selected_project().map(|p| p.id.clone()) {
                    self.store.toggle_project_favorite(&id).await;
                    self.reload().await;
                }
            }
            'F' => {
                self.project_filter = self.project_filter.next();
                self.project_state.select(Some(0));
                self.clamp_selections();
            }
            't' => self.prefs.theme = self.preferences.toggle_theme().await,
            'b' => self.prefs.sidebar_collapsed = self.preferences.toggle_sidebar().await,
            'v' => {
                let mode = self.prefs.view_mode.cycle();
                self.preferences.set_view_mode(mode).await;
                self.prefs.view_mode = mode;
                self.task_state.select(Some(0));
                self.clamp_selections();
            }
            'n' => {
                self.notification_state.select(Some(0));
                clamp_selection(&mut self.notification_state, self.notifications.len());
                self.mode = AppMode::Notifications;
            }
            'r' => self.load().await,
            _ => {}
        }
        Ok(false)
    }

    fn navigate(&mut self, forward: bool) {
        match self.focused_pane {
            FocusedPane::Projects => {
                let len = self.visible_projects().len();
                step_selection(&mut self.project_state, len, forward);
                self.task_state.select(Some(0));
                self.clamp_selections();
            }
            FocusedPane::Tasks => {
                let len = self.visible_task_count();
                let stride = if self.prefs.view_mode == ViewMode::Grid {
                    GRID_COLUMNS
                } else {
                    1
                };
                for _ in 0..stride.min(len) {
                    step_selection(&mut self.task_state, len, forward);
                }
                self.subtask_cursor = 0;
            }
        }
    }

    fn move_horizontal(&mut self, forward: bool) {
        match (self.focused_pane, self.prefs.view_mode) {
            (FocusedPane::Tasks, ViewMode::Board) => {
                let last = BoardColumn::ALL.len() - 1;
                self.board_column = match (forward, self.board_column) {
                    (true, c) if c < last => c + 1,
                    (false, c) if c > 0 => c - 1,
                    (_, c) => c,
                };
                self.task_state.select(Some(0));
                self.clamp_selections();
            }
            (FocusedPane::Tasks, ViewMode::Grid) => {
                let len = self.visible_task_count();
                step_selection(&mut self.task_state, len, forward);
            }
            _ => {
                self.focused_pane = if forward {
                    FocusedPane::Tasks
                } else {
                    FocusedPane::Projects
                };
            }
        }
    }

    async fn move_selected_task(&mut self, forward: bool) {
        if self.prefs.view_mode != ViewMode::Board {
            return;
        }
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        let target = match (forward, self.board_column) {
            (true, c) if c + 1 < BoardColumn::ALL.len() => c + 1,
            (false, c) if c > 0 => c - 1,
            _ => return,
        };
        self.store.move_task(&id, BoardColumn::ALL[target]).await;
        self.board_column = target;
        self.reload().await;
        let idx = self.board_tasks().iter().position(|t| t.id == id);
        self.task_state.select(idx);
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let colors = ThemeColors::for_theme(self.prefs.theme);
        frame.render_widget(
            Block::default().style(Style::default().bg(colors.bg).fg(colors.fg)),
            frame.area(),
        );

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(3), // Dashboard stats
                Constraint::Min(0),    // Projects + workspace
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        self.render_header(frame, main_chunks[0], &colors);
        self.render_stats(frame, main_chunks[1], &colors);

        let workspace = if self.prefs.sidebar_collapsed {
            main_chunks[2]
        } else {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
                .split(main_chunks[2]);
            self.render_projects(frame, content_chunks[0], &colors);
            content_chunks[1]
        };

        match self.prefs.view_mode {
            ViewMode::List => self.render_task_list(frame, workspace, &colors),
            ViewMode::Board => self.render_board(frame, workspace, &colors),
            ViewMode::Grid => self.render_task_grid(frame, workspace, &colors),
        }

        self.render_status_bar(frame, main_chunks[3], &colors);

        match self.mode {
            AppMode::Main => {}
            AppMode::Help => self.render_help(frame, &colors),
            AppMode::Notifications => self.render_notifications(frame, &colors),
            AppMode::Palette => self.render_palette(frame, &colors),
            AppMode::Input(_) => self.render_input(frame, &colors),
        }
    }

    fn pane_block(&self, title: String, pane: FocusedPane, colors: &ThemeColors) -> Block<'static> {
        let border_style = if self.focused_pane == pane && self.mode == AppMode::Main {
            Style::default().fg(colors.accent)
        } else {
            Style::default().fg(colors.border)
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let unread = self.notifications.iter().filter(|n| !n.read).count();
        let unread_style = if unread > 0 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.muted)
        };
        let mut spans = vec![
            Span::styled(" Project Tracker ", Style::default().fg(colors.accent).add_modifier(Modifier::BOLD)),
            Span::styled(format!("| {} ", self.project_filter.label()), Style::default().fg(colors.muted)),
            Span::styled(format!("| view: {} ", self.prefs.view_mode), Style::default().fg(colors.muted)),
            Span::styled(format!("| {unread} unread "), unread_style),
        ];
        if self.pending_syncs > 0 {
            spans.push(Span::styled(
                format!("| saving {}...", self.pending_syncs),
                Style::default().fg(colors.muted),
            ));
        }
        let line = Line::from(spans);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let stats = DashboardStats::from_snapshot(&self.snapshot);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        let cards = [
            ("Projects", stats.total_projects, colors.accent),
            ("Completed Tasks", stats.completed_tasks, Color::Green),
            ("Pending Tasks", stats.pending_tasks, Color::Yellow),
        ];
        for ((label, value, color), chunk) in cards.into_iter().zip(chunks.iter()) {
            let block = Block::default()
                .title(label)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(colors.border));
            let paragraph = Paragraph::new(value.to_string())
                .block(block)
                .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, *chunk);
        }
    }

    fn render_projects(&mut self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let projects = self.visible_projects();
        let title = format!("Projects ({})", projects.len());
        let block = self.pane_block(title, FocusedPane::Projects, colors);

        if self.is_loading {
            let paragraph = Paragraph::new("Loading projects...")
                .block(block)
                .style(Style::default().fg(colors.muted));
            frame.render_widget(paragraph, area);
            return;
        }

        if projects.is_empty() {
            let paragraph = Paragraph::new("No projects found")
                .block(block)
                .style(Style::default().fg(colors.muted));
            frame.render_widget(paragraph, area);
            return;
        }

        let rows: Vec<Row> = projects
            .iter()
            .map(|project| {
                let progress = ProjectProgress::of(self.snapshot.tasks_for(&project.id));
                let star = if project.is_favorite { "★" } else { " " };
                Row::new(vec![
                    Cell::from(star).style(Style::default().fg(Color::Yellow)),
                    Cell::from(project.name.clone()),
                    Cell::from(project.status.label()).style(Style::default().fg(status_color(project.status))),
                    Cell::from(format!("{:>3}%", progress.percent())).style(Style::default().fg(colors.muted)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Min(12),
                Constraint::Length(11),
                Constraint::Length(4),
            ],
        )
        .block(block)
        .highlight_style(Style::default().bg(colors.highlight));

        frame.render_stateful_widget(table, area, &mut self.project_state);
    }

    fn workspace_title(&self) -> String {
        match self.selected_project() {
            Some(project) => {
                let progress = ProjectProgress::of(self.snapshot.tasks_for(&project.id));
                format!(
                    "{} - {}/{} done ({}%)",
                    project.name,
                    progress.completed,
                    progress.total,
                    progress.percent()
                )
            }
            None => "Tasks".to_string(),
        }
    }

    fn render_task_list(&mut self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let block = self.pane_block(self.workspace_title(), FocusedPane::Tasks, colors);
        let tasks = self.current_tasks();

        if tasks.is_empty() {
            let message = if self.selected_project().is_some() {
                "No tasks in this project"
            } else {
                "Select a project"
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .style(Style::default().fg(colors.muted));
            frame.render_widget(paragraph, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(area);

        let today = Local::now().date_naive();
        let rows: Vec<Row> = tasks
            .iter()
            .map(|task| {
                let check = if task.completed { "[x]" } else { "[ ]" };
                let due_style = if task.is_overdue(today) {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(colors.muted)
                };
                let text_style = if task.completed {
                    Style::default().fg(colors.muted).add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(colors.fg)
                };
                let priority = task.priority_or_default();
                let status = task
                    .status
                    .map(|s| Span::styled(s.label(), Style::default().fg(status_color(s))))
                    .unwrap_or_else(|| Span::styled("-", Style::default().fg(colors.muted)));
                let subtasks = if task.subtasks.is_empty() {
                    String::new()
                } else {
                    format!("{}/{}", task.completed_subtasks(), task.subtasks.len())
                };
                Row::new(vec![
                    Cell::from(check),
                    Cell::from(task.text.clone()).style(text_style),
                    Cell::from(priority.label()).style(Style::default().fg(priority_color(priority))),
                    Cell::from(Line::from(status)),
                    Cell::from(task.due_date_display()).style(due_style),
                    Cell::from(subtasks).style(Style::default().fg(colors.muted)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Min(20),
                Constraint::Length(7),
                Constraint::Length(11),
                Constraint::Length(12),
                Constraint::Length(5),
            ],
        )
        .block(block)
        .highlight_style(Style::default().bg(colors.highlight));

        frame.render_stateful_widget(table, chunks[0], &mut self.task_state);
        self.render_task_detail(frame, chunks[1], colors);
    }

    fn render_task_detail(&self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let block = Block::default()
            .title("Details")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(colors.border));

        let Some(task) = self.selected_task() else {
            frame.render_widget(block, area);
            return;
        };

        let mut lines = vec![Line::from(vec![
            Span::styled("Tags: ", Style::default().fg(colors.muted)),
            Span::raw(if task.tags.is_empty() {
                "none".to_string()
            } else {
                task.tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" ")
            }),
        ])];
        if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(Line::from(description.to_string()));
        }
        for (idx, subtask) in task.subtasks.iter().enumerate() {
            let mark = if subtask.completed { "✓" } else { "·" };
            let cursor = if idx == self.subtask_cursor { ">" } else { " " };
            let style = if subtask.completed {
                Style::default().fg(colors.muted)
            } else {
                Style::default().fg(colors.fg)
            };
            lines.push(Line::from(Span::styled(
                format!("{cursor} {mark} {}", subtask.text),
                style,
            )));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_board(&mut self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let block = self.pane_block(self.workspace_title(), FocusedPane::Tasks, colors);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let constraints = BoardColumn::ALL.map(|_| Constraint::Ratio(1, BoardColumn::ALL.len() as u32));
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(inner);

        let tasks = self.current_tasks().to_vec();
        for (idx, (column, chunk)) in BoardColumn::ALL.iter().zip(columns.iter()).enumerate() {
            let members: Vec<&Task> = tasks.iter().filter(|t| column.contains(t)).collect();
            let selected = idx == self.board_column;
            let border_style = if selected && self.focused_pane == FocusedPane::Tasks {
                Style::default().fg(colors.accent)
            } else {
                Style::default().fg(colors.border)
            };
            let column_block = Block::default()
                .title(format!("{} ({})", column.title(), members.len()))
                .borders(Borders::ALL)
                .border_style(border_style);

            let rows: Vec<Row> = members
                .iter()
                .map(|task| {
                    let priority = task.priority_or_default();
                    Row::new(vec![
                        Cell::from("●").style(Style::default().fg(priority_color(priority))),
                        Cell::from(task.text.clone()),
                    ])
                })
                .collect();
            let table = Table::new(rows, [Constraint::Length(1), Constraint::Min(4)])
                .block(column_block)
                .highlight_style(Style::default().bg(colors.highlight));

            if selected {
                frame.render_stateful_widget(table, *chunk, &mut self.task_state);
            } else {
                frame.render_widget(table, *chunk);
            }
        }
    }

    fn render_task_grid(&self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        let block = self.pane_block(self.workspace_title(), FocusedPane::Tasks, colors);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let tasks = self.current_tasks();
        if tasks.is_empty() {
            frame.render_widget(
                Paragraph::new("No tasks in this project").style(Style::default().fg(colors.muted)),
                inner,
            );
            return;
        }

        const CARD_HEIGHT: u16 = 5;
        let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
        let selected = self.task_state.selected().unwrap_or(0);
        let first_row = (selected / GRID_COLUMNS).saturating_sub(visible_rows - 1);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
            .split(inner);

        for (row_idx, row_area) in rows.iter().enumerate() {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
                .split(*row_area);
            for (col_idx, cell_area) in cells.iter().enumerate() {
                let idx = (first_row + row_idx) * GRID_COLUMNS + col_idx;
                let Some(task) = tasks.get(idx) else {
                    return;
                };
                let border_style = if idx == selected {
                    Style::default().fg(colors.accent)
                } else {
                    Style::default().fg(colors.border)
                };
                let priority = task.priority_or_default();
                let card = Paragraph::new(vec![
                    Line::from(Span::styled(
                        priority.label(),
                        Style::default().fg(priority_color(priority)),
                    )),
                    Line::from(Span::styled(task.due_date_display(), Style::default().fg(colors.muted))),
                    Line::from(if task.completed { "Completed" } else { "Open" }),
                ])
                .block(
                    Block::default()
                        .title(task.text.clone())
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(border_style),
                );
                frame.render_widget(card, *cell_area);
            }
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, colors: &ThemeColors) {
        if let Some(message) = &self.status_message {
            let paragraph = Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red));
            frame.render_widget(paragraph, area);
            return;
        }

        let help_text = match (self.focused_pane, self.prefs.view_mode) {
            (FocusedPane::Projects, _) => {
                "j/k: navigate | Enter: open | P: new | f: favorite | F: filter | Ctrl+P: go to | n: notifications | ?: help"
            }
            (FocusedPane::Tasks, ViewMode::Board) => {
                "h/l: column | j/k: navigate | </>: move task | Space: toggle | x: delete | v: view | ?: help"
            }
            (FocusedPane::Tasks, _) => {
                "j/k: navigate | Space: toggle | a: add | [/]: subtask | s: toggle subtask | x: delete | v: view | ?: help"
            }
        };
        let paragraph = Paragraph::new(help_text).style(Style::default().fg(colors.muted));
        frame.render_widget(paragraph, area);
    }

    fn render_notifications(&mut self, frame: &mut Frame, colors: &ThemeColors) {
        let popup_area = Self::centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, popup_area);

        let unread = self.notifications.iter().filter(|n| !n.read).count();
        let block = Block::default()
            .title(format!("Notifications ({unread} unread)"))
            .title_bottom("Enter: read | a: read all | x: delete | c: clear all | Esc: close")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(colors.accent))
            .style(Style::default().bg(colors.bg).fg(colors.fg));

        if self.notifications.is_empty() {
            let paragraph = Paragraph::new("No notifications")
                .block(block)
                .style(Style::default().fg(colors.muted));
            frame.render_widget(paragraph, popup_area);
            return;
        }

        let rows: Vec<Row> = self
            .notifications
            .iter()
            .map(|n| {
                let marker = if n.read { " " } else { "●" };
                let style = if n.read {
                    Style::default().fg(colors.muted)
                } else {
                    Style::default().fg(colors.fg)
                };
                Row::new(vec![
                    Cell::from(marker).style(Style::default().fg(Color::Yellow)),
                    Cell::from(n.title.clone()).style(style.add_modifier(Modifier::BOLD)),
                    Cell::from(n.message.clone()).style(style),
                    Cell::from(n.time.with_timezone(&Local).format("%b %d %H:%M").to_string())
                        .style(Style::default().fg(colors.muted)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Length(16),
                Constraint::Min(20),
                Constraint::Length(12),
            ],
        )
        .block(block)
        .highlight_style(Style::default().bg(colors.highlight));

        frame.render_stateful_widget(table, popup_area, &mut self.notification_state);
    }

    fn render_palette(&mut self, frame: &mut Frame, colors: &ThemeColors) {
        let popup_area = Self::centered_rect(50, 50, frame.area());
        frame.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(popup_area);

        self.search_bar.render(frame, chunks[0], colors);

        let rows: Vec<Row> = self
            .palette_results()
            .into_iter()
            .map(|p| {
                Row::new(vec![
                    Cell::from(p.name.clone()),
                    Cell::from(p.status.label()).style(Style::default().fg(status_color(p.status))),
                ])
            })
            .collect();
        let table = Table::new(rows, [Constraint::Min(10), Constraint::Length(11)])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(colors.border))
                    .style(Style::default().bg(colors.bg).fg(colors.fg)),
            )
            .highlight_style(Style::default().bg(colors.highlight));

        frame.render_stateful_widget(table, chunks[1], &mut self.palette_state);
    }

    fn render_input(&self, frame: &mut Frame, colors: &ThemeColors) {
        let area = frame.area();
        let width = area.width.saturating_sub(4).min(60);
        let popup_area = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + area.height.saturating_sub(3) / 2,
            width,
            height: 3.min(area.height),
        };
        frame.render_widget(Clear, popup_area);
        self.input_bar.render(frame, popup_area, colors);
    }

    fn render_help(&self, frame: &mut Frame, colors: &ThemeColors) {
        let popup_area = Self::centered_rect(60, 70, frame.area());

        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            "Project Tracker Help",
            "",
            "Navigation:",
            "  j/k or ↑/↓     - Move up/down",
            "  h/l or ←/→     - Switch pane / board column",
            "  Tab            - Switch between projects and tasks",
            "  Ctrl+P or :    - Go to project",
            "",
            "Tasks:",
            "  Space          - Toggle completion",
            "  < / >          - Move task to previous/next board column",
            "  x              - Delete task",
            "  a              - New task in selected project",
            "",
            "Subtasks (Details pane):",
            "  [ / ]          - Previous/next subtask",
            "  s              - Toggle subtask",
            "  D              - Delete subtask",
            "  A              - New subtask",
            "",
            "Projects:",
            "  P              - New project",
            "  f              - Toggle favorite",
            "  F              - Cycle status filter",
            "",
            "View:",
            "  v              - Cycle grid/list/board",
            "  t              - Toggle dark/light theme",
            "  b              - Collapse/expand sidebar",
            "  n              - Notifications",
            "  r              - Reload from server",
            "",
            "General:",
            "  ?              - Show this help",
            "  q              - Quit",
            "  Ctrl+C         - Force quit application",
            "",
            "Press any key to close this help",
        ]
        .join("\n");

        let paragraph = Paragraph::new(help_text)
            .block(Block::default().title("Help").borders(Borders::ALL))
            .style(Style::default().bg(colors.bg).fg(colors.fg))
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

pub async fn run_tui(mut app: App) -> Result<()> {
    // Set up terminal
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app).await;

    // Cleanup
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    app.initialize().await?;

    let mut event_handler = EventHandler::new();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let event = event_handler.next_event().await?;
        if app.handle_event(event).await? || event_handler.should_quit() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryLocalStore;
    use crate::domain::{Status, SubtaskId, TaskId};
    use crate::ports::{MockProjectRepository, MockTaskRepository, ProjectWithTasks};
    use chrono::Utc;
    use ratatui::backend::TestBackend;

    fn task(id: &str, project_id: &str) -> Task {
        Task {
            id: TaskId::from(id),
            project_id: ProjectId::from(project_id),
            text: format!("Task {id}"),
            completed: false,
            created_at: Utc::now(),
            due_date: None,
            priority: None,
            status: Some(Status::OnTrack),
            description: None,
            subtasks: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn subtask(id: &str, completed: bool) -> Subtask {
        Subtask {
            id: SubtaskId::from(id),
            task_id: TaskId::from("t1"),
            text: format!("Step {id}"),
            completed,
        }
    }

    fn app_with(tasks_repo: MockTaskRepository) -> App {
        let mut projects = MockProjectRepository::new();
        projects.expect_list_projects().returning(|| {
            let mut on_track = ProjectDraft::new("Website");
            on_track.status = Status::OnTrack;
            let mut delayed = ProjectDraft::new("Mobile App");
            delayed.status = Status::Delayed;
            Ok(vec![
                ProjectWithTasks {
                    project: Project::from_draft(ProjectId::from("website"), on_track),
                    tasks: vec![
                        Task {
                            subtasks: vec![subtask("s1", false), subtask("s2", false)],
                            ..task("t1", "website")
                        },
                        task("t2", "website"),
                    ],
                },
                ProjectWithTasks {
                    project: Project::from_draft(ProjectId::from("mobile-app"), delayed),
                    tasks: Vec::new(),
                },
            ])
        });
        let storage = Arc::new(MemoryLocalStore::new());
        App::new(
            Arc::new(ProjectStore::new(Arc::new(projects), Arc::new(tasks_repo))),
            Arc::new(NotificationCenter::load(storage.clone())),
            Arc::new(Preferences::load(storage)),
        )
    }

    #[test]
    fn test_step_selection_wraps() {
        let mut state = TableState::default();
        step_selection(&mut state, 3, false);
        assert_eq!(state.selected(), Some(2));
        step_selection(&mut state, 3, true);
        assert_eq!(state.selected(), Some(0));

        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
    }

    #[tokio::test]
    async fn test_space_toggles_selected_task() {
        let mut tasks = MockTaskRepository::new();
        tasks
            .expect_update_task()
            .withf(|id, patch| id.0 == "t1" && patch.completed == Some(true))
            .times(1)
            .returning(|id, _| Ok(task(&id.0, "website")));
        let mut app = app_with(tasks);
        app.initialize().await.unwrap();

        app.handle_event(AppEvent::Tab).await.unwrap();
        app.handle_event(AppEvent::Character(' ')).await.unwrap();

        assert_eq!(app.selected_task().map(|t| t.completed), Some(true));
        app.store.flush().await;
    }

    #[tokio::test]
    async fn test_board_move_changes_column() {
        let mut tasks = MockTaskRepository::new();
        tasks
            .expect_update_task()
            .withf(|_, patch| patch.status == Some(Status::AtRisk))
            .times(1)
            .returning(|id, _| Ok(task(&id.0, "website")));
        let mut app = app_with(tasks);
        app.initialize().await.unwrap();

        app.handle_event(AppEvent::Character('v')).await.unwrap();
        app.handle_event(AppEvent::Character('v')).await.unwrap();
        assert_eq!(app.prefs.view_mode, ViewMode::Grid);
        app.handle_event(AppEvent::Character('v')).await.unwrap();
        assert_eq!(app.prefs.view_mode, ViewMode::List);
        app.prefs.view_mode = ViewMode::Board;

        app.handle_event(AppEvent::Tab).await.unwrap();
        app.handle_event(AppEvent::Right).await.unwrap();
        assert_eq!(app.board_tasks().len(), 2);

        app.handle_event(AppEvent::Character('>')).await.unwrap();
        assert_eq!(app.board_column, 2);
        assert_eq!(app.selected_task().and_then(|t| t.status), Some(Status::AtRisk));
        app.store.flush().await;
    }

    #[tokio::test]
    async fn test_filter_and_palette_selection() {
        let mut app = app_with(MockTaskRepository::new());
        app.initialize().await.unwrap();

        app.handle_event(AppEvent::Character('F')).await.unwrap();
        assert_eq!(app.project_filter, ProjectFilter::OnTrack);
        assert_eq!(app.visible_projects().len(), 1);

        app.handle_event(AppEvent::OpenPalette).await.unwrap();
        for c in "mobile".chars() {
            app.handle_event(AppEvent::Character(c)).await.unwrap();
        }
        app.handle_event(AppEvent::Enter).await.unwrap();

        assert_eq!(app.mode, AppMode::Main);
        assert_eq!(app.project_filter, ProjectFilter::All);
        assert_eq!(app.selected_project().map(|p| p.name.as_str()), Some("Mobile App"));
    }

    #[tokio::test]
    async fn test_subtasks_toggle_and_delete_from_details() {
        let mut tasks = MockTaskRepository::new();
        tasks
            .expect_update_subtask()
            .withf(|id, patch| id.0 == "s2" && patch.completed == Some(true))
            .times(1)
            .returning(|id, _| Ok(subtask(&id.0, true)));
        tasks
            .expect_delete_subtask()
            .withf(|id| id.0 == "s1")
            .times(1)
            .returning(|_| Ok(()));
        let mut app = app_with(tasks);
        app.initialize().await.unwrap();
        app.handle_event(AppEvent::Tab).await.unwrap();

        app.handle_event(AppEvent::Character(']')).await.unwrap();
        app.handle_event(AppEvent::Character(']')).await.unwrap();
        assert_eq!(app.selected_subtask().map(|s| s.id.0.as_str()), Some("s2"));

        app.handle_event(AppEvent::Character('s')).await.unwrap();
        assert_eq!(app.selected_subtask().map(|s| s.completed), Some(true));

        app.handle_event(AppEvent::Character('[')).await.unwrap();
        app.handle_event(AppEvent::Character('D')).await.unwrap();
        let remaining: Vec<_> = app
            .selected_task()
            .unwrap()
            .subtasks
            .iter()
            .map(|s| s.id.0.clone())
            .collect();
        assert_eq!(remaining, vec!["s2"]);
        assert_eq!(app.selected_subtask().map(|s| s.id.0.as_str()), Some("s2"));
        assert_eq!(app.store.flush().await.failed, 0);
    }

    #[tokio::test]
    async fn test_new_task_prompt_adds_to_selected_project() {
        let mut tasks = MockTaskRepository::new();
        tasks
            .expect_create_task()
            .withf(|project_id, draft| project_id.0 == "website" && draft.text == "Ship it?")
            .times(1)
            .returning(|_, draft| {
                Ok(Task {
                    text: draft.text.clone(),
                    ..task("t9", "website")
                })
            });
        let mut app = app_with(tasks);
        app.initialize().await.unwrap();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        app.handle_event(AppEvent::Character('a')).await.unwrap();
        assert_eq!(app.mode, AppMode::Input(InputTarget::Task));
        for c in "Ship it".chars() {
            app.handle_event(AppEvent::Character(c)).await.unwrap();
        }
        app.handle_event(AppEvent::ShowHelp).await.unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        app.handle_event(AppEvent::Enter).await.unwrap();

        assert_eq!(app.mode, AppMode::Main);
        assert_eq!(app.current_tasks().len(), 3);
        assert_eq!(app.selected_task().map(|t| t.text.as_str()), Some("Ship it?"));
    }

    #[tokio::test]
    async fn test_empty_prompt_adds_nothing() {
        let mut app = app_with(MockTaskRepository::new());
        app.initialize().await.unwrap();

        app.handle_event(AppEvent::Character('P')).await.unwrap();
        app.handle_event(AppEvent::Character(' ')).await.unwrap();
        app.handle_event(AppEvent::Enter).await.unwrap();

        assert_eq!(app.mode, AppMode::Main);
        assert_eq!(app.snapshot.projects.len(), 2);
    }

    #[tokio::test]
    async fn test_renders_every_view_mode() {
        let mut app = app_with(MockTaskRepository::new());
        app.initialize().await.unwrap();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        for mode in ViewMode::ALL {
            app.prefs.view_mode = mode;
            terminal.draw(|frame| app.render(frame)).unwrap();
        }
        app.mode = AppMode::Notifications;
        terminal.draw(|frame| app.render(frame)).unwrap();
        app.mode = AppMode::Help;
        terminal.draw(|frame| app.render(frame)).unwrap();
    }
}
