//! Read-only views derived from a [`Snapshot`]: dashboard counters, analytics,
//! kanban grouping, the all-tasks listing, calendar days and project search.
//! Everything here is recomputed from scratch on each call.

use chrono::{Local, NaiveDate};
use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::DomainError;
use super::{Priority, Project, ProjectId, Snapshot, Status, Task, TaskUpdate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectProgress {
    pub completed: usize,
    pub total: usize,
}

impl ProjectProgress {
    pub fn of(tasks: &[Task]) -> Self {
        Self {
            completed: tasks.iter().filter(|t| t.completed).count(),
            total: tasks.len(),
        }
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
}

impl DashboardStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let completed_tasks = snapshot
            .tasks
            .values()
            .flatten()
            .filter(|t| t.completed)
            .count();
        Self {
            total_projects: snapshot.projects.len(),
            completed_tasks,
            pending_tasks: snapshot.task_count() - completed_tasks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_id: ProjectId,
    pub name: String,
    pub progress: ProjectProgress,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: f64,
    pub at_risk_tasks: usize,
    pub total_projects: usize,
    /// Only priorities with at least one task, low to urgent.
    pub priority_breakdown: Vec<(Priority, usize)>,
    pub project_status_counts: Vec<(Status, usize)>,
    pub projects: Vec<ProjectSummary>,
}

impl AnalyticsSummary {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let all: Vec<&Task> = snapshot.project_tasks().map(|(_, t)| t).collect();
        let completed_tasks = all.iter().filter(|t| t.completed).count();
        let completion_rate = if all.is_empty() {
            0.0
        } else {
            completed_tasks as f64 / all.len() as f64 * 100.0
        };

        let priority_breakdown = Priority::ALL
            .into_iter()
            .map(|p| (p, all.iter().filter(|t| t.priority == Some(p)).count()))
            .filter(|(_, count)| *count > 0)
            .collect();

        let project_status_counts = [Status::OnTrack, Status::AtRisk, Status::Delayed, Status::OnHold]
            .into_iter()
            .map(|s| (s, snapshot.projects.iter().filter(|p| p.status == s).count()))
            .collect();

        let projects = snapshot
            .projects
            .iter()
            .map(|p| {
                let progress = ProjectProgress::of(snapshot.tasks_for(&p.id));
                ProjectSummary {
                    project_id: p.id.clone(),
                    name: p.name.clone(),
                    percent: progress.percent(),
                    progress,
                }
            })
            .collect();

        Self {
            total_tasks: all.len(),
            completed_tasks,
            completion_rate,
            at_risk_tasks: all.iter().filter(|t| t.status == Some(Status::AtRisk)).count(),
            total_projects: snapshot.projects.len(),
            priority_breakdown,
            project_status_counts,
            projects,
        }
    }
}

/// Kanban board column. Status is only used for grouping; completion wins
/// over status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardColumn {
    ToDo,
    OnTrack,
    AtRisk,
    Delayed,
    OnHold,
    Completed,
}

impl BoardColumn {
    pub const ALL: [BoardColumn; 6] = [
        BoardColumn::ToDo,
        BoardColumn::OnTrack,
        BoardColumn::AtRisk,
        BoardColumn::Delayed,
        BoardColumn::OnHold,
        BoardColumn::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoardColumn::ToDo => "not-started",
            BoardColumn::OnTrack => "on-track",
            BoardColumn::AtRisk => "at-risk",
            BoardColumn::Delayed => "delayed",
            BoardColumn::OnHold => "on-hold",
            BoardColumn::Completed => "completed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BoardColumn::ToDo => "To Do",
            BoardColumn::OnTrack => "On Track",
            BoardColumn::AtRisk => "At Risk",
            BoardColumn::Delayed => "Delayed",
            BoardColumn::OnHold => "On Hold",
            BoardColumn::Completed => "Completed",
        }
    }

    pub fn contains(&self, task: &Task) -> bool {
        match self {
            BoardColumn::Completed => task.completed,
            BoardColumn::ToDo => {
                !task.completed && matches!(task.status, None | Some(Status::NotStarted))
            }
            other => !task.completed && task.status == other.status(),
        }
    }

    fn status(&self) -> Option<Status> {
        match self {
            BoardColumn::ToDo => Some(Status::NotStarted),
            BoardColumn::OnTrack => Some(Status::OnTrack),
            BoardColumn::AtRisk => Some(Status::AtRisk),
            BoardColumn::Delayed => Some(Status::Delayed),
            BoardColumn::OnHold => Some(Status::OnHold),
            BoardColumn::Completed => None,
        }
    }

    /// Patch that places a task in this column.
    pub fn move_patch(&self) -> TaskUpdate {
        match self.status() {
            None => TaskUpdate::completed(true),
            Some(status) => TaskUpdate {
                completed: Some(false),
                status: Some(status),
                ..Default::default()
            },
        }
    }
}

impl fmt::Display for BoardColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardColumn {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoardColumn::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::InvalidColumn(s.to_string()))
    }
}

pub fn kanban_columns(tasks: &[Task]) -> Vec<(BoardColumn, Vec<&Task>)> {
    BoardColumn::ALL
        .into_iter()
        .map(|column| (column, tasks.iter().filter(|t| column.contains(t)).collect()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskListing {
    pub project_id: ProjectId,
    pub project_name: String,
    pub task: Task,
}

/// Every task across projects, most recent due date (or creation time when
/// undated) first.
pub fn all_tasks_sorted(snapshot: &Snapshot) -> Vec<TaskListing> {
    let mut listings: Vec<TaskListing> = snapshot
        .project_tasks()
        .map(|(project, task)| TaskListing {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            task: task.clone(),
        })
        .collect();
    listings.sort_by(|a, b| b.task.effective_date().cmp(&a.task.effective_date()));
    listings
}

pub fn filter_listings(listings: Vec<TaskListing>, query: &str) -> Vec<TaskListing> {
    if query.is_empty() {
        return listings;
    }
    let query = query.to_lowercase();
    listings
        .into_iter()
        .filter(|l| {
            l.task.text.to_lowercase().contains(&query)
                || l.project_name.to_lowercase().contains(&query)
        })
        .collect()
}

/// Tasks created on `day` (local calendar), for the calendar view.
pub fn tasks_on_day(snapshot: &Snapshot, day: NaiveDate) -> Vec<TaskListing> {
    snapshot
        .project_tasks()
        .filter(|(_, task)| task.created_on_local() == day)
        .map(|(project, task)| TaskListing {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            task: task.clone(),
        })
        .collect()
}

pub fn tasks_today(snapshot: &Snapshot) -> Vec<TaskListing> {
    tasks_on_day(snapshot, Local::now().date_naive())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectFilter {
    #[default]
    All,
    OnTrack,
    AtRisk,
    Delayed,
}

impl ProjectFilter {
    pub const ALL: [ProjectFilter; 4] = [
        ProjectFilter::All,
        ProjectFilter::OnTrack,
        ProjectFilter::AtRisk,
        ProjectFilter::Delayed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectFilter::All => "All Projects",
            ProjectFilter::OnTrack => "On Track",
            ProjectFilter::AtRisk => "At Risk",
            ProjectFilter::Delayed => "Delayed",
        }
    }

    pub fn matches(&self, project: &Project) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::OnTrack => project.status == Status::OnTrack,
            ProjectFilter::AtRisk => project.status == Status::AtRisk,
            ProjectFilter::Delayed => project.status == Status::Delayed,
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Fuzzy project lookup by name for the command palette, best match first.
/// An empty query returns every project in list order.
pub fn search_projects<'a>(projects: &'a [Project], query: &str) -> Vec<&'a Project> {
    let query = query.trim();
    if query.is_empty() {
        return projects.iter().collect();
    }

    let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
    let mut matcher = Matcher::new(Config::DEFAULT);
    let mut buf = Vec::new();

    let mut scored: Vec<(&Project, u32)> = projects
        .iter()
        .filter_map(|p| {
            pattern
                .score(Utf32Str::new(&p.name, &mut buf), &mut matcher)
                .map(|score| (p, score))
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(p, _)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProjectDraft, TaskId};
    use chrono::{TimeZone, Utc};

    fn project(id: &str, name: &str, status: Status) -> Project {
        let mut draft = ProjectDraft::new(name);
        draft.status = status;
        Project::from_draft(ProjectId::from(id), draft)
    }

    fn task(id: &str, project: &str, completed: bool, status: Option<Status>) -> Task {
        Task {
            id: TaskId::from(id),
            project_id: ProjectId::from(project),
            text: format!("task {id}"),
            completed,
            created_at: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            due_date: None,
            priority: None,
            status,
            description: None,
            subtasks: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot {
            projects: vec![
                project("site", "Marketing Site", Status::OnTrack),
                project("app", "Mobile App", Status::AtRisk),
            ],
            ..Default::default()
        };
        snapshot.tasks.insert(
            ProjectId::from("site"),
            vec![
                task("t1", "site", true, Some(Status::OnTrack)),
                task("t2", "site", false, None),
                task("t3", "site", false, Some(Status::AtRisk)),
            ],
        );
        snapshot
            .tasks
            .insert(ProjectId::from("app"), vec![task("t4", "app", false, Some(Status::OnHold))]);
        snapshot
    }

    #[test]
    fn test_dashboard_stats() {
        let stats = DashboardStats::from_snapshot(&snapshot());
        assert_eq!(
            stats,
            DashboardStats {
                total_projects: 2,
                completed_tasks: 1,
                pending_tasks: 3
            }
        );
    }

    #[test]
    fn test_progress_percent() {
        let snap = snapshot();
        let progress = ProjectProgress::of(snap.tasks_for(&ProjectId::from("site")));
        assert_eq!(progress, ProjectProgress { completed: 1, total: 3 });
        assert_eq!(progress.percent(), 33);
        assert_eq!(ProjectProgress::default().percent(), 0);
    }

    #[test]
    fn test_analytics_drops_empty_priorities() {
        let mut snap = snapshot();
        snap.tasks.get_mut(&ProjectId::from("site")).unwrap()[0].priority = Some(Priority::High);

        let summary = AnalyticsSummary::from_snapshot(&snap);
        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.at_risk_tasks, 1);
        assert_eq!(summary.priority_breakdown, vec![(Priority::High, 1)]);
        assert_eq!(summary.completion_rate, 25.0);
        assert!(summary.project_status_counts.contains(&(Status::AtRisk, 1)));
    }

    #[test]
    fn test_kanban_grouping() {
        let snap = snapshot();
        let columns = kanban_columns(snap.tasks_for(&ProjectId::from("site")));
        let ids = |col: BoardColumn| -> Vec<String> {
            columns
                .iter()
                .find(|(c, _)| *c == col)
                .map(|(_, tasks)| tasks.iter().map(|t| t.id.0.clone()).collect())
                .unwrap_or_default()
        };

        assert_eq!(ids(BoardColumn::Completed), vec!["t1"]);
        assert_eq!(ids(BoardColumn::ToDo), vec!["t2"]);
        assert_eq!(ids(BoardColumn::AtRisk), vec!["t3"]);
        assert!(ids(BoardColumn::OnTrack).is_empty());
    }

    #[test]
    fn test_move_patch() {
        assert_eq!(BoardColumn::Completed.move_patch(), TaskUpdate::completed(true));
        let patch = BoardColumn::Delayed.move_patch();
        assert_eq!(patch.completed, Some(false));
        assert_eq!(patch.status, Some(Status::Delayed));
        assert_eq!("on-hold".parse::<BoardColumn>().unwrap(), BoardColumn::OnHold);
    }

    #[test]
    fn test_all_tasks_sorted_newest_first() {
        let mut snap = snapshot();
        let site = snap.tasks.get_mut(&ProjectId::from("site")).unwrap();
        site[1].due_date = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());

        let listings = all_tasks_sorted(&snap);
        assert_eq!(listings[0].task.id, TaskId::from("t2"));
        assert_eq!(listings.len(), 4);

        let filtered = filter_listings(listings, "mobile");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].task.id, TaskId::from("t4"));
    }

    #[test]
    fn test_project_filter() {
        let snap = snapshot();
        let at_risk: Vec<_> = snap
            .projects
            .iter()
            .filter(|p| ProjectFilter::AtRisk.matches(p))
            .collect();
        assert_eq!(at_risk.len(), 1);
        assert_eq!(ProjectFilter::Delayed.next(), ProjectFilter::All);
    }

    #[test]
    fn test_search_projects_fuzzy() {
        let snap = snapshot();
        let hits = search_projects(&snap.projects, "mbl");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ProjectId::from("app"));

        assert_eq!(search_projects(&snap.projects, "").len(), 2);
        assert!(search_projects(&snap.projects, "zzz").is_empty());
    }
}
