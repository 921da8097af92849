use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{DomainError, DomainResult};
use super::tag::normalize_tags;
use super::{Priority, ProjectId, Status, Subtask};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub description: Option<String>,
    pub subtasks: Vec<Subtask>,
    pub tags: Vec<String>,
}

impl Task {
    /// Calendar day of creation in the local time zone.
    pub fn created_on_local(&self) -> NaiveDate {
        self.created_at.with_timezone(&Local).date_naive()
    }

    /// Whole days an incomplete task has been open past its creation day.
    /// `None` when the task is completed or was created on or after `today`.
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        if self.completed {
            return None;
        }
        let created = self.created_on_local();
        if created < today {
            Some((today - created).num_days())
        } else {
            None
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.days_overdue(today).is_some()
    }

    pub fn created_in_month(&self, month: MonthKey) -> bool {
        MonthKey::from_date(self.created_on_local()) == month
    }

    /// Due date, falling back to the creation time.
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.due_date.unwrap_or(self.created_at)
    }

    pub fn priority_or_default(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|st| st.completed).count()
    }

    /// Format due date for display
    pub fn due_date_display(&self) -> String {
        match self.due_date {
            None => "No due date".to_string(),
            Some(due) => {
                let today = Local::now().date_naive();
                let days_diff = (due.with_timezone(&Local).date_naive() - today).num_days();

                match days_diff {
                    0 => "Today".to_string(),
                    1 => "Tomorrow".to_string(),
                    -1 => "Yesterday".to_string(),
                    d if d < 0 => {
                        let days = -d;
                        format!("{days} days ago")
                    }
                    d if d <= 7 => format!("In {d} days"),
                    _ => due.format("%Y-%m-%d").to_string(),
                }
            }
        }
    }

    pub fn apply(&mut self, patch: &TaskUpdate) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = Some(priority);
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = created_at;
        }
        if let Some(tags) = &patch.tags {
            self.tags = normalize_tags(tags);
        }
    }
}

/// A task as entered by the user; the server assigns id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub text: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: Status,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub subtasks: Vec<String>,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            due_date: None,
            priority: Priority::Medium,
            status: Status::OnTrack,
            description: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
        }
    }
}

impl TaskDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.text.trim().is_empty() {
            return Err(DomainError::MissingField("text".to_string()));
        }
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` (start of that day, local time) or a full RFC 3339
/// timestamp.
pub fn parse_due_date(s: &str) -> DomainResult<DateTime<Utc>> {
    let invalid = || DomainError::InvalidDate(s.to_string());
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())?;
    day.and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// Partial task patch. `tags` replaces the whole set when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub created_at: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidMonth(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn task_created_at(created_at: DateTime<Utc>) -> Task {
        Task {
            id: TaskId::from("t1"),
            project_id: ProjectId::from("p1"),
            text: "Write copy".to_string(),
            completed: false,
            created_at,
            due_date: None,
            priority: None,
            status: None,
            description: None,
            subtasks: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_parse_due_date() {
        let day = parse_due_date("2024-03-15").unwrap();
        assert_eq!(
            day.with_timezone(&Local).date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );

        let exact = parse_due_date("2024-03-15T09:30:00Z").unwrap();
        assert_eq!(exact, Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap());

        assert_eq!(
            parse_due_date("15/03/2024"),
            Err(DomainError::InvalidDate("15/03/2024".to_string()))
        );
    }

    #[test]
    fn test_draft_requires_text() {
        assert!(TaskDraft::new("  ").validate().is_err());
        assert!(TaskDraft::new("Ship it").validate().is_ok());
    }

    #[test]
    fn test_month_key_parsing() {
        let month: MonthKey = "2024-03".parse().unwrap();
        assert_eq!(month, MonthKey { year: 2024, month: 3 });
        assert_eq!(month.to_string(), "2024-03");

        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("2024-3".parse::<MonthKey>().is_err());
        assert!("March".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_created_in_month_ignores_due_date() {
        let mut task = task_created_at(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
        task.due_date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

        assert!(task.created_in_month("2024-03".parse().unwrap()));
        assert!(!task.created_in_month("2024-05".parse().unwrap()));
    }

    #[test]
    fn test_days_overdue() {
        let now = Local::now();
        let today = now.date_naive();

        let fresh = task_created_at(now.with_timezone(&Utc));
        assert_eq!(fresh.days_overdue(today), None);

        let old = task_created_at((now - Duration::days(3)).with_timezone(&Utc));
        assert_eq!(old.days_overdue(today), Some(3));

        let mut done = old.clone();
        done.completed = true;
        assert_eq!(done.days_overdue(today), None);
    }

    #[test]
    fn test_apply_replaces_tag_set() {
        let mut task = task_created_at(Utc::now());
        task.tags = vec!["a".to_string(), "b".to_string()];
        task.apply(&TaskUpdate {
            tags: Some(vec!["c".to_string(), "c".to_string()]),
            due_date: Some(None),
            ..Default::default()
        });
        assert_eq!(task.tags, vec!["c"]);
        assert_eq!(task.due_date, None);
    }
}
