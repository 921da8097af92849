use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Project, ProjectId, Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl NotificationId {
    /// At most one overdue notice exists per task, so its id is derived
    /// from the task id.
    pub fn overdue(task_id: &TaskId) -> Self {
        NotificationId(format!("overdue-{}", task_id.0))
    }

    pub fn random() -> Self {
        NotificationId(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NotificationId {
    fn from(s: String) -> Self {
        NotificationId(s)
    }
}

impl From<&str> for NotificationId {
    fn from(s: &str) -> Self {
        NotificationId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Persisted with camelCase keys so the stored list keeps the shape the
/// dashboard has always written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
}

impl Notification {
    pub fn overdue(task: &Task, project: &Project, days_late: i64, now: DateTime<Utc>) -> Self {
        let plural = if days_late > 1 { "s" } else { "" };
        Self {
            id: NotificationId::overdue(&task.id),
            title: "Task Overdue".to_string(),
            message: format!(
                "Task \"{}\" in {} was due {} day{} ago.",
                task.text, project.name, days_late, plural
            ),
            time: now,
            kind: NotificationKind::Warning,
            read: false,
            related_task_id: Some(task.id.clone()),
            project_id: Some(project.id.clone()),
        }
    }

    pub fn from_draft(draft: NotificationDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::random(),
            title: draft.title,
            message: draft.message,
            time: now,
            kind: draft.kind,
            read: false,
            related_task_id: draft.related_task_id,
            project_id: draft.project_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_task_id: Option<TaskId>,
    pub project_id: Option<ProjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overdue_id_is_derived_from_task() {
        assert_eq!(NotificationId::overdue(&TaskId::from("t1")).0, "overdue-t1");
    }

    #[test]
    fn test_stored_shape_uses_type_key() {
        let notification = Notification {
            id: NotificationId::from("n1"),
            title: "Saved".to_string(),
            message: "Project saved".to_string(),
            time: Utc::now(),
            kind: NotificationKind::Success,
            read: false,
            related_task_id: None,
            project_id: Some(ProjectId::from("p1")),
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "success");
        assert_eq!(value["projectId"], "p1");
        assert!(value.get("relatedTaskId").is_none());

        let back: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(back, notification);
    }
}
