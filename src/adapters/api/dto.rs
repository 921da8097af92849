use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::*;
use crate::ports::ProjectWithTasks;

#[derive(Debug, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

// DTOs for API communication
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    pub status: Status,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Only present on the list endpoint.
    #[serde(default, deserialize_with = "skip_invalid_tasks")]
    pub tasks: Vec<TaskDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskDto>,
    #[serde(default)]
    pub tags: Vec<TagDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDto {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Tags arrive as records (`{"id": .., "text": ..}`); plain strings are
/// accepted too.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagDto {
    Record { text: String },
    Text(String),
}

impl TagDto {
    pub fn into_text(self) -> String {
        match self {
            TagDto::Record { text } | TagDto::Text(text) => text,
        }
    }
}

/// Decodes every element on its own. Elements that do not decode are logged
/// and dropped so one bad record cannot hide the rest of the list.
fn decode_each<T: DeserializeOwned>(values: Vec<Value>, kind: &str) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| {
            let id = value.get("id").and_then(Value::as_str).unwrap_or("?").to_string();
            match serde_json::from_value(value) {
                Ok(dto) => Some(dto),
                Err(e) => {
                    tracing::warn!("Skipping {} {}: {}", kind, id, e);
                    None
                }
            }
        })
        .collect()
}

fn skip_invalid_tasks<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<TaskDto>, D::Error> {
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(decode_each(values, "task"))
}

/// `GET /projects` payload to domain records, skipping projects or tasks
/// that fail to decode.
pub fn decode_project_list(values: Vec<Value>) -> Vec<ProjectWithTasks> {
    decode_each::<ProjectDto>(values, "project")
        .into_iter()
        .map(ProjectDto::into_project_with_tasks)
        .collect()
}

// Request DTOs
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateDto {
    pub id: String,
    pub name: String,
    pub url: String,
    pub audience: String,
    pub is_favorite: bool,
    pub status: Status,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatchDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateDto {
    pub project_id: String,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub status: Status,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub subtasks: Vec<SubtaskSeedDto>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubtaskSeedDto {
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatchDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SubtaskCreateDto {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubtaskPatchDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

// Conversion implementations
impl ProjectDto {
    pub fn into_project_with_tasks(mut self) -> ProjectWithTasks {
        let project_id = ProjectId(self.id.clone());
        let tasks = std::mem::take(&mut self.tasks)
            .into_iter()
            .map(|dto| dto.into_task(&project_id))
            .collect();
        ProjectWithTasks {
            project: self.into(),
            tasks,
        }
    }
}

impl From<ProjectDto> for Project {
    fn from(dto: ProjectDto) -> Self {
        Self {
            id: ProjectId(dto.id),
            name: dto.name,
            url: dto.url,
            audience: dto.audience,
            is_favorite: dto.is_favorite.unwrap_or(false),
            status: dto.status,
            priority: dto.priority,
            start_date: dto.start_date,
            end_date: dto.end_date,
            logo_url: dto.logo_url,
        }
    }
}

impl TaskDto {
    /// `owner` fills in the project id when the payload omits it.
    pub fn into_task(self, owner: &ProjectId) -> Task {
        let id = TaskId(self.id);
        let subtasks = self
            .subtasks
            .into_iter()
            .map(|dto| dto.into_subtask(&id))
            .collect();
        Task {
            project_id: self.project_id.map(ProjectId).unwrap_or_else(|| owner.clone()),
            text: self.text,
            completed: self.completed,
            created_at: self.created_at,
            due_date: self.due_date,
            priority: self.priority,
            status: self.status,
            description: self.description,
            subtasks,
            tags: normalize_tags(self.tags.into_iter().map(TagDto::into_text)),
            id,
        }
    }
}

impl SubtaskDto {
    pub fn into_subtask(self, owner: &TaskId) -> Subtask {
        Subtask {
            id: SubtaskId(self.id),
            task_id: self.task_id.map(TaskId).unwrap_or_else(|| owner.clone()),
            text: self.text,
            completed: self.completed,
        }
    }
}

impl From<&Project> for ProjectCreateDto {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.0.clone(),
            name: project.name.clone(),
            url: project.url.clone(),
            audience: project.audience.clone(),
            is_favorite: project.is_favorite,
            status: project.status,
            priority: project.priority,
            start_date: project.start_date,
            end_date: project.end_date,
            logo_url: project.logo_url.clone(),
        }
    }
}

impl From<&ProjectUpdate> for ProjectPatchDto {
    fn from(update: &ProjectUpdate) -> Self {
        Self {
            name: update.name.clone(),
            url: update.url.clone(),
            audience: update.audience.clone(),
            is_favorite: update.is_favorite,
            status: update.status,
            priority: update.priority,
            start_date: update.start_date,
            end_date: update.end_date,
            logo_url: update.logo_url.clone(),
        }
    }
}

impl TaskCreateDto {
    pub fn new(project_id: &ProjectId, draft: &TaskDraft) -> Self {
        Self {
            project_id: project_id.0.clone(),
            text: draft.text.clone(),
            completed: false,
            priority: draft.priority,
            status: draft.status,
            description: draft.description.clone(),
            due_date: draft.due_date,
            subtasks: draft
                .subtasks
                .iter()
                .map(|text| SubtaskSeedDto {
                    text: text.clone(),
                    completed: false,
                })
                .collect(),
            tags: normalize_tags(&draft.tags),
        }
    }
}

impl From<&TaskUpdate> for TaskPatchDto {
    fn from(update: &TaskUpdate) -> Self {
        Self {
            text: update.text.clone(),
            completed: update.completed,
            priority: update.priority,
            status: update.status,
            description: update.description.clone(),
            due_date: update.due_date,
            created_at: update.created_at,
            tags: update.tags.as_ref().map(|tags| normalize_tags(tags)),
        }
    }
}

impl From<&SubtaskUpdate> for SubtaskPatchDto {
    fn from(update: &SubtaskUpdate) -> Self {
        Self {
            text: update.text.clone(),
            completed: update.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_payload_flattens_tags_and_nests_subtasks() {
        let payload = json!([{
            "id": "my-site",
            "name": "My Site",
            "url": "https://my.site",
            "audience": "Customers",
            "isFavorite": true,
            "status": "on-track",
            "priority": "high",
            "startDate": "2024-03-01T00:00:00.000Z",
            "endDate": "2024-06-01T00:00:00.000Z",
            "logoUrl": null,
            "tasks": [{
                "id": "t1",
                "text": "Write landing copy",
                "completed": false,
                "createdAt": "2024-03-04T09:30:00.000Z",
                "dueDate": null,
                "priority": "urgent",
                "status": null,
                "description": null,
                "projectId": "my-site",
                "subtasks": [{ "id": "s1", "text": "Hero", "completed": true, "taskId": "t1" }],
                "tags": [{ "id": "g1", "text": "copy" }, { "id": "g2", "text": "launch" }]
            }]
        }]);

        let values: Vec<Value> = serde_json::from_value(payload).unwrap();
        let loaded = decode_project_list(values);

        assert_eq!(loaded.len(), 1);
        let entry = &loaded[0];
        assert_eq!(entry.project.id, ProjectId::from("my-site"));
        assert!(entry.project.is_favorite);
        assert_eq!(entry.project.logo_url, None);

        let task = &entry.tasks[0];
        assert_eq!(task.tags, vec!["copy", "launch"]);
        assert_eq!(task.priority, Some(Priority::Urgent));
        assert_eq!(task.status, None);
        assert_eq!(task.subtasks[0].id, SubtaskId::from("s1"));
        assert!(task.subtasks[0].completed);
    }

    #[test]
    fn test_records_that_fail_to_decode_are_skipped() {
        let payload = json!([
            {
                "id": "broken",
                "name": "Broken",
                "status": "archived",
                "priority": "low",
                "startDate": "2024-03-01T00:00:00Z",
                "endDate": "2024-06-01T00:00:00Z"
            },
            {
                "id": "website",
                "name": "Website",
                "status": "at-risk",
                "priority": "low",
                "startDate": "2024-03-01T00:00:00Z",
                "endDate": "2024-06-01T00:00:00Z",
                "tasks": [
                    { "id": "t1", "text": "Ok", "createdAt": "2024-03-04T09:30:00Z" },
                    { "id": "t2", "text": "Bad", "createdAt": "2024-03-04T09:30:00Z", "status": "someday" },
                    { "id": "t3", "text": "No date" }
                ]
            }
        ]);

        let values: Vec<Value> = serde_json::from_value(payload).unwrap();
        let loaded = decode_project_list(values);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].project.id, ProjectId::from("website"));
        assert_eq!(loaded[0].project.status, Status::AtRisk);
        let ids: Vec<_> = loaded[0].tasks.iter().map(|t| t.id.0.as_str()).collect();
        assert_eq!(ids, vec!["t1"]);
    }

    #[test]
    fn test_task_without_project_id_uses_owner() {
        let dto: TaskDto = serde_json::from_value(json!({
            "id": "t9",
            "text": "Loose",
            "createdAt": "2024-03-04T09:30:00Z",
            "tags": ["plain"]
        }))
        .unwrap();

        let task = dto.into_task(&ProjectId::from("owner"));
        assert_eq!(task.project_id, ProjectId::from("owner"));
        assert_eq!(task.tags, vec!["plain"]);
        assert!(!task.completed);
    }

    #[test]
    fn test_task_patch_skips_absent_fields_and_nulls_cleared_ones() {
        let update = TaskUpdate {
            completed: Some(true),
            due_date: Some(None),
            ..Default::default()
        };

        let body = serde_json::to_value(TaskPatchDto::from(&update)).unwrap();
        assert_eq!(body, json!({ "completed": true, "dueDate": null }));
    }

    #[test]
    fn test_project_create_body_carries_client_id() {
        let project = Project::from_draft(ProjectId::from("my-site"), ProjectDraft::new("My Site"));
        let body = serde_json::to_value(ProjectCreateDto::from(&project)).unwrap();

        assert_eq!(body["id"], "my-site");
        assert_eq!(body["isFavorite"], false);
        assert_eq!(body["status"], "not-started");
    }
}
