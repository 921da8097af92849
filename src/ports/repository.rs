use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    Project, ProjectId, ProjectUpdate, Subtask, SubtaskId, SubtaskUpdate, Task, TaskDraft, TaskId,
    TaskUpdate,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A project as listed by the persistence API, with its nested tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectWithTasks {
    pub project: Project,
    pub tasks: Vec<Task>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list_projects(&self) -> RepositoryResult<Vec<ProjectWithTasks>>;
    /// The id is chosen by the client and sent along with the record.
    async fn create_project(&self, project: &Project) -> RepositoryResult<Project>;
    async fn update_project(&self, id: &ProjectId, patch: &ProjectUpdate)
        -> RepositoryResult<Project>;
    async fn delete_project(&self, id: &ProjectId) -> RepositoryResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create_task(&self, project_id: &ProjectId, draft: &TaskDraft)
        -> RepositoryResult<Task>;
    async fn update_task(&self, id: &TaskId, patch: &TaskUpdate) -> RepositoryResult<Task>;
    async fn delete_task(&self, id: &TaskId) -> RepositoryResult<()>;
    async fn add_subtask(&self, task_id: &TaskId, text: &str) -> RepositoryResult<Subtask>;
    async fn update_subtask(&self, id: &SubtaskId, patch: &SubtaskUpdate)
        -> RepositoryResult<Subtask>;
    async fn delete_subtask(&self, id: &SubtaskId) -> RepositoryResult<()>;
}
