use async_trait::async_trait;

use super::{
    decode_project_list, PtmsClient, ProjectCreateDto, ProjectDto, ProjectPatchDto,
    SubtaskCreateDto, SubtaskDto, SubtaskPatchDto, TaskCreateDto, TaskDto, TaskPatchDto,
};
use crate::{
    domain::*,
    ports::{ProjectRepository, ProjectWithTasks, RepositoryResult, TaskRepository},
};

/// Both repository ports over the REST persistence API.
#[derive(Clone)]
pub struct HttpRepository {
    client: PtmsClient,
}

impl HttpRepository {
    pub fn new(client: PtmsClient) -> Self {
        Self { client }
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl ProjectRepository for HttpRepository {
    async fn list_projects(&self) -> RepositoryResult<Vec<ProjectWithTasks>> {
        let payload: Vec<serde_json::Value> = self.client.get("/projects").await?;
        Ok(decode_project_list(payload))
    }

    async fn create_project(&self, project: &Project) -> RepositoryResult<Project> {
        let create_dto = ProjectCreateDto::from(project);
        let project_dto: ProjectDto = self.client.post("/projects", &create_dto).await?;
        Ok(project_dto.into())
    }

    async fn update_project(
        &self,
        id: &ProjectId,
        patch: &ProjectUpdate,
    ) -> RepositoryResult<Project> {
        let path = format!("/projects/{}", segment(&id.0));
        let patch_dto = ProjectPatchDto::from(patch);
        let project_dto: ProjectDto = self.client.patch(&path, &patch_dto).await?;
        Ok(project_dto.into())
    }

    async fn delete_project(&self, id: &ProjectId) -> RepositoryResult<()> {
        let path = format!("/projects/{}", segment(&id.0));
        self.client.delete(&path).await
    }
}

#[async_trait]
impl TaskRepository for HttpRepository {
    async fn create_task(&self, project_id: &ProjectId, draft: &TaskDraft) -> RepositoryResult<Task> {
        let create_dto = TaskCreateDto::new(project_id, draft);
        let task_dto: TaskDto = self.client.post("/tasks", &create_dto).await?;
        Ok(task_dto.into_task(project_id))
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskUpdate) -> RepositoryResult<Task> {
        let path = format!("/tasks/{}", segment(&id.0));
        let patch_dto = TaskPatchDto::from(patch);
        let task_dto: TaskDto = self.client.patch(&path, &patch_dto).await?;
        // PATCH responses always carry projectId; the fallback is never used.
        let owner = ProjectId(task_dto.project_id.clone().unwrap_or_default());
        Ok(task_dto.into_task(&owner))
    }

    async fn delete_task(&self, id: &TaskId) -> RepositoryResult<()> {
        let path = format!("/tasks/{}", segment(&id.0));
        self.client.delete(&path).await
    }

    async fn add_subtask(&self, task_id: &TaskId, text: &str) -> RepositoryResult<Subtask> {
        let path = format!("/tasks/{}/subtasks", segment(&task_id.0));
        let create_dto = SubtaskCreateDto {
            text: text.to_string(),
        };
        let subtask_dto: SubtaskDto = self.client.post(&path, &create_dto).await?;
        Ok(subtask_dto.into_subtask(task_id))
    }

    async fn update_subtask(
        &self,
        id: &SubtaskId,
        patch: &SubtaskUpdate,
    ) -> RepositoryResult<Subtask> {
        let path = format!("/subtasks/{}", segment(&id.0));
        let patch_dto = SubtaskPatchDto::from(patch);
        let subtask_dto: SubtaskDto = self.client.patch(&path, &patch_dto).await?;
        let owner = TaskId(subtask_dto.task_id.clone().unwrap_or_default());
        Ok(subtask_dto.into_subtask(&owner))
    }

    async fn delete_subtask(&self, id: &SubtaskId) -> RepositoryResult<()> {
        let path = format!("/subtasks/{}", segment(&id.0));
        self.client.delete(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_escapes_reserved_characters() {
        assert_eq!(segment("my-site"), "my-site");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
