use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use super::{SyncSummary, SyncTracker};
use crate::domain::insights::BoardColumn;
use crate::domain::*;
use crate::ports::{ProjectRepository, TaskRepository};

#[derive(Default)]
struct StoreState {
    snapshot: Snapshot,
    tags: TagRegistry,
}

fn task_mut<'a>(snapshot: &'a mut Snapshot, id: &TaskId) -> Option<&'a mut Task> {
    snapshot.tasks.values_mut().flatten().find(|t| &t.id == id)
}

/// In-memory projects and tasks for the session, kept in step with the
/// persistence API by optimistic local updates.
///
/// Mutations change local state first and hand the remote call to the
/// [`SyncTracker`] without awaiting it. Remote failures are logged; local
/// state is never rolled back and never reconciled with the server. Creating
/// a project, task or subtask is the exception: those wait for the server
/// record before anything is added locally.
pub struct ProjectStore {
    project_repo: Arc<dyn ProjectRepository>,
    task_repo: Arc<dyn TaskRepository>,
    state: RwLock<StoreState>,
    sync: SyncTracker,
    revision: watch::Sender<u64>,
}

impl ProjectStore {
    pub fn new(project_repo: Arc<dyn ProjectRepository>, task_repo: Arc<dyn TaskRepository>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            project_repo,
            task_repo,
            state: RwLock::new(StoreState::default()),
            sync: SyncTracker::new(),
            revision,
        }
    }

    /// Revision counter bumped after every local change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Loads every project with its tasks. On failure the store keeps its
    /// current contents and the error is only logged.
    pub async fn fetch_all(&self) -> bool {
        let entries = match self.project_repo.list_projects().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to load data from API: {}", e);
                return false;
            }
        };

        {
            let mut state = self.state.write().await;
            let mut snapshot = Snapshot::default();
            let mut tags = TagRegistry::new();
            for entry in entries {
                for task in &entry.tasks {
                    tags.register_all(&task.tags);
                }
                snapshot.tasks.insert(entry.project.id.clone(), entry.tasks);
                snapshot.projects.push(entry.project);
            }
            tracing::info!(
                "Loaded {} projects, {} tasks and {} tags",
                snapshot.projects.len(),
                snapshot.task_count(),
                tags.len()
            );
            *state = StoreState { snapshot, tags };
        }
        self.bump();
        true
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot.clone()
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.snapshot.projects.clone()
    }

    pub async fn project(&self, id: &ProjectId) -> Option<Project> {
        self.state.read().await.snapshot.project(id).cloned()
    }

    pub async fn tasks_for(&self, project_id: &ProjectId) -> Vec<Task> {
        self.state.read().await.snapshot.tasks_for(project_id).to_vec()
    }

    pub async fn find_task(&self, id: &TaskId) -> Option<Task> {
        self.state.read().await.snapshot.find_task(id).cloned()
    }

    /// Every tag text seen so far, sorted.
    pub async fn tags(&self) -> Vec<String> {
        self.state.read().await.tags.iter().map(str::to_string).collect()
    }

    /// Tasks of `project_id` created in `month`. Recomputed on every call.
    pub async fn tasks_by_month(&self, project_id: &ProjectId, month: MonthKey) -> Vec<Task> {
        self.state
            .read()
            .await
            .snapshot
            .tasks_for(project_id)
            .iter()
            .filter(|t| t.created_in_month(month))
            .cloned()
            .collect()
    }

    pub async fn add_project(&self, draft: ProjectDraft) -> Option<Project> {
        let id = {
            let state = self.state.read().await;
            ProjectId::for_name(
                &draft.name,
                state.snapshot.projects.iter().map(|p| &p.id),
                Utc::now().timestamp_millis(),
            )
        };
        let candidate = Project::from_draft(id, draft);

        match self.project_repo.create_project(&candidate).await {
            Ok(created) => {
                {
                    let mut state = self.state.write().await;
                    state.snapshot.tasks.entry(created.id.clone()).or_default();
                    state.snapshot.projects.push(created.clone());
                }
                self.bump();
                Some(created)
            }
            Err(e) => {
                tracing::error!("Failed to add project {}: {}", candidate.id, e);
                None
            }
        }
    }

    pub async fn update_project(&self, id: &ProjectId, patch: ProjectUpdate) {
        {
            let mut state = self.state.write().await;
            match state.snapshot.projects.iter_mut().find(|p| &p.id == id) {
                Some(project) => project.apply(&patch),
                None => tracing::warn!("Updating project {} that is not loaded", id),
            }
        }
        self.bump();

        let repo = self.project_repo.clone();
        let id = id.clone();
        self.sync
            .spawn("update_project", async move {
                repo.update_project(&id, &patch).await.map(|_| ())
            })
            .await;
    }

    /// Removes the project and its task list.
    pub async fn delete_project(&self, id: &ProjectId) {
        {
            let mut state = self.state.write().await;
            state.snapshot.projects.retain(|p| &p.id != id);
            state.snapshot.tasks.remove(id);
        }
        self.bump();

        let repo = self.project_repo.clone();
        let id = id.clone();
        self.sync
            .spawn("delete_project", async move { repo.delete_project(&id).await })
            .await;
    }

    pub async fn toggle_project_favorite(&self, id: &ProjectId) -> Option<bool> {
        let is_favorite = self.project(id).await?.is_favorite;
        let patch = ProjectUpdate {
            is_favorite: Some(!is_favorite),
            ..Default::default()
        };
        self.update_project(id, patch).await;
        Some(!is_favorite)
    }

    pub async fn add_task(&self, project_id: &ProjectId, draft: TaskDraft) -> Option<Task> {
        match self.task_repo.create_task(project_id, &draft).await {
            Ok(task) => {
                {
                    let mut state = self.state.write().await;
                    let StoreState { snapshot, tags } = &mut *state;
                    if snapshot.project(project_id).is_some() {
                        tags.register_all(&task.tags);
                        snapshot
                            .tasks
                            .entry(project_id.clone())
                            .or_default()
                            .push(task.clone());
                    } else {
                        tracing::warn!("Task {} created for unknown project {}", task.id, project_id);
                    }
                }
                self.bump();
                Some(task)
            }
            Err(e) => {
                tracing::error!("Failed to add task to {}: {}", project_id, e);
                None
            }
        }
    }

    pub async fn update_task(&self, id: &TaskId, patch: TaskUpdate) {
        {
            let mut state = self.state.write().await;
            let StoreState { snapshot, tags } = &mut *state;
            match task_mut(snapshot, id) {
                Some(task) => {
                    task.apply(&patch);
                    tags.register_all(&task.tags);
                }
                None => tracing::warn!("Updating task {} that is not loaded", id),
            }
        }
        self.bump();

        let repo = self.task_repo.clone();
        let id = id.clone();
        self.sync
            .spawn("update_task", async move {
                repo.update_task(&id, &patch).await.map(|_| ())
            })
            .await;
    }

    /// Inverts the completed flag. Returns the new value, or `None` when the
    /// task is not loaded.
    pub async fn toggle_task(&self, id: &TaskId) -> Option<bool> {
        let completed = self.find_task(id).await?.completed;
        self.update_task(id, TaskUpdate::completed(!completed)).await;
        Some(!completed)
    }

    /// Kanban move: the column decides both completion and status.
    pub async fn move_task(&self, id: &TaskId, column: BoardColumn) {
        self.update_task(id, column.move_patch()).await;
    }

    pub async fn delete_task(&self, id: &TaskId) {
        {
            let mut state = self.state.write().await;
            for tasks in state.snapshot.tasks.values_mut() {
                tasks.retain(|t| &t.id != id);
            }
        }
        self.bump();

        let repo = self.task_repo.clone();
        let id = id.clone();
        self.sync
            .spawn("delete_task", async move { repo.delete_task(&id).await })
            .await;
    }

    pub async fn add_subtask(&self, task_id: &TaskId, text: &str) -> Option<Subtask> {
        match self.task_repo.add_subtask(task_id, text).await {
            Ok(subtask) => {
                {
                    let mut state = self.state.write().await;
                    match task_mut(&mut state.snapshot, task_id) {
                        Some(task) => task.subtasks.push(subtask.clone()),
                        None => tracing::warn!("Subtask added to task {} that is not loaded", task_id),
                    }
                }
                self.bump();
                Some(subtask)
            }
            Err(e) => {
                tracing::error!("Failed to add subtask to {}: {}", task_id, e);
                None
            }
        }
    }

    pub async fn toggle_subtask(&self, task_id: &TaskId, subtask_id: &SubtaskId) -> Option<bool> {
        let completed = {
            let mut state = self.state.write().await;
            let subtask = task_mut(&mut state.snapshot, task_id)?
                .subtasks
                .iter_mut()
                .find(|st| &st.id == subtask_id)?;
            subtask.completed = !subtask.completed;
            subtask.completed
        };
        self.bump();

        let repo = self.task_repo.clone();
        let id = subtask_id.clone();
        let patch = SubtaskUpdate {
            completed: Some(completed),
            ..Default::default()
        };
        self.sync
            .spawn("toggle_subtask", async move {
                repo.update_subtask(&id, &patch).await.map(|_| ())
            })
            .await;
        Some(completed)
    }

    pub async fn delete_subtask(&self, task_id: &TaskId, subtask_id: &SubtaskId) {
        {
            let mut state = self.state.write().await;
            if let Some(task) = task_mut(&mut state.snapshot, task_id) {
                task.subtasks.retain(|st| &st.id != subtask_id);
            }
        }
        self.bump();

        let repo = self.task_repo.clone();
        let id = subtask_id.clone();
        self.sync
            .spawn("delete_subtask", async move { repo.delete_subtask(&id).await })
            .await;
    }

    pub async fn pending_syncs(&self) -> usize {
        self.sync.pending().await
    }

    /// Waits for all background calls issued so far.
    pub async fn flush(&self) -> SyncSummary {
        self.sync.flush().await
    }
}
