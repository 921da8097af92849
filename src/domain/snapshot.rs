use std::collections::HashMap;

use super::{Project, ProjectId, Task, TaskId};

/// Point-in-time copy of the project list and the per-project task lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub tasks: HashMap<ProjectId, Vec<Task>>,
}

impl Snapshot {
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    pub fn tasks_for(&self, id: &ProjectId) -> &[Task] {
        self.tasks.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every task paired with its project, in project-list order. Task lists
    /// without a matching project are skipped.
    pub fn project_tasks(&self) -> impl Iterator<Item = (&Project, &Task)> {
        self.projects
            .iter()
            .flat_map(move |project| self.tasks_for(&project.id).iter().map(move |t| (project, t)))
    }

    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.values().flatten().find(|t| &t.id == id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }
}
