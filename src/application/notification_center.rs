use chrono::{DateTime, Local, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::ProjectStore;
use crate::domain::{Notification, NotificationDraft, NotificationId, Snapshot};
use crate::ports::{load_json, save_json, LocalStore};

pub const NOTIFICATIONS_KEY: &str = "ptms_notifications";

/// Notification list backed by local storage. Newest entries sit at the
/// head; every mutation rewrites the stored list.
pub struct NotificationCenter {
    storage: Arc<dyn LocalStore>,
    notifications: RwLock<Vec<Notification>>,
}

impl NotificationCenter {
    /// Reads the stored list once. A missing or unreadable list starts empty.
    pub fn load(storage: Arc<dyn LocalStore>) -> Self {
        let notifications = match load_json::<Vec<Notification>>(storage.as_ref(), NOTIFICATIONS_KEY) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Failed to load notifications: {}", e);
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} notifications", notifications.len());

        Self {
            storage,
            notifications: RwLock::new(notifications),
        }
    }

    fn persist(&self, notifications: &[Notification]) {
        if let Err(e) = save_json(self.storage.as_ref(), NOTIFICATIONS_KEY, notifications) {
            tracing::error!("Failed to save notifications: {}", e);
        }
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.notifications.read().await.iter().filter(|n| !n.read).count()
    }

    pub async fn add(&self, draft: NotificationDraft) -> Notification {
        let notification = Notification::from_draft(draft, Utc::now());
        let mut notifications = self.notifications.write().await;
        notifications.insert(0, notification.clone());
        self.persist(&notifications);
        notification
    }

    /// Returns whether a notification with `id` exists.
    pub async fn mark_as_read(&self, id: &NotificationId) -> bool {
        let mut notifications = self.notifications.write().await;
        let found = match notifications.iter_mut().find(|n| &n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        };
        self.persist(&notifications);
        found
    }

    pub async fn mark_all_as_read(&self) {
        let mut notifications = self.notifications.write().await;
        for notification in notifications.iter_mut() {
            notification.read = true;
        }
        self.persist(&notifications);
    }

    /// Returns whether anything was removed.
    pub async fn delete(&self, id: &NotificationId) -> bool {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| &n.id != id);
        self.persist(&notifications);
        notifications.len() != before
    }

    pub async fn clear_all(&self) {
        let mut notifications = self.notifications.write().await;
        notifications.clear();
        self.persist(&notifications);
    }

    /// Adds one overdue notice per incomplete task created before today,
    /// unless a notice with that id already exists. Existing notices are
    /// never touched, even once their task is completed. Returns how many
    /// notices were added.
    pub async fn scan_overdue(&self, snapshot: &Snapshot, now: DateTime<Local>) -> usize {
        if snapshot.tasks.is_empty() {
            return 0;
        }
        let today = now.date_naive();
        let created_at = now.with_timezone(&Utc);

        let mut notifications = self.notifications.write().await;
        let mut seen: HashSet<NotificationId> = notifications.iter().map(|n| n.id.clone()).collect();
        let mut batch = Vec::new();

        for (project, task) in snapshot.project_tasks() {
            let Some(days_late) = task.days_overdue(today) else {
                continue;
            };
            let id = NotificationId::overdue(&task.id);
            if seen.insert(id) {
                batch.push(Notification::overdue(task, project, days_late, created_at));
            }
        }

        let added = batch.len();
        if added > 0 {
            tracing::info!("Raised {} overdue notifications", added);
            notifications.splice(0..0, batch);
            self.persist(&notifications);
        }
        added
    }
}

/// Loads the store and scans the freshly loaded tasks before anything else
/// can change them. Returns whether the load succeeded; a failed load scans
/// nothing.
pub async fn load_and_scan(store: &ProjectStore, center: &NotificationCenter) -> bool {
    if !store.fetch_all().await {
        return false;
    }
    let raised = center.scan_overdue(&store.snapshot().await, Local::now()).await;
    if raised > 0 {
        tracing::info!("{} new overdue notifications after load", raised);
    }
    true
}

/// Runs the overdue scan now and again after every change to the store,
/// until the store is dropped.
pub fn spawn_overdue_watcher(store: Arc<ProjectStore>, center: Arc<NotificationCenter>) -> JoinHandle<()> {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            let snapshot = store.snapshot().await;
            center.scan_overdue(&snapshot, Local::now()).await;
            if changes.changed().await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryLocalStore;
    use crate::domain::*;
    use crate::ports::{MockProjectRepository, MockTaskRepository, ProjectWithTasks};
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn snapshot_with(tasks: Vec<Task>) -> Snapshot {
        let project = Project::from_draft(ProjectId::from("p1"), ProjectDraft::new("Website"));
        let mut snapshot = Snapshot::default();
        snapshot.tasks.insert(project.id.clone(), tasks);
        snapshot.projects.push(project);
        snapshot
    }

    fn task(id: &str, created_at: DateTime<Local>) -> Task {
        Task {
            id: TaskId::from(id),
            project_id: ProjectId::from("p1"),
            text: format!("Task {id}"),
            completed: false,
            created_at: created_at.with_timezone(&Utc),
            due_date: None,
            priority: None,
            status: None,
            description: None,
            subtasks: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn center() -> (Arc<MemoryLocalStore>, NotificationCenter) {
        let storage = Arc::new(MemoryLocalStore::new());
        let center = NotificationCenter::load(storage.clone());
        (storage, center)
    }

    fn draft(title: &str) -> NotificationDraft {
        NotificationDraft {
            title: title.to_string(),
            message: "Saved".to_string(),
            kind: NotificationKind::Success,
            related_task_id: None,
            project_id: None,
        }
    }

    #[tokio::test]
    async fn test_overdue_notice_is_raised_once_and_survives_completion() {
        let (_, center) = center();
        let now = Local::now();
        let mut t1 = task("t1", now - Duration::days(1));

        let added = center.scan_overdue(&snapshot_with(vec![t1.clone()]), now).await;
        assert_eq!(added, 1);
        let list = center.notifications().await;
        assert_eq!(list[0].id, NotificationId::from("overdue-t1"));
        assert_eq!(list[0].title, "Task Overdue");
        assert_eq!(list[0].message, "Task \"Task t1\" in Website was due 1 day ago.");
        assert_eq!(list[0].kind, NotificationKind::Warning);

        assert_eq!(center.scan_overdue(&snapshot_with(vec![t1.clone()]), now).await, 0);
        assert_eq!(center.notifications().await.len(), 1);

        t1.completed = true;
        assert_eq!(center.scan_overdue(&snapshot_with(vec![t1]), now).await, 0);
        let list = center.notifications().await;
        assert_eq!(list.len(), 1);
        assert!(!list[0].read);
    }

    #[tokio::test]
    async fn test_scan_skips_fresh_tasks_and_empty_map() {
        let (_, center) = center();
        let now = Local::now();

        assert_eq!(center.scan_overdue(&Snapshot::default(), now).await, 0);
        assert_eq!(center.scan_overdue(&snapshot_with(vec![task("t2", now)]), now).await, 0);

        let t3 = task("t3", now - Duration::days(4));
        center.scan_overdue(&snapshot_with(vec![t3]), now).await;
        let list = center.notifications().await;
        assert_eq!(list[0].message, "Task \"Task t3\" in Website was due 4 days ago.");
    }

    #[tokio::test]
    async fn test_new_batch_goes_to_the_head() {
        let (_, center) = center();
        let now = Local::now();
        center.add(draft("Manual")).await;

        center
            .scan_overdue(&snapshot_with(vec![task("t1", now - Duration::days(2))]), now)
            .await;

        let titles: Vec<_> = center.notifications().await.into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Task Overdue", "Manual"]);
    }

    #[tokio::test]
    async fn test_read_delete_and_clear() {
        let (_, center) = center();
        let first = center.add(draft("First")).await;
        let second = center.add(draft("Second")).await;
        assert_eq!(center.unread_count().await, 2);

        assert!(center.mark_as_read(&first.id).await);
        assert!(!center.mark_as_read(&NotificationId::from("missing")).await);
        assert_eq!(center.unread_count().await, 1);

        center.mark_all_as_read().await;
        assert_eq!(center.unread_count().await, 0);

        assert!(center.delete(&second.id).await);
        assert_eq!(center.notifications().await.len(), 1);

        center.clear_all().await;
        assert!(center.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_persisted_and_reloaded() {
        let (storage, center) = center();
        let now = Local::now();
        center
            .scan_overdue(&snapshot_with(vec![task("t1", now - Duration::days(1))]), now)
            .await;
        center.mark_all_as_read().await;

        let reloaded = NotificationCenter::load(storage);
        let list = reloaded.notifications().await;
        assert_eq!(list.len(), 1);
        assert!(list[0].read);
        assert_eq!(list[0].related_task_id, Some(TaskId::from("t1")));
    }

    fn store_with_stale_task(tasks: MockTaskRepository) -> Arc<ProjectStore> {
        let mut projects = MockProjectRepository::new();
        projects.expect_list_projects().times(1).returning(|| {
            Ok(vec![ProjectWithTasks {
                project: Project::from_draft(ProjectId::from("p1"), ProjectDraft::new("Website")),
                tasks: vec![task("t1", Local::now() - Duration::days(3))],
            }])
        });
        Arc::new(ProjectStore::new(Arc::new(projects), Arc::new(tasks)))
    }

    fn completing_task_repo() -> MockTaskRepository {
        let mut tasks = MockTaskRepository::new();
        tasks.expect_update_task().times(1).returning(|id, _| {
            let mut done = task(&id.0, Local::now());
            done.completed = true;
            Ok(done)
        });
        tasks
    }

    async fn wait_for_notice(center: &NotificationCenter, id: &NotificationId) -> bool {
        for _ in 0..100 {
            if center.notifications().await.iter().any(|n| &n.id == id) {
                return true;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_notice_raised_on_load_survives_completing_the_task() {
        let store = store_with_stale_task(completing_task_repo());
        let (_, center) = center();

        assert!(load_and_scan(&store, &center).await);
        assert_eq!(store.toggle_task(&TaskId::from("t1")).await, Some(true));
        assert_eq!(center.scan_overdue(&store.snapshot().await, Local::now()).await, 0);

        let list = center.notifications().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, NotificationId::from("overdue-t1"));
        assert_eq!(list[0].message, "Task \"Task t1\" in Website was due 3 days ago.");
        assert_eq!(store.flush().await.failed, 0);
    }

    #[tokio::test]
    async fn test_failed_load_scans_nothing() {
        let mut projects = MockProjectRepository::new();
        projects
            .expect_list_projects()
            .returning(|| Err(crate::ports::RepositoryError::Network("down".to_string())));
        let store = ProjectStore::new(Arc::new(projects), Arc::new(MockTaskRepository::new()));
        let (_, center) = center();

        assert!(!load_and_scan(&store, &center).await);
        assert!(center.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_watcher_scans_after_fetch_and_keeps_notice() {
        let store = store_with_stale_task(completing_task_repo());
        let (_, center) = center();
        let center = Arc::new(center);
        let watcher = spawn_overdue_watcher(store.clone(), center.clone());
        let id = NotificationId::from("overdue-t1");

        assert!(store.fetch_all().await);
        assert!(wait_for_notice(&center, &id).await);

        store.toggle_task(&TaskId::from("t1")).await;
        store.flush().await;
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let list = center.notifications().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, id);
        watcher.abort();
    }

    #[tokio::test]
    async fn test_same_task_id_in_one_pass_raises_one_notice() {
        let (_, center) = center();
        let now = Local::now();
        let stale = task("t1", now - Duration::days(2));

        let mut snapshot = Snapshot::default();
        for (id, name) in [("p1", "Website"), ("p2", "Mobile App")] {
            let project = Project::from_draft(ProjectId::from(id), ProjectDraft::new(name));
            let mut copy = stale.clone();
            copy.project_id = project.id.clone();
            snapshot.tasks.insert(project.id.clone(), vec![copy]);
            snapshot.projects.push(project);
        }

        assert_eq!(center.scan_overdue(&snapshot, now).await, 1);
        let list = center.notifications().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, NotificationId::from("overdue-t1"));
        assert_eq!(list[0].message, "Task \"Task t1\" in Website was due 2 days ago.");
    }

    #[tokio::test]
    async fn test_corrupt_storage_starts_empty() {
        let storage = Arc::new(MemoryLocalStore::new());
        storage.set(NOTIFICATIONS_KEY, "not json").unwrap();

        let center = NotificationCenter::load(storage);
        assert!(center.notifications().await.is_empty());
    }
}
