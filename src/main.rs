use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command};
use color_eyre::Result;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

mod adapters;
mod application;
mod domain;
mod ports;

use adapters::{
    api::{HttpRepository, PtmsClient},
    config::FileConfigStore,
    storage::{FileLocalStore, MemoryLocalStore},
    tui::{run_tui, App},
};
use application::{
    load_and_scan, spawn_overdue_watcher, AppError, NotificationCenter, Preferences, ProjectStore,
    ViewMode,
};
use domain::insights::{
    all_tasks_sorted, filter_listings, kanban_columns, search_projects, tasks_on_day, tasks_today,
    AnalyticsSummary, BoardColumn, DashboardStats,
};
use domain::*;
use ports::{ConfigStore, LocalStore};

fn build_cli() -> Command {
    let task_fields = [
        Arg::new("due")
            .long("due")
            .value_name("DATE")
            .help("Due date, YYYY-MM-DD or RFC 3339"),
        Arg::new("priority")
            .long("priority")
            .value_name("PRIORITY")
            .help("low, medium, high or urgent"),
        Arg::new("status")
            .long("status")
            .value_name("STATUS")
            .help("not-started, on-track, at-risk, delayed or on-hold"),
        Arg::new("description")
            .long("description")
            .value_name("TEXT"),
        Arg::new("tag")
            .long("tag")
            .value_name("TAG")
            .action(ArgAction::Append)
            .help("Tag text; repeat for several"),
    ];

    let project_fields = [
        Arg::new("url").long("url").value_name("URL"),
        Arg::new("audience").long("audience").value_name("TEXT"),
        Arg::new("status")
            .long("status")
            .value_name("STATUS")
            .help("not-started, on-track, at-risk, delayed or on-hold"),
        Arg::new("priority")
            .long("priority")
            .value_name("PRIORITY")
            .help("low, medium, high or urgent"),
    ];

    let id_arg = |name: &'static str, help: &'static str| {
        Arg::new(name).help(help).required(true)
    };

    Command::new("ptms")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Project and task tracker for the terminal")
        .long_about("Keyboard-driven project and task tracker backed by a REST persistence API.\n\nRun without a subcommand to open the terminal UI.")
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("Persistence API base URL (can also be set via PTMS_API_URL env var)")
                .global(true),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .action(ArgAction::SetTrue)
                .help("Keep preferences and notifications in memory only")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("debug")
                .help("trace, debug, info, warn or error (written to ptms.log)")
                .global(true),
        )
        .subcommand(
            Command::new("projects")
                .about("Project operations")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List projects as JSON"))
                .subcommand(
                    Command::new("add")
                        .about("Create a project")
                        .arg(id_arg("name", "Project name"))
                        .args(project_fields.clone())
                        .arg(Arg::new("favorite").long("favorite").action(ArgAction::SetTrue)),
                )
                .subcommand(
                    Command::new("update")
                        .about("Change project fields")
                        .arg(id_arg("project", "Project ID"))
                        .arg(Arg::new("name").long("name").value_name("NAME"))
                        .args(project_fields.clone()),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a project and its tasks")
                        .arg(id_arg("project", "Project ID")),
                )
                .subcommand(
                    Command::new("favorite")
                        .about("Toggle the favorite flag")
                        .arg(id_arg("project", "Project ID")),
                )
                .subcommand(
                    Command::new("search")
                        .about("Fuzzy search projects by name")
                        .arg(id_arg("query", "Search text")),
                ),
        )
        .subcommand(
            Command::new("tasks")
                .about("Task operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List tasks as JSON, newest due date first")
                        .arg(Arg::new("project").long("project").value_name("PROJECT_ID"))
                        .arg(Arg::new("query").long("query").value_name("TEXT")),
                )
                .subcommand(
                    Command::new("add")
                        .about("Create a task")
                        .arg(id_arg("project", "Project ID"))
                        .arg(id_arg("text", "Task text"))
                        .args(task_fields.clone())
                        .arg(
                            Arg::new("subtask")
                                .long("subtask")
                                .value_name("TEXT")
                                .action(ArgAction::Append),
                        ),
                )
                .subcommand(
                    Command::new("update")
                        .about("Change task fields")
                        .arg(id_arg("task", "Task ID"))
                        .arg(Arg::new("text").long("text").value_name("TEXT"))
                        .args(task_fields.clone()),
                )
                .subcommand(
                    Command::new("toggle")
                        .about("Flip the completed flag")
                        .arg(id_arg("task", "Task ID")),
                )
                .subcommand(
                    Command::new("move")
                        .about("Move a task to a board column")
                        .arg(id_arg("task", "Task ID"))
                        .arg(id_arg(
                            "column",
                            "not-started, on-track, at-risk, delayed, on-hold or completed",
                        )),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a task")
                        .arg(id_arg("task", "Task ID")),
                )
                .subcommand(
                    Command::new("month")
                        .about("Tasks of a project created in a month")
                        .arg(id_arg("project", "Project ID"))
                        .arg(Arg::new("month").help("YYYY-MM, defaults to the current month")),
                )
                .subcommand(
                    Command::new("board")
                        .about("Kanban columns of a project")
                        .arg(id_arg("project", "Project ID")),
                )
                .subcommand(
                    Command::new("day")
                        .about("Tasks created on a day")
                        .arg(Arg::new("date").help("YYYY-MM-DD, defaults to today")),
                )
                .subcommand(Command::new("tags").about("Every tag in use")),
        )
        .subcommand(
            Command::new("subtasks")
                .about("Subtask operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a subtask")
                        .arg(id_arg("task", "Task ID"))
                        .arg(id_arg("text", "Subtask text")),
                )
                .subcommand(
                    Command::new("toggle")
                        .about("Flip a subtask's completed flag")
                        .arg(id_arg("task", "Task ID"))
                        .arg(id_arg("subtask", "Subtask ID")),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a subtask")
                        .arg(id_arg("task", "Task ID"))
                        .arg(id_arg("subtask", "Subtask ID")),
                ),
        )
        .subcommand(
            Command::new("notifications")
                .about("Notification operations")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List notifications as JSON"))
                .subcommand(
                    Command::new("add")
                        .about("Add a notification")
                        .arg(id_arg("title", "Title"))
                        .arg(id_arg("message", "Message"))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(["success", "info", "warning", "error"])
                                .default_value("info"),
                        )
                        .arg(Arg::new("task").long("task").value_name("TASK_ID"))
                        .arg(Arg::new("project").long("project").value_name("PROJECT_ID")),
                )
                .subcommand(
                    Command::new("read")
                        .about("Mark one notification as read")
                        .arg(id_arg("id", "Notification ID")),
                )
                .subcommand(Command::new("read-all").about("Mark every notification as read"))
                .subcommand(
                    Command::new("delete")
                        .about("Delete a notification")
                        .arg(id_arg("id", "Notification ID")),
                )
                .subcommand(Command::new("clear").about("Delete every notification")),
        )
        .subcommand(Command::new("stats").about("Dashboard and analytics counters"))
        .subcommand(
            Command::new("prefs")
                .about("UI preferences")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print current preferences"))
                .subcommand(Command::new("theme").about("Toggle dark/light theme"))
                .subcommand(Command::new("sidebar").about("Toggle the collapsed sidebar"))
                .subcommand(
                    Command::new("view")
                        .about("Set the project view mode")
                        .arg(id_arg("mode", "grid, list or board")),
                ),
        )
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::Application(format!("Missing argument: {name}")).into())
}

fn optional<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(String::as_str)
}

fn parsed<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = DomainError>,
{
    Ok(optional(matches, name).map(|s| s.parse::<T>()).transpose()?)
}

fn tags(matches: &ArgMatches) -> Option<Vec<String>> {
    matches
        .get_many::<String>("tag")
        .map(|values| values.cloned().collect())
}

fn task_patch(matches: &ArgMatches) -> Result<TaskUpdate> {
    Ok(TaskUpdate {
        text: optional(matches, "text").map(str::to_string),
        priority: parsed(matches, "priority")?,
        status: parsed(matches, "status")?,
        description: optional(matches, "description").map(|d| Some(d.to_string())),
        due_date: optional(matches, "due").map(parse_due_date).transpose()?.map(Some),
        tags: tags(matches),
        ..Default::default()
    })
}

fn project_patch(matches: &ArgMatches) -> Result<ProjectUpdate> {
    Ok(ProjectUpdate {
        name: optional(matches, "name").map(str::to_string),
        url: optional(matches, "url").map(str::to_string),
        audience: optional(matches, "audience").map(str::to_string),
        status: parsed(matches, "status")?,
        priority: parsed(matches, "priority")?,
        ..Default::default()
    })
}

async fn require_task(store: &ProjectStore, id: &TaskId) -> Result<Task> {
    store
        .find_task(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("task {id}")).into())
}

async fn run_projects(store: &ProjectStore, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => print_json(&store.projects().await)?,
        Some(("add", add)) => {
            let mut draft = ProjectDraft::new(required(add, "name")?);
            draft.validate()?;
            draft.url = optional(add, "url").unwrap_or_default().to_string();
            draft.audience = optional(add, "audience").unwrap_or_default().to_string();
            draft.is_favorite = add.get_flag("favorite");
            if let Some(status) = parsed(add, "status")? {
                draft.status = status;
            }
            if let Some(priority) = parsed(add, "priority")? {
                draft.priority = priority;
            }
            let created = store
                .add_project(draft)
                .await
                .ok_or_else(|| AppError::Application("Failed to add project".to_string()))?;
            print_json(&created)?;
        }
        Some(("update", update)) => {
            let id = ProjectId::from(required(update, "project")?);
            store.project(&id).await.ok_or_else(|| AppError::NotFound(format!("project {id}")))?;
            let patch = project_patch(update)?;
            if patch.is_empty() {
                return Err(AppError::Application("Nothing to update".to_string()).into());
            }
            store.update_project(&id, patch).await;
            print_json(&store.project(&id).await)?;
        }
        Some(("delete", delete)) => {
            let id = ProjectId::from(required(delete, "project")?);
            store.delete_project(&id).await;
            print_json(&json!({ "deleted": id }))?;
        }
        Some(("favorite", favorite)) => {
            let id = ProjectId::from(required(favorite, "project")?);
            let is_favorite = store
                .toggle_project_favorite(&id)
                .await
                .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;
            print_json(&json!({ "id": id, "isFavorite": is_favorite }))?;
        }
        Some(("search", search)) => {
            let projects = store.projects().await;
            print_json(&search_projects(&projects, required(search, "query")?))?;
        }
        _ => return Err(AppError::Application("Unknown projects subcommand".to_string()).into()),
    }
    Ok(())
}

async fn run_tasks(store: &ProjectStore, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", list)) => {
            let query = optional(list, "query").unwrap_or_default();
            match optional(list, "project") {
                Some(project) => {
                    let tasks: Vec<Task> = store
                        .tasks_for(&ProjectId::from(project))
                        .await
                        .into_iter()
                        .filter(|t| t.text.to_lowercase().contains(&query.to_lowercase()))
                        .collect();
                    print_json(&tasks)?;
                }
                None => {
                    let listings = all_tasks_sorted(&store.snapshot().await);
                    print_json(&filter_listings(listings, query))?;
                }
            }
        }
        Some(("add", add)) => {
            let project_id = ProjectId::from(required(add, "project")?);
            let mut draft = TaskDraft::new(required(add, "text")?);
            draft.validate()?;
            draft.due_date = optional(add, "due").map(parse_due_date).transpose()?;
            draft.description = optional(add, "description").map(str::to_string);
            draft.tags = tags(add).unwrap_or_default();
            draft.subtasks = add
                .get_many::<String>("subtask")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            if let Some(priority) = parsed(add, "priority")? {
                draft.priority = priority;
            }
            if let Some(status) = parsed(add, "status")? {
                draft.status = status;
            }
            let created = store
                .add_task(&project_id, draft)
                .await
                .ok_or_else(|| AppError::Application("Failed to add task".to_string()))?;
            print_json(&created)?;
        }
        Some(("update", update)) => {
            let id = TaskId::from(required(update, "task")?);
            require_task(store, &id).await?;
            let patch = task_patch(update)?;
            if patch.is_empty() {
                return Err(AppError::Application("Nothing to update".to_string()).into());
            }
            store.update_task(&id, patch).await;
            print_json(&require_task(store, &id).await?)?;
        }
        Some(("toggle", toggle)) => {
            let id = TaskId::from(required(toggle, "task")?);
            store
                .toggle_task(&id)
                .await
                .ok_or_else(|| AppError::NotFound(format!("task {id}")))?;
            print_json(&require_task(store, &id).await?)?;
        }
        Some(("move", mv)) => {
            let id = TaskId::from(required(mv, "task")?);
            let column: BoardColumn = required(mv, "column")?.parse()?;
            require_task(store, &id).await?;
            store.move_task(&id, column).await;
            print_json(&require_task(store, &id).await?)?;
        }
        Some(("delete", delete)) => {
            let id = TaskId::from(required(delete, "task")?);
            store.delete_task(&id).await;
            print_json(&json!({ "deleted": id }))?;
        }
        Some(("month", month)) => {
            let project_id = ProjectId::from(required(month, "project")?);
            let key = parsed(month, "month")?.unwrap_or_else(MonthKey::current);
            print_json(&store.tasks_by_month(&project_id, key).await)?;
        }
        Some(("board", board)) => {
            let tasks = store.tasks_for(&ProjectId::from(required(board, "project")?)).await;
            let columns: Vec<_> = kanban_columns(&tasks)
                .into_iter()
                .map(|(column, members)| {
                    json!({ "column": column.as_str(), "title": column.title(), "tasks": members })
                })
                .collect();
            print_json(&columns)?;
        }
        Some(("day", day)) => {
            let snapshot = store.snapshot().await;
            match optional(day, "date") {
                Some(text) => {
                    let date = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                        .map_err(|_| DomainError::InvalidDate(text.to_string()))?;
                    print_json(&tasks_on_day(&snapshot, date))?;
                }
                None => print_json(&tasks_today(&snapshot))?,
            }
        }
        Some(("tags", _)) => print_json(&store.tags().await)?,
        _ => return Err(AppError::Application("Unknown tasks subcommand".to_string()).into()),
    }
    Ok(())
}

async fn run_subtasks(store: &ProjectStore, matches: &ArgMatches) -> Result<()> {
    let Some((name, sub)) = matches.subcommand() else {
        return Err(AppError::Application("Missing subtasks subcommand".to_string()).into());
    };
    let task_id = TaskId::from(required(sub, "task")?);
    require_task(store, &task_id).await?;

    match name {
        "add" => {
            let subtask = store
                .add_subtask(&task_id, required(sub, "text")?)
                .await
                .ok_or_else(|| AppError::Application("Failed to add subtask".to_string()))?;
            print_json(&subtask)?;
        }
        "toggle" => {
            let subtask_id = SubtaskId::from(required(sub, "subtask")?);
            store
                .toggle_subtask(&task_id, &subtask_id)
                .await
                .ok_or_else(|| AppError::NotFound(format!("subtask {}", subtask_id.0)))?;
            print_json(&require_task(store, &task_id).await?)?;
        }
        "delete" => {
            let subtask_id = SubtaskId::from(required(sub, "subtask")?);
            store.delete_subtask(&task_id, &subtask_id).await;
            print_json(&require_task(store, &task_id).await?)?;
        }
        _ => return Err(AppError::Application("Unknown subtasks subcommand".to_string()).into()),
    }
    Ok(())
}

async fn run_notifications(center: &NotificationCenter, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => print_json(&center.notifications().await)?,
        Some(("add", add)) => {
            let kind = match optional(add, "kind") {
                Some("success") => NotificationKind::Success,
                Some("warning") => NotificationKind::Warning,
                Some("error") => NotificationKind::Error,
                _ => NotificationKind::Info,
            };
            let draft = NotificationDraft {
                title: required(add, "title")?.to_string(),
                message: required(add, "message")?.to_string(),
                kind,
                related_task_id: optional(add, "task").map(TaskId::from),
                project_id: optional(add, "project").map(ProjectId::from),
            };
            print_json(&center.add(draft).await)?;
        }
        Some(("read", read)) => {
            let id = NotificationId::from(required(read, "id")?);
            if !center.mark_as_read(&id).await {
                return Err(AppError::NotFound(format!("notification {id}")).into());
            }
            print_json(&json!({ "read": id }))?;
        }
        Some(("read-all", _)) => {
            center.mark_all_as_read().await;
            print_json(&json!({ "unread": center.unread_count().await }))?;
        }
        Some(("delete", delete)) => {
            let id = NotificationId::from(required(delete, "id")?);
            if !center.delete(&id).await {
                return Err(AppError::NotFound(format!("notification {id}")).into());
            }
            print_json(&json!({ "deleted": id }))?;
        }
        Some(("clear", _)) => {
            center.clear_all().await;
            print_json(&json!({ "cleared": true }))?;
        }
        _ => {
            return Err(AppError::Application("Unknown notifications subcommand".to_string()).into())
        }
    }
    Ok(())
}

async fn run_prefs(preferences: &Preferences, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => {}
        Some(("theme", _)) => {
            preferences.toggle_theme().await;
        }
        Some(("sidebar", _)) => {
            preferences.toggle_sidebar().await;
        }
        Some(("view", view)) => {
            let mode: ViewMode = required(view, "mode")?.parse()?;
            preferences.set_view_mode(mode).await;
        }
        _ => return Err(AppError::Application("Unknown prefs subcommand".to_string()).into()),
    }
    let values = preferences.values().await;
    print_json(&json!({
        "theme": values.theme,
        "sidebarCollapsed": values.sidebar_collapsed,
        "viewMode": values.view_mode,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize color-eyre for better error reporting
    color_eyre::install()?;

    let matches = build_cli().get_matches();

    // Log to a file; the TUI owns the terminal
    let level: tracing::Level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("debug")
        .parse()
        .map_err(|_| AppError::Application("Invalid --log-level".to_string()))?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("ptms.log")?;
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_max_level(level)
        .init();

    // Load configuration
    let config_store = FileConfigStore::new().map_err(AppError::from)?;
    let mut config = config_store.load_config().await.map_err(AppError::from)?;

    // Override with command line arguments or environment variables
    let api_url = matches
        .get_one::<String>("api-url")
        .cloned()
        .or_else(|| std::env::var("PTMS_API_URL").ok());
    if let Some(url) = api_url {
        if url != config.api_base_url {
            config.api_base_url = url;
            config_store.save_config(&config).await.map_err(AppError::from)?;
        }
    }
    tracing::info!("Using persistence API at {}", config.api_base_url);

    // Create dependencies
    let local_store: Arc<dyn LocalStore> = if matches.get_flag("ephemeral") {
        Arc::new(MemoryLocalStore::new())
    } else {
        let data_dir = config
            .data_dir
            .clone()
            .or_else(FileLocalStore::default_dir)
            .ok_or_else(|| AppError::Application("Cannot determine data directory".to_string()))?;
        let file_store = FileLocalStore::new(data_dir);
        tracing::info!("Local preferences in {}", file_store.dir().display());
        Arc::new(file_store)
    };

    let client = PtmsClient::new(&config.api_base_url, config.request_timeout_seconds)
        .map_err(AppError::from)?;
    let repository = Arc::new(HttpRepository::new(client));
    let store = Arc::new(ProjectStore::new(repository.clone(), repository));
    let notification_center = Arc::new(NotificationCenter::load(local_store.clone()));
    let preferences = Arc::new(Preferences::load(local_store));

    // Handle subcommands
    let outcome = match matches.subcommand() {
        None => {
            // Default behavior - run TUI
            let watcher = spawn_overdue_watcher(store.clone(), notification_center.clone());
            let app = App::new(store.clone(), notification_center.clone(), preferences);
            let result = run_tui(app).await;
            watcher.abort();
            result
        }
        Some(("prefs", prefs_matches)) => run_prefs(&preferences, prefs_matches).await,
        Some(("notifications", notification_matches)) => {
            // Pick up notices for tasks that went overdue since the last run
            if !load_and_scan(&store, &notification_center).await {
                tracing::warn!("Could not load tasks; listing stored notifications only");
            }
            run_notifications(&notification_center, notification_matches).await
        }
        Some((name, sub_matches)) => {
            if !load_and_scan(&store, &notification_center).await {
                eprintln!("❌ Failed to load data from {}", config.api_base_url);
                std::process::exit(1);
            }
            let result = match name {
                "projects" => run_projects(&store, sub_matches).await,
                "tasks" => run_tasks(&store, sub_matches).await,
                "subtasks" => run_subtasks(&store, sub_matches).await,
                "stats" => {
                    let snapshot = store.snapshot().await;
                    print_json(&json!({
                        "dashboard": DashboardStats::from_snapshot(&snapshot),
                        "analytics": AnalyticsSummary::from_snapshot(&snapshot),
                    }))
                }
                _ => Err(AppError::Application("Unknown command".to_string()).into()),
            };
            let raised = notification_center
                .scan_overdue(&store.snapshot().await, Local::now())
                .await;
            if raised > 0 {
                tracing::info!("{} new overdue notifications", raised);
            }
            result
        }
    };

    // Background writes must land before the process exits
    let summary = store.flush().await;
    if summary.failed > 0 {
        eprintln!(
            "❌ {} of {} background updates failed; see ptms.log",
            summary.failed,
            summary.failed + summary.succeeded
        );
    }

    if let Err(e) = outcome {
        match e.downcast_ref::<AppError>() {
            Some(AppError::NotFound(what)) => eprintln!("❌ Not found: {what}"),
            Some(AppError::Domain(err)) => eprintln!("❌ {err}"),
            Some(AppError::Application(msg)) => eprintln!("❌ {msg}"),
            _ => eprintln!("❌ Application error: {e}"),
        }
        std::process::exit(1);
    }
    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_task_patch_from_flags() {
        let matches = build_cli().get_matches_from([
            "ptms", "tasks", "update", "t1", "--priority", "high", "--due", "2024-03-15", "--tag",
            "qa", "--tag", "launch",
        ]);
        let (_, tasks) = matches.subcommand().unwrap();
        let (_, update) = tasks.subcommand().unwrap();

        let patch = task_patch(update).unwrap();
        assert_eq!(patch.priority, Some(Priority::High));
        assert!(matches!(patch.due_date, Some(Some(_))));
        assert_eq!(patch.tags, Some(vec!["qa".to_string(), "launch".to_string()]));
        assert_eq!(patch.completed, None);
        assert_eq!(patch.status, None);
    }

    #[test]
    fn test_bad_enum_flag_is_rejected() {
        let matches =
            build_cli().get_matches_from(["ptms", "projects", "update", "p1", "--status", "done"]);
        let (_, projects) = matches.subcommand().unwrap();
        let (_, update) = projects.subcommand().unwrap();

        assert!(project_patch(update).is_err());
    }
}
