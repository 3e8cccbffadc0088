//! `Todosync` — real-time personal task list, headless demo.
//!
//! Spins up the in-process backend, registers a demo account, and walks a
//! task list through its life: create, complete, archive, each step driven
//! by the live subscription rather than local bookkeeping.
//!
//! ```bash
//! cargo run --bin todosync
//!
//! # With a dedicated account
//! cargo run --bin todosync -- --email alice@example.com --password hunter2
//!
//! # Or via environment variables
//! TODOSYNC_EMAIL=alice@example.com TODOSYNC_PASSWORD=hunter2 cargo run
//! ```

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use todosync::attachments::Attachments;
use todosync::auth::AuthClient;
use todosync::config::{CliArgs, ClientConfig, DemoAccount};
use todosync::tasks::{SyncPhase, TaskListController, TaskListSnapshot, TaskStore};
use todosync_backend::documents::DocumentCollection;
use todosync_backend::identity::IdentityProvider;
use todosync_backend::objects::ObjectStore;
use todosync_model::task::{Priority, TaskDraft};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!("todosync starting");

    let result = run_demo(&config).await;

    tracing::info!("todosync exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("todosync.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// End-to-end demo: register, sync, mutate, observe each push.
async fn run_demo(config: &ClientConfig) -> Result<(), Box<dyn Error>> {
    let documents = Arc::new(DocumentCollection::with_capacity(config.max_documents));
    let objects = Arc::new(ObjectStore::with_max_object_bytes(config.max_image_bytes));
    let identity = Arc::new(IdentityProvider::with_min_password_length(
        config.min_password_length,
    ));

    let auth = AuthClient::new(identity);
    let controller = TaskListController::new(
        TaskStore::new(documents),
        Attachments::new(objects),
    );

    // Settle the session before any task work.
    auth.resolve();

    let account = config.demo_account().unwrap_or_else(|| DemoAccount {
        email: "demo@example.com".to_string(),
        password: "demo-secret".to_string(),
        display_name: Some("Demo".to_string()),
    });
    let profile = auth
        .register(&account.email, &account.password, &account.password)
        .await?;
    if let Some(name) = &account.display_name {
        auth.update_display_name(name).await?;
    }
    println!("signed in as {} ({})", profile.email, profile.user_id);

    let mut state = controller.subscribe();
    controller.start(&profile.user_id).await;
    let _ = state.wait_for(|s| s.phase == SyncPhase::Active).await?;

    let today = Utc::now();
    let milk = controller
        .add_task(
            &profile.user_id,
            TaskDraft {
                title: "Buy milk".to_string(),
                description: None,
                priority: Priority::High,
                tags: vec!["errand".to_string()],
                due_date: today,
                image_url: None,
            },
        )
        .await?;
    let report = controller
        .add_task(
            &profile.user_id,
            TaskDraft {
                title: "Write report".to_string(),
                description: Some("quarterly numbers".to_string()),
                priority: Priority::Medium,
                tags: vec!["work".to_string()],
                due_date: today + Duration::days(1),
                image_url: None,
            },
        )
        .await?;
    controller
        .add_task(
            &profile.user_id,
            TaskDraft {
                title: "Water plants".to_string(),
                description: None,
                priority: Priority::Low,
                tags: vec![],
                due_date: today + Duration::days(2),
                image_url: None,
            },
        )
        .await?;

    let _ = state.wait_for(|s| s.tasks.len() == 3).await?;
    print_list("after adding three tasks", &state.borrow().clone());

    controller.set_completion(&milk, true).await?;
    let _ = state
        .wait_for(|s| s.tasks.iter().any(|t| t.id == milk && t.is_done))
        .await?;
    print_list("after completing 'Buy milk'", &state.borrow().clone());

    controller.archive_task(&report).await?;
    let _ = state.wait_for(|s| s.tasks.len() == 2).await?;
    print_list("after archiving 'Write report'", &state.borrow().clone());

    controller.stop().await;
    auth.sign_out();
    println!("signed out");
    Ok(())
}

/// Print a snapshot in display order.
fn print_list(label: &str, snapshot: &TaskListSnapshot) {
    println!("-- {label} --");
    for task in snapshot.tasks.iter() {
        let mark = if task.is_done { "x" } else { " " };
        println!(
            "  [{mark}] {} ({}, due {})",
            task.title,
            task.priority,
            task.due_date.format("%Y-%m-%d")
        );
    }
}
