//! herald: terminal front end for the notification surface.
//!
//! `herald watch` keeps a push connection open and prints toasts and badge
//! changes as they happen; the other subcommands drive the notification
//! list, the backup panel, the audit log and the local preferences.

mod output;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald_client::{HeraldClient, PushConfig, PushConnection};
use herald_core::{
    AutoConfirm, CleanupPolicy, Confirm, HeraldConfig, ListFilter, LogFilter, PreferencesStore,
};
use herald_surface::{
    AdminLogView, BackupPanel, BadgeReconciler, ListState, NotificationListView,
    SidebarController, Surface, SurfaceEvent, ToastEvent,
};

use crate::prompt::{StdinConfirm, TerminalBell};

#[derive(Parser)]
#[command(name = "herald")]
#[command(author, version, about = "Real-time notifications, backups and audit log from the terminal")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: $HERALD_CONFIG or ~/.config/herald/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Unread,
    Read,
}

impl From<FilterArg> for ListFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => ListFilter::All,
            FilterArg::Unread => ListFilter::Unread,
            FilterArg::Read => ListFilter::Read,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Stay connected and print notifications as they arrive
    Watch {
        /// Do not ring the terminal bell
        #[arg(long)]
        quiet: bool,
    },

    /// Show the unread count
    Count,

    /// List notifications
    List {
        #[arg(short, long, value_enum, default_value = "all")]
        filter: FilterArg,

        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Mark a notification as read
    Read { id: i64 },

    /// Mark a notification as unread
    Unread { id: i64 },

    /// Delete a notification
    Delete { id: i64 },

    /// Mark every notification as read
    MarkAllRead,

    /// Delete every read notification
    ClearRead,

    /// Database backups (admin)
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Audit log (admin)
    #[command(subcommand)]
    Logs(LogsCommand),

    /// Local preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Subcommand)]
enum BackupCommand {
    /// List backups and totals
    List,

    /// Create a backup now
    Create {
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Check a backup's integrity
    Validate { id: i64 },

    /// Download a backup file
    Download {
        id: i64,

        /// Destination file (default: backup-<id>.db.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only print the download URL
        #[arg(long)]
        url: bool,
    },

    /// Replace the database with a backup
    Restore { id: i64 },

    /// Delete a backup
    Delete { id: i64 },

    /// Remove old backups
    Cleanup {
        #[arg(long, default_value_t = herald_core::defaults::BACKUP_KEEP_COUNT)]
        keep_count: u32,

        #[arg(long, default_value_t = herald_core::defaults::BACKUP_KEEP_DAYS)]
        keep_days: u32,
    },
}

#[derive(clap::Args, Clone, Default)]
struct LogFilterArgs {
    #[arg(long)]
    admin_id: Option<i64>,

    #[arg(long)]
    action: Option<String>,

    #[arg(long)]
    resource_type: Option<String>,

    /// YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,

    /// YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,
}

impl From<LogFilterArgs> for LogFilter {
    fn from(args: LogFilterArgs) -> Self {
        LogFilter {
            admin_id: args.admin_id,
            action: args.action,
            resource_type: args.resource_type,
            date_from: args.from,
            date_to: args.to,
        }
    }
}

#[derive(Subcommand)]
enum LogsCommand {
    /// List audit log entries
    List {
        #[command(flatten)]
        filter: LogFilterArgs,

        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Show one entry with its changes
    Show { id: i64 },

    /// Print the CSV export URL for the given filters
    ExportUrl {
        #[command(flatten)]
        filter: LogFilterArgs,
    },
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Print the stored preferences
    Show,

    /// Turn toast sounds on or off
    Sound {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Toggle the sidebar for the given viewport width
    Sidebar {
        #[arg(long, default_value_t = 1280)]
        width: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Erro: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Tracing setup.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, daily rotation)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "herald=info")
///
/// Console output goes to stderr so stdout stays clean for command output.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "herald=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("herald.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<HeraldConfig> {
    let config = match path {
        Some(path) => HeraldConfig::from_file(path)
            .with_context(|| format!("cannot load config from {}", path.display()))?,
        None => HeraldConfig::load().context("cannot load configuration")?,
    };
    Ok(config)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(StdinConfirm)
    };

    match cli.command {
        Commands::Prefs(command) => run_prefs(&config, command, cli.json),
        Commands::Watch { quiet } => watch(&config, quiet).await,
        Commands::Backup(command) => {
            let client = HeraldClient::from_config(&config)?;
            run_backup(&client, &*confirm, command, cli.json).await
        }
        Commands::Logs(command) => {
            let client = HeraldClient::from_config(&config)?;
            run_logs(&client, &config, command, cli.json).await
        }
        Commands::Count => count(&HeraldClient::from_config(&config)?, cli.json).await,
        Commands::List { filter, page } => {
            let client = HeraldClient::from_config(&config)?;
            list(&client, &config, filter.into(), page, cli.json).await
        }
        Commands::Read { id } => notify(&config, &*confirm, Mutation::Read(id)).await,
        Commands::Unread { id } => notify(&config, &*confirm, Mutation::Unread(id)).await,
        Commands::Delete { id } => notify(&config, &*confirm, Mutation::Delete(id)).await,
        Commands::MarkAllRead => notify(&config, &*confirm, Mutation::MarkAllRead).await,
        Commands::ClearRead => notify(&config, &*confirm, Mutation::ClearRead).await,
    }
}

async fn notify(
    config: &HeraldConfig,
    confirm: &dyn Confirm,
    mutation: Mutation,
) -> anyhow::Result<()> {
    let client = HeraldClient::from_config(config)?;
    mutate(&client, config, confirm, mutation).await
}

/// Notification list mutations; each reloads the list afterwards.
enum Mutation {
    Read(i64),
    Unread(i64),
    Delete(i64),
    MarkAllRead,
    ClearRead,
}

async fn count(client: &HeraldClient, json: bool) -> anyhow::Result<()> {
    let mut badge = BadgeReconciler::new();
    let count = badge.reconcile(client).await?;
    if json {
        return print_json(&serde_json::json!({
            "unread_count": count,
            "badge": badge.view(),
        }));
    }
    println!("{}", output::badge_line(count, &badge.view()));
    Ok(())
}

async fn list(
    client: &HeraldClient,
    config: &HeraldConfig,
    filter: ListFilter,
    page: u32,
    json: bool,
) -> anyhow::Result<()> {
    let mut list = NotificationListView::new(config.list.per_page);
    list.load(client, filter, page).await;
    let view = list.view(Utc::now());
    if let ListState::Error(message) = &view.state {
        anyhow::bail!("{message}");
    }
    if json {
        return print_json(&view);
    }
    print_lines(output::list_lines(&view));
    Ok(())
}

async fn mutate(
    client: &HeraldClient,
    config: &HeraldConfig,
    confirm: &dyn Confirm,
    mutation: Mutation,
) -> anyhow::Result<()> {
    let mut list = NotificationListView::new(config.list.per_page);

    let outcome = match mutation {
        Mutation::Read(id) => Some(list.mark_read(client, id).await?),
        Mutation::Unread(id) => Some(list.mark_unread(client, id).await?),
        Mutation::Delete(id) => list.delete(client, confirm, id).await?,
        Mutation::MarkAllRead => Some(list.mark_all_read(client).await?),
        Mutation::ClearRead => list.clear_read(client, confirm).await?,
    };

    let Some(outcome) = outcome else {
        println!("Cancelado");
        return Ok(());
    };
    if let Some(message) = &outcome.ack.message {
        println!("{message}");
    }
    if let Some(count) = outcome.unread_count() {
        let mut badge = BadgeReconciler::new();
        badge.apply(count);
        println!("{}", output::badge_line(count, &badge.view()));
    }
    Ok(())
}

async fn run_backup(
    client: &HeraldClient,
    confirm: &dyn Confirm,
    command: BackupCommand,
    json: bool,
) -> anyhow::Result<()> {
    let mut panel = BackupPanel::new();

    match command {
        BackupCommand::List => {
            panel.load(client).await?;
            if json {
                return print_json(&serde_json::json!({
                    "stats": panel.stats_view(),
                    "backups": panel.rows(),
                }));
            }
            print_lines(output::backup_lines(&panel.stats_view(), &panel.rows()));
        }
        BackupCommand::Create { notes } => {
            let backup = panel.create(client, notes.as_deref()).await?;
            println!("Backup criado com sucesso: {}", backup.filename);
        }
        BackupCommand::Validate { id } => {
            let validation = panel.validate(client, id).await?;
            if validation.is_valid {
                println!("✓ Backup valido!");
            } else {
                println!("✗ Backup invalido: {}", validation.message);
            }
        }
        BackupCommand::Download { id, output, url } => {
            if url {
                println!("{}", panel.download_url(client, id));
                return Ok(());
            }
            let dest = output.unwrap_or_else(|| PathBuf::from(format!("backup-{id}.db.gz")));
            let bytes = panel.download(client, id, &dest).await?;
            println!("{} bytes gravados em {}", bytes, dest.display());
        }
        BackupCommand::Restore { id } => {
            panel.load(client).await?;
            match panel.restore(client, confirm, id).await? {
                Some(outcome) => {
                    println!("✓ Banco de dados restaurado com sucesso!");
                    if let Some(safety) = outcome.safety_backup_id {
                        println!("Backup de segurança criado: #{safety}");
                    }
                    println!("Reinicie as sessões abertas para recarregar os dados.");
                }
                None => println!("Cancelado"),
            }
        }
        BackupCommand::Delete { id } => {
            if panel.delete(client, confirm, id).await? {
                println!("Backup removido com sucesso!");
            } else {
                println!("Cancelado");
            }
        }
        BackupCommand::Cleanup {
            keep_count,
            keep_days,
        } => {
            let removed = panel
                .cleanup(client, CleanupPolicy { keep_count, keep_days })
                .await?;
            println!("{removed} backups removidos!");
        }
    }
    Ok(())
}

async fn run_logs(
    client: &HeraldClient,
    config: &HeraldConfig,
    command: LogsCommand,
    json: bool,
) -> anyhow::Result<()> {
    let mut view = AdminLogView::new(config.logs.per_page);

    match command {
        LogsCommand::List { filter, page } => {
            view.apply_filters(client, filter.into()).await?;
            if page > 1 {
                view.load_page(client, page).await?;
            }
            if json {
                return print_json(&serde_json::json!({
                    "logs": view.rows(),
                    "total": view.total(),
                    "pagination": view.pagination(),
                }));
            }
            print_lines(output::log_lines(&view.rows(), &view.pagination().label));
        }
        LogsCommand::Show { id } => {
            let detail = view.details(client, id).await?;
            if json {
                return print_json(&detail);
            }
            print_lines(output::log_detail_lines(&detail));
        }
        LogsCommand::ExportUrl { filter } => {
            let filter: LogFilter = filter.into();
            println!("{}", herald_core::AdminLogApi::export_url(client, &filter));
        }
    }
    Ok(())
}

fn run_prefs(config: &HeraldConfig, command: PrefsCommand, json: bool) -> anyhow::Result<()> {
    let store = PreferencesStore::new(config.preferences_path());

    match command {
        PrefsCommand::Show => {
            let prefs = store.load();
            if json {
                return print_json(&prefs);
            }
            println!("Arquivo:          {}", store.path().display());
            println!("Sidebar recolhida: {}", prefs.sidebar_collapsed);
            println!("Som de notificação: {}", prefs.sound_enabled);
        }
        PrefsCommand::Sound { state } => {
            let enabled = matches!(state, Switch::On);
            store.update(|p| p.sound_enabled = enabled)?;
            println!("Som de notificação: {}", if enabled { "ativado" } else { "desativado" });
        }
        PrefsCommand::Sidebar { width } => {
            let mut sidebar = SidebarController::new(store, width);
            sidebar.toggle()?;
            let view = sidebar.view();
            if json {
                return print_json(&view);
            }
            println!("{}", view.classes().join(" "));
        }
    }
    Ok(())
}

async fn watch(config: &HeraldConfig, quiet: bool) -> anyhow::Result<()> {
    let prefs = PreferencesStore::new(config.preferences_path()).load();

    let push = PushConnection::new(PushConfig::from_config(config));
    let mut surface = Surface::from_config(config)?;
    if !quiet {
        surface = surface.with_sound(Arc::new(TerminalBell), prefs.sound_enabled);
    }

    let mut toasts = surface.subscribe_toasts();
    let mut events = surface.subscribe();
    let surface = surface.start(push.subscribe());
    let push = push.start();

    info!(
        base_url = %config.server.base_url,
        user_id = ?config.identity.user_id,
        is_admin = config.identity.is_admin,
        "Watching for notifications"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            toast = toasts.recv() => match toast {
                Ok(ToastEvent::Shown { event, .. }) => {
                    println!("{}", output::toast_line(&event, Utc::now()));
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            event = events.recv() => match event {
                Ok(SurfaceEvent::BadgeChanged(view)) => {
                    println!("🔔 {}", if view.visible { view.label } else { "0".to_string() });
                }
                Ok(SurfaceEvent::ActionFailed { action, message }) => {
                    eprintln!("Erro em {action}: {message}");
                }
                Ok(SurfaceEvent::ListChanged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    push.shutdown().await?;
    push.join().await?;
    surface.shutdown().await?;
    surface.join().await?;
    info!("Stopped");
    Ok(())
}
