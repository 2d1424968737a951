use biz_dashboard::config::cli::{Command, ResolvedSettings};
use biz_dashboard::render::{render_event, render_metrics, render_snapshot};
use biz_dashboard::utils::error::{DashboardError, ErrorSeverity};
use biz_dashboard::utils::logger;
use biz_dashboard::{BusinessDashboard, BusinessQuery, CliConfig, DashboardEvent, HttpBackend};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

type Dashboard = BusinessDashboard<HttpBackend>;

const HELP: &str = "\
Commands:
  name <text>        set the business name
  location <text>    set the location
  analyze            fetch metrics for the current fields
  regenerate         ask for a new SEO headline
  show               print the dashboard
  help               print this list
  quit               leave";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };

    // 初始化日誌
    logger::init_logger(settings.log_format, cli.verbose, settings.log_level.as_deref());
    tracing::info!("Starting biz-dashboard");
    tracing::debug!("Resolved settings: {:?}", settings);

    let dashboard = Arc::new(build_dashboard(&settings)?);
    let printer = tokio::spawn(print_events(dashboard.subscribe()));
    let print_summary = matches!(cli.command, Command::Analyze { .. });

    let outcome = match cli.command {
        Command::Analyze {
            name,
            location,
            regenerate,
        } => run_analyze(&dashboard, BusinessQuery::new(name, location), regenerate).await,
        Command::Interactive => run_interactive(Arc::clone(&dashboard)).await,
    };

    // closing the bus ends the printer once it has caught up; every request
    // task has been joined, so this is the last handle
    let snapshot = dashboard.snapshot();
    drop(dashboard);
    printer.await?;

    match outcome {
        Ok(()) => {
            if let (true, Some(metrics)) = (print_summary, &snapshot.metrics) {
                println!("{}", render_metrics(&snapshot.query, metrics));
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    }
}

fn build_dashboard(settings: &ResolvedSettings) -> biz_dashboard::Result<Dashboard> {
    let backend = HttpBackend::from_config(&settings.dashboard)?;
    tracing::info!("Using backend at {}", backend.base_url());
    Ok(BusinessDashboard::new(backend))
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 2,      // 輸入錯誤
        ErrorSeverity::Medium => 3,   // 後端無法連線
        ErrorSeverity::High => 1,     // 設定錯誤
        ErrorSeverity::Critical => 4, // 系統錯誤
    }
}

async fn print_events(mut rx: broadcast::Receiver<DashboardEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = render_event(&event) {
                    println!("{}", line);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Event printer fell behind, skipped {} event(s)", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn run_analyze(
    dashboard: &Dashboard,
    query: BusinessQuery,
    regenerate: usize,
) -> Result<(), DashboardError> {
    dashboard.set_query(query);
    dashboard.analyze().await?;

    for round in 1..=regenerate {
        tracing::debug!("Headline regeneration {}/{}", round, regenerate);
        dashboard.regenerate().await?;
    }

    Ok(())
}

/// Runs one request in the background so the prompt stays responsive and
/// both busy labels can show at once.
fn spawn_request<F, Fut>(
    dashboard: &Arc<Dashboard>,
    command: &'static str,
    request: F,
) -> JoinHandle<()>
where
    F: FnOnce(Arc<Dashboard>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), DashboardError>> + Send + 'static,
{
    let dashboard = Arc::clone(dashboard);
    tokio::spawn(async move {
        // 單次請求失敗不影響互動流程，錯誤已透過通知顯示
        if let Err(e) = request(dashboard).await {
            tracing::debug!("Command '{}' failed: {}", command, e);
        }
    })
}

async fn run_interactive(dashboard: Arc<Dashboard>) -> Result<(), DashboardError> {
    println!("Local Business Dashboard");
    println!("{}", HELP);

    let mut pending: Vec<JoinHandle<()>> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));

        pending.retain(|handle| !handle.is_finished());
        match command {
            "" => {}
            "name" => dashboard.set_name(argument),
            "location" => dashboard.set_location(argument),
            "analyze" => pending.push(spawn_request(&dashboard, "analyze", |d| async move {
                d.analyze().await.map(|_| ())
            })),
            "regenerate" => {
                if dashboard.metrics().is_none() {
                    println!("Analyze a business first.");
                }
                pending.push(spawn_request(&dashboard, "regenerate", |d| async move {
                    d.regenerate().await.map(|_| ())
                }));
            }
            "show" => println!("{}", render_snapshot(&dashboard.snapshot())),
            "help" => println!("{}", HELP),
            "quit" | "exit" => break,
            other => println!("Unknown command '{}', type 'help'", other),
        }
    }

    // 等待尚未完成的請求，讓結果通知能印出
    for handle in pending {
        if let Err(e) = handle.await {
            tracing::warn!("Request task ended abnormally: {}", e);
        }
    }

    Ok(())
}
