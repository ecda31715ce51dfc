//! EduSmart · student progress engine
//!
//! - `edusmart serve` (default): Axum JSON API + static frontend fallback
//! - `edusmart journey`: scripted student journey against a running engine
//!
//! Important env variables:
//!   PORT                 : u16 (default 8000)
//!   EDUSMART_CONFIG_PATH : path to TOML config
//!   EDUSMART_BASE_URL    : engine URL used by `journey`
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use edusmart::client::journey::{run_journey, JourneyPlan};
use edusmart::client::{ApiClient, FileSessionStore, RunnerConfig, SessionContext, TracingNavigator};
use edusmart::config::{AppConfig, ServerConfig};
use edusmart::server::{build_router, spawn_local, state::AppState};
use edusmart::telemetry;

#[derive(Parser)]
#[command(name = "edusmart", version, about = "EduSmart student progress engine")]
struct Cli {
  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the progress engine
  Serve,
  /// Register a QA student and walk through videos, test and rewards
  Journey {
    /// Engine URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,
    /// Pause between test answers, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Start an in-process engine on a random local port instead
    #[arg(long)]
    local: bool,
  },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();
  let cli = Cli::parse();
  let config = AppConfig::from_env();

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(config.server).await,
    Command::Journey { base_url, delay_ms, local } => {
      let base_url = if local {
        let (addr, _state) = spawn_local(config.server.clone()).await?;
        format!("http://{addr}")
      } else {
        base_url.unwrap_or_else(|| config.client.base_url.clone())
      };
      let mut runner = RunnerConfig::from(&config.client);
      if let Some(ms) = delay_ms {
        runner.inter_question_delay = Duration::from_millis(ms);
      }
      let store = FileSessionStore::new(config.client.session_path.clone());
      journey(base_url, store, runner).await
    }
  }
}

#[instrument(level = "info", skip_all, fields(port = config.port))]
async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
  let state = Arc::new(AppState::new(config));
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "edusmart", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "edusmart", "Shutdown signal received");
    })
    .await?;
  Ok(())
}

async fn journey(
  base_url: String,
  store: FileSessionStore,
  runner: RunnerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
  let ctx = SessionContext::new(Arc::new(store), Arc::new(TracingNavigator));
  let api = ApiClient::new(base_url, ctx);
  let plan = JourneyPlan::qa_bot(&JourneyPlan::timestamp_suffix(), runner);

  let report = run_journey(&api, &plan).await?;
  info!(
    target: "progress",
    student_id = %report.student.id,
    video = ?report.video.as_ref().map(|v| v.video_id.as_str()),
    answered = report.run.answered,
    points = report.points,
    final_page = report.final_page.path(),
    "{} · {}: {}",
    report.run.marker(),
    report.points_label,
    report.points
  );
  Ok(())
}
