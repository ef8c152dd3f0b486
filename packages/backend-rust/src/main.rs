use std::process::ExitCode;

use lexicon_algo::Scheduler;
use lexicon_backend::config::Config;
use lexicon_backend::db::SqliteStore;
use lexicon_backend::logging::init_tracing;
use lexicon_backend::services::StudyService;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_tracing(&config.logging);

    let scheduler = match Scheduler::new(config.srs.parameters()) {
        Ok(scheduler) => scheduler,
        Err(err) => {
            tracing::error!(error = %err, "invalid scheduler parameters");
            return ExitCode::FAILURE;
        }
    };

    let store = match SqliteStore::open(&config.sqlite).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, path = %config.sqlite.path.display(), "failed to open study database");
            return ExitCode::FAILURE;
        }
    };

    let service = StudyService::new(store, scheduler, config.srs.undo_window);

    let params = service.scheduler().parameters();
    tracing::info!(
        db = %config.sqlite.path.display(),
        desired_retention = params.desired_retention,
        max_interval_days = params.max_interval_days,
        enable_fuzz = params.enable_fuzz,
        learning_steps = params.learning_steps.len(),
        relearning_steps = params.relearning_steps.len(),
        undo_window_minutes = service.undo_window().num_minutes(),
        "study store ready"
    );

    ExitCode::SUCCESS
}
