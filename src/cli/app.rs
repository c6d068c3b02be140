//! Main app runner for a session

use std::process::ExitCode;
use std::sync::Arc;

use crate::application::ports::{ConfigStore, SessionStore};
use crate::application::{FlowCallbacks, FlowError, RunSessionUseCase};
use crate::domain::config::AppConfig;
use crate::domain::session::Session;
use crate::infrastructure::{
    create_audio_cue, CpalCapture, HttpCollector, SessionFileStore, XdgConfigStore,
};

use super::args::Cli;
use super::presenter::Presenter;
use super::prompter::StdinPrompter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Run the interview session (fresh or resumed)
pub async fn run_session(cli: Cli) -> ExitCode {
    let presenter = Arc::new(Presenter::new());

    let config = load_merged_config(cli_config(&cli)).await;
    let store = SessionFileStore::new();

    // Persisted state wins over CLI identity: a half-finished session is
    // resumed with the token and folder it started with.
    let session = match store.load().await {
        Ok(Some(state)) => {
            let session = Session::resume(state, config.steps_or_default());
            if session.is_complete() {
                presenter.info("All answers already uploaded; finishing saved session");
            } else {
                presenter.info(&format!(
                    "Resuming session at step {} of {}",
                    session.current_step() + 1,
                    session.step_count()
                ));
            }
            session
        }
        Ok(None) => match (&cli.token, &cli.folder) {
            (Some(token), Some(folder)) => {
                Session::new(config.steps_or_default(), token, folder)
            }
            _ => {
                presenter.error(
                    "No session in progress. Start one with --token and --folder \
                     (both are issued when you sign in).",
                );
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        Err(e) => {
            presenter.error(&format!(
                "Could not read saved session: {}. Run 'vox-courier reset' to discard it.",
                e
            ));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    // Setup signal handler
    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    // Create adapters
    let capture = CpalCapture::new();
    let collector = HttpCollector::new(config.collector_url_or_default());
    let prompter = StdinPrompter::new();
    let cue = create_audio_cue(config.cues_or_default());

    let use_case = RunSessionUseCase::new(
        capture.clone(),
        capture,
        collector,
        store,
        prompter,
        cue,
        config.retry_policy_or_default(),
    );

    let callbacks = session_callbacks(&presenter);

    let prompts = config.prompts_or_default();
    match use_case.execute(session, &prompts, callbacks).await {
        Ok(outcome) => {
            presenter.spinner_success("Session finished");
            presenter.success(&format!(
                "Session complete: {} answer(s) uploaded this run",
                outcome.steps_uploaded
            ));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(FlowError::Abandoned { step, source }) => {
            presenter.stop_spinner();
            presenter.error(&format!("Step {} abandoned: {}", step + 1, source));
            presenter.info("Progress is saved; run again to retry this step.");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            presenter.stop_spinner();
            presenter.error(&e.to_string());
            presenter.info("Progress is saved; run again to resume.");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Progress callbacks driving the presenter's spinner through the
/// upload and finalize phases
fn session_callbacks(presenter: &Arc<Presenter>) -> FlowCallbacks {
    let on_upload = Arc::clone(presenter);
    let on_wait = Arc::clone(presenter);
    let on_failed = Arc::clone(presenter);
    let on_done = Arc::clone(presenter);
    let on_finish = Arc::clone(presenter);

    FlowCallbacks {
        on_upload_started: Some(Box::new(move |step: u32, size: &str| {
            on_upload.start_spinner(&format!("Uploading answer {} ({})...", step + 1, size));
        })),
        on_retry_wait: Some(Box::new(move |retries_remaining: u32, delay| {
            on_wait.update_spinner(&format!(
                "Upload failed, retrying in {}s ({} left)...",
                delay.as_secs(),
                retries_remaining
            ));
        })),
        on_upload_failed: Some(Box::new(move |step: u32, _err| {
            on_failed.spinner_fail(&format!("Answer {} upload failed", step + 1));
        })),
        on_step_completed: Some(Box::new(move |step: u32| {
            on_done.spinner_success(&format!("Answer {} uploaded", step + 1));
        })),
        on_finalizing: Some(Box::new(move || {
            on_finish.start_spinner("Finishing session...");
        })),
    }
}

/// Discard the persisted session, if any
pub async fn run_reset() -> ExitCode {
    let presenter = Presenter::new();
    let store = SessionFileStore::new();

    match store.clear().await {
        Ok(()) => {
            presenter.success("Saved session discarded");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Could not discard saved session: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Build the partial config carried by CLI flags
fn cli_config(cli: &Cli) -> AppConfig {
    AppConfig {
        collector_url: cli.collector_url.clone(),
        steps: cli.steps,
        retry_budget: cli.retries,
        base_delay_ms: cli.base_delay_ms,
        cues: if cli.cues { Some(true) } else { None },
        prompts: None,
    }
}

/// Load and merge configuration from file and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    // Merge: file < cli (accessors fill defaults for anything unset)
    file_config.merge(cli_config)
}
