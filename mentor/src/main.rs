//! mentor: terminal client for the financial-economics tutoring backend.
//!
//! # Startup sequence
//!
//! 1. Load config; errors print to stderr while the terminal is still normal.
//! 2. Start file logging under the data directory.
//! 3. Build the HTTP client. An invalid `api_url` aborts here, before the
//!    terminal is touched.
//! 4. Open the client-state store and resolve the user identity. A store
//!    failure degrades to an ephemeral identity.
//! 5. `install_panic_hook()`, `register_sigterm()`, `init_tui()`.
//! 6. Spawn the event task and the API worker, then fire the initial loads.
//!
//! The event loop exits only via `break`, so `restore_tui()` always runs; a
//! draw error is returned after the terminal is restored.

mod app;
mod config;
mod event;
mod theme;
mod tui;
mod ui;
mod worker;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use mentor_core::client::{ApiClient, TutorBackend};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::event::AppEvent;
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

/// Environment variable holding the tracing filter, e.g. `mentor_core=debug`.
const LOG_ENV: &str = "MENTOR_LOG";

/// Sends tracing output to `<dir>/mentor.log`; the terminal belongs to the UI.
fn init_logging(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mentor.log"))?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Opens the store under `dir`, or `None` if it cannot be opened.
async fn open_store(dir: &Path) -> Option<tokio_rusqlite::Connection> {
    let path = dir.join("state.db");
    match mentor_core::db::open_db(&path.to_string_lossy()).await {
        Ok(conn) => Some(conn),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "client-state store unavailable");
            None
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = config::Config::load();
    let data_dir = config.data_dir();
    if let Err(e) = init_logging(&data_dir) {
        eprintln!("mentor: logging disabled, cannot write to {}: {e}", data_dir.display());
    }
    let theme = theme::Theme::from_name(&config.theme);

    let client = ApiClient::new(&config.api_url).map_err(std::io::Error::other)?;
    info!(api_url = %client.base_url(), "starting");
    let backend: Arc<dyn TutorBackend> = Arc::new(client);

    let store = open_store(&data_dir).await;
    let user_id = mentor_core::identity::get_or_create_user_id(store.as_ref()).await;

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let (api_tx, api_rx) = mpsc::unbounded_channel();
    tokio::spawn(worker::api_worker_loop(
        Arc::clone(&backend),
        user_id.clone(),
        api_rx,
        handler.tx.clone(),
    ));

    let notifier = Arc::new(worker::ChannelNotifier::new(handler.tx.clone()));
    let mut state = app::AppState::new(user_id, notifier, config.search_k(), Some(api_tx));
    state.load_initial();

    let mut draw_error = None;
    'event_loop: loop {
        tokio::select! {
            // Heartbeat so SIGTERM is noticed even when no events arrive.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        // The only draw() call.
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            draw_error = Some(e);
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Mouse(mouse)) => {
                        handle_mouse(mouse, &mut state);
                    }
                    Some(AppEvent::Api(response)) => state.apply_response(*response),
                    Some(AppEvent::Refresh(what)) => state.refresh(what),
                    Some(AppEvent::Tick) => state.tick(),
                    // ratatui picks up the new size on the next draw.
                    Some(AppEvent::Resize(_, _)) => {}
                    None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    info!("stopped");
    match draw_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
