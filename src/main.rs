use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use socdash::app::App;
use socdash::config::{self, ApiSettings, DEFAULT_REFRESH_SECS};
use socdash::core::NotifyLevel;
use socdash::infrastructure::runtime::{RefreshSchedule, RuntimeBridge, RuntimeCommand};
use socdash::infrastructure::HttpBackend;
use socdash::ui;

#[derive(Debug, Parser)]
#[command(
    name = "socdash",
    version,
    about = "socdash: terminal console for the social media automation backend"
)]
struct Args {
    /// Backend base URL (e.g. http://localhost:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// API key sent as X-API-Key
    #[arg(long)]
    api_key: Option<String>,

    /// Page to open first (e.g. calendar, approvals)
    #[arg(long)]
    page: Option<String>,

    /// Background refresh interval in seconds
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Log file (default: <data dir>/socdash.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    // The terminal belongs to the UI, so logs only go to the file
    let filter = EnvFilter::try_from_env("SOCDASH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    // Module panics are caught by the router; keep their report off the screen
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = args.log_file.clone().unwrap_or_else(config::log_path);
    init_logging(&log_path)?;

    let config = config::load();
    let settings = ApiSettings::resolve(args.api_url.as_deref(), args.api_key.as_deref(), &config);
    let refresh_secs = args
        .refresh_secs
        .or(config.refresh_secs)
        .unwrap_or(DEFAULT_REFRESH_SECS);
    let start_page = args.page.clone().or_else(|| config.start_page.clone());
    tracing::info!(
        base_url = %settings.base_url,
        key = %settings.masked_key(),
        refresh_secs,
        "starting socdash"
    );

    // Create the runtime bridge
    let backend = HttpBackend::new(&settings)?;
    let runtime = RuntimeBridge::new(
        Arc::new(backend),
        RefreshSchedule::every(Duration::from_secs(refresh_secs)),
    )?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, config);
    app.persist_config = true;
    app.start(start_page.as_deref());

    let res = run_app(&mut terminal, app, &runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %format!("{err:#}"), "event loop failed");
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: &RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        // Activation runs only once the new page is on screen
        app.on_frame();
        dispatch(&mut app, runtime);
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Resize(_, _) => {}
                _ => {}
            }
            dispatch(&mut app, runtime);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_event(event);
    }
}

/// Hand queued work to the runtime: backend swap first, so requests made
/// after a settings change already use the new backend
fn dispatch(app: &mut App, runtime: &RuntimeBridge) {
    if let Some(settings) = app.take_backend_swap() {
        match HttpBackend::new(&settings) {
            Ok(backend) => {
                if let Err(err) = runtime.send(RuntimeCommand::SwapBackend(Arc::new(backend))) {
                    app.set_status(err.to_string(), NotifyLevel::Error);
                }
            }
            Err(err) => app.set_status(format!("Backend unchanged: {err:#}"), NotifyLevel::Error),
        }
    }
    app.dispatch_batches(|batch| runtime.send(RuntimeCommand::Dispatch(batch)));
}
