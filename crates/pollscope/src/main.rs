mod app;
mod demo;
mod fetch;
mod theme;
mod ui;

use anyhow::Result;
use app::{App, FetchOutcome, TICK_MS};
use clap::Parser;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use demo::DemoFeed;
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pollscope", about = "Live timeline of async task polls")]
struct Args {
    /// Host serving the monitor feed (/update.json)
    #[arg(long, default_value = "127.0.0.1", env = "POLLSCOPE_HOST")]
    host: String,

    /// Feed port
    #[arg(long, default_value_t = 9090, env = "POLLSCOPE_PORT")]
    port: u16,

    /// Run against a synthetic local feed instead of the network
    #[arg(long)]
    demo: bool,

    /// Initial time scale, microseconds per column
    #[arg(long, env = "POLLSCOPE_SCALE")]
    scale: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let feed_addr = format!("{}:{}", args.host, args.port);
    let demo = args
        .demo
        .then(|| DemoFeed::new(u64::from(std::process::id())));
    let mut app = App::new(feed_addr, demo, args.scale);

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_MS));
    let (fetch_tx, mut fetch_rx) = mpsc::channel::<FetchOutcome>(1);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            _ = ticker.tick() => {
                if app.on_tick() {
                    spawn_fetch(app.feed_addr.clone(), fetch_tx.clone());
                }
            }
            Some(outcome) = fetch_rx.recv() => {
                app.on_fetch(outcome);
            }
            maybe_event = events.next() => {
                if let Some(Ok(event)) = maybe_event {
                    match event {
                        Event::Key(key)
                            if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                        {
                            app.handle_key(key);
                        }
                        Event::Mouse(mouse) => {
                            app.handle_mouse(mouse);
                        }
                        Event::Resize(_, _) => {
                            app.mark_resized();
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn spawn_fetch(addr: String, tx: mpsc::Sender<FetchOutcome>) {
    tokio::spawn(async move {
        let outcome = match fetch::fetch_update(&addr).await {
            Ok(update) => FetchOutcome::Update(update),
            Err(err) => FetchOutcome::Failed(format!("{err:#}")),
        };
        let _ = tx.send(outcome).await;
    });
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("POLLSCOPE_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
