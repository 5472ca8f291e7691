mod app;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use log::{info, warn};
use taskflow_client::{config::DEFAULT_BASE_URL, ClientConfig, ClientError, TaskSession};
use tokio::sync::mpsc::{self, UnboundedSender};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::app::{App, Command};

/// Terminal front end for a taskflow record store.
#[derive(Parser, Debug)]
#[command(name = "taskflow", about = "Manage tasks from the terminal")]
struct Cli {
    /// Base URL of the record store.
    #[arg(long, env = "TASKFLOW_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Seconds before a remote call is reported as a network failure.
    #[arg(long, env = "TASKFLOW_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Log output goes here so it does not garble the screen.
    #[arg(long, default_value = "taskflow-tui.log")]
    log_file: PathBuf,
}

type Outcome = Result<String, ClientError>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let log_file = File::create(&cli.log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let config = ClientConfig::new(cli.api_url).with_timeout(Duration::from_secs(cli.timeout_secs));
    let session = Arc::new(TaskSession::connect(&config)?);
    info!("talking to {}", config.base_url);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, session.clone()).await;
    session.close();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, session: Arc<TaskSession>) -> io::Result<()> {
    let (outcomes, mut results) = mpsc::unbounded_channel();
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    let mut app = App::default();
    dispatch(Command::Reload, &session, &outcomes);

    loop {
        app.refresh(&session);
        terminal.draw(|f| ui::draw(f, &app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => match app.handle_key(key) {
                    Some(Command::Quit) => return Ok(()),
                    Some(command) => dispatch(command, &session, &outcomes),
                    None => {}
                },
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err),
                None => return Ok(()),
            },
            Some(outcome) = results.recv() => app.apply(outcome),
            // redraw so in-flight markers and the clock-based buckets stay fresh
            _ = tick.tick() => {}
        }
    }
}

/// Runs `command` off the input loop; its outcome comes back on `outcomes`.
fn dispatch(command: Command, session: &Arc<TaskSession>, outcomes: &UnboundedSender<Outcome>) {
    let session = session.clone();
    let outcomes = outcomes.clone();
    tokio::spawn(async move {
        let outcome = match command {
            Command::Quit => return,
            Command::Reload => session.load_all().await.map(|()| "Reloaded".to_string()),
            Command::Create(draft) => session
                .create_task(draft)
                .await
                .map(|task| format!("Added \"{}\"", task.title)),
            Command::Toggle(id) => session.toggle_complete(id).await.map(|task| {
                if task.completed {
                    format!("Completed \"{}\"", task.title)
                } else {
                    format!("Reopened \"{}\"", task.title)
                }
            }),
            Command::Delete(id) => session.delete_task(id).await.map(|()| "Task deleted".to_string()),
            Command::DeleteCategory(id) => session
                .delete_category(id)
                .await
                .map(|()| "Category deleted".to_string()),
        };
        if let Err(err) = &outcome {
            warn!("{} command failed: {err}", err.kind());
        }
        // the receiver is gone once the UI has quit
        let _ = outcomes.send(outcome);
    });
}
