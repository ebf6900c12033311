mod app;
mod cli;
mod config;
mod github;
mod labels;
mod markdown;
mod pagination;
mod query;
mod theme;
mod ui;

use std::env;
use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::app::App;
use crate::cli::{CliCommand, USAGE, parse_args};
use crate::config::Config;
use crate::github::GitHubClient;
use crate::query::{
    IssueDetail, Label, QueryCache, QueryData, QueryKey, fetch_detail, fetch_labels, fetch_query,
    view_model,
};

type TuiBackend = CrosstermBackend<Stdout>;
type Tui = Terminal<TuiBackend>;

const TICK_RATE: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if let Some(command) = parse_args(&args)? {
        return handle_command(command);
    }

    let config = Config::load()?;
    let client = GitHubClient::new()?;

    let mut terminal_guard = TerminalGuard::init()?;
    let mut app = App::new();
    let mut cache = QueryCache::new();
    let (event_tx, event_rx) = mpsc::channel();

    run_app(
        terminal_guard.terminal_mut(),
        &mut app,
        &mut cache,
        &config,
        &client,
        event_rx,
        event_tx,
    )?;
    Ok(())
}

fn handle_command(command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Labels => handle_labels(),
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn handle_labels() -> Result<()> {
    let config = Config::load()?;
    let client = GitHubClient::new()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let labels = runtime.block_on(fetch_labels(&client, config.label_retry))?;
    for label in &labels {
        println!("#{}  {}", label.color, label.name);
    }
    Ok(())
}

fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    cache: &mut QueryCache,
    config: &Config,
    client: &GitHubClient,
    event_rx: Receiver<AppEvent>,
    event_tx: Sender<AppEvent>,
) -> Result<()> {
    loop {
        handle_events(app, cache, &event_rx);
        drive_background_tasks(app, cache, config, client, &event_tx);

        let vm = view_model(cache, &app.active_queries());
        terminal.draw(|frame| ui::draw(frame, app, &vm))?;
        app.note_shown(cache);

        if app.should_quit() {
            return Ok(());
        }

        if !event::poll(TICK_RATE)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            app.on_key(key, &vm);
        }

        handle_actions(app);
        drive_background_tasks(app, cache, config, client, &event_tx);
    }
}

enum AppEvent {
    QueryFinished {
        key: QueryKey,
        attempt: u64,
        result: Result<QueryData, String>,
    },
    LabelsLoaded {
        result: Result<Vec<Label>, String>,
    },
    DetailLoaded {
        number: i64,
        result: Result<IssueDetail, String>,
    },
}

fn handle_events(app: &mut App, cache: &mut QueryCache, event_rx: &Receiver<AppEvent>) {
    while let Ok(event) = event_rx.try_recv() {
        match event {
            AppEvent::QueryFinished {
                key,
                attempt,
                result,
            } => {
                cache.complete(&key, attempt, result);
            }
            AppEvent::LabelsLoaded { result } => app.apply_labels(result),
            AppEvent::DetailLoaded { number, result } => app.apply_detail(number, result),
        }
    }
}

fn drive_background_tasks(
    app: &mut App,
    cache: &mut QueryCache,
    config: &Config,
    client: &GitHubClient,
    event_tx: &Sender<AppEvent>,
) {
    if app.take_queries_dirty() {
        let queries = app.active_queries();
        let browse = queries.browse;
        if let Some(attempt) = cache.ensure(&browse) {
            start_query_fetch(
                client.clone(),
                browse,
                attempt,
                config.page_size,
                event_tx.clone(),
            );
        }
        if let Some(search) = queries.search {
            if let Some(attempt) = cache.ensure(&search) {
                start_query_fetch(
                    client.clone(),
                    search,
                    attempt,
                    config.page_size,
                    event_tx.clone(),
                );
            }
        }
    }

    if let Some(key) = app.take_resubmit() {
        if let Some(attempt) = cache.resubmit(&key, config.search_resubmit) {
            start_query_fetch(
                client.clone(),
                key,
                attempt,
                config.page_size,
                event_tx.clone(),
            );
        }
    }

    if app.begin_label_load() {
        start_label_fetch(client.clone(), config.label_retry, event_tx.clone());
    }

    if let Some(number) = app.take_detail_request() {
        start_detail_fetch(client.clone(), number, event_tx.clone());
    }
}

fn handle_actions(app: &mut App) {
    if let Some(url) = app.take_open_url() {
        if let Err(error) = open_url(&url) {
            app.set_status(format!("Browser open failed: {}", error));
        }
    }
}

fn start_query_fetch(
    client: GitHubClient,
    key: QueryKey,
    attempt: u64,
    page_size: u32,
    event_tx: Sender<AppEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(error) => {
                let _ = event_tx.send(AppEvent::QueryFinished {
                    key,
                    attempt,
                    result: Err(error.to_string()),
                });
                return;
            }
        };

        let result = runtime
            .block_on(fetch_query(&client, &key, page_size))
            .map_err(|error| error.to_string());
        let _ = event_tx.send(AppEvent::QueryFinished {
            key,
            attempt,
            result,
        });
    });
}

fn start_label_fetch(client: GitHubClient, retry: bool, event_tx: Sender<AppEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(error) => {
                let _ = event_tx.send(AppEvent::LabelsLoaded {
                    result: Err(error.to_string()),
                });
                return;
            }
        };

        let result = runtime
            .block_on(fetch_labels(&client, retry))
            .map_err(|error| error.to_string());
        let _ = event_tx.send(AppEvent::LabelsLoaded { result });
    });
}

fn start_detail_fetch(client: GitHubClient, number: i64, event_tx: Sender<AppEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(error) => {
                let _ = event_tx.send(AppEvent::DetailLoaded {
                    number,
                    result: Err(error.to_string()),
                });
                return;
            }
        };

        let result = runtime
            .block_on(fetch_detail(&client, number))
            .map_err(|error| error.to_string());
        let _ = event_tx.send(AppEvent::DetailLoaded { number, result });
    });
}

fn open_url(url: &str) -> Result<()> {
    if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).status()?;
        return Ok(());
    }

    if cfg!(target_os = "windows") {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
        return Ok(());
    }

    std::process::Command::new("xdg-open").arg(url).status()?;
    Ok(())
}

struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    fn init() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal })
    }

    fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}
