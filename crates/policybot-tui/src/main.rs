use anyhow::Result;
use clap::Parser;
use policybot_core::{AccessContext, Config, QueryProtocol};

mod app;
mod effects;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser, Debug, Default)]
#[command(name = "policybot")]
#[command(about = "Chat with your uploaded policy documents from the terminal")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides POLICYBOT_BACKEND_URL and the config file)
    #[arg(long)]
    backend_url: Option<String>,

    /// Show the model picker
    #[arg(long)]
    admin: bool,

    /// Wait for the complete answer instead of streaming it
    #[arg(long)]
    single_shot: bool,
}

impl Cli {
    /// Flags win over everything the config already resolved.
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.backend_url {
            config.backend_url = url.clone();
        }
        if self.admin {
            config.admin = true;
        }
        if self.single_shot {
            config.query_protocol = QueryProtocol::SingleShot;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|err| {
        eprintln!("Ignoring unreadable config: {}", err);
        let mut config = Config::new();
        config.apply_env();
        config
    });
    cli.apply(&mut config);

    if let Some(path) = logging::initialize(&config.log_level) {
        log::info!("Logging to {}", path.display());
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &config).await;

    tui::restore()?;
    if let Err(err) = &result {
        log::error!("Exiting with error: {:#}", err);
    }
    result
}

async fn run(terminal: &mut tui::Tui, config: &Config) -> Result<()> {
    let mut events = EventHandler::new();
    let access = AccessContext::new(config.admin);
    let mut app = App::new(config, access, events.sender());
    app.start();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(&mut app, event)?;
    }

    log::info!("Session {} closed", app.conversation.session_id());
    Ok(())
}
