use anyhow::Result;
use tracing::{info, warn};
use a19_core::Config;

mod app;
mod handler;
mod highlight;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is best effort; the app still runs without a writable config dir
    match Config::app_dir().and_then(|dir| logging::init(&dir)) {
        Ok(path) => info!(path = %path.display(), "logging started"),
        Err(e) => eprintln!("a19: logging disabled: {}", e),
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "could not read config, using defaults");
            Config::new()
        }
    };

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &config).await;

    tui::restore()?;

    if let Err(e) = &result {
        warn!(error = %e, "exited with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, config: &Config) -> Result<()> {
    let mut app = App::new(config);
    let mut events = EventHandler::new();

    info!(model = %app.model, "a19 started");

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }

    if let Some(task) = app.generation_task.take() {
        task.abort();
    }
    Ok(())
}
