use std::io::{self, Write};

use clap::Parser;
use composer_tui::app::App;
use composer_tui::cli::{self, Cli, Command};
use composer_tui::mentions::MentionCatalog;
use composer_tui::settings::{Settings, default_settings_path};

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    if let Some(log_file) = &cli.log_file {
        composer_tui::logging::init(log_file)?;
    }

    if let Some(Command::Roundtrip { value }) = &cli.command {
        return writeln!(io::stdout(), "{}", cli::roundtrip(value));
    }

    let settings = cli
        .settings
        .clone()
        .or_else(default_settings_path)
        .map(|path| Settings::load_or_default(&path))
        .unwrap_or_default();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let catalog = MentionCatalog::load(&root, &settings.repository, &settings.skills);
    tracing::info!(root = %root.display(), mentions = catalog.len(), "starting composer");

    let mut app = App::new(&settings, catalog, cli.value.as_deref());

    composer_tui::runtime::run(&mut app).await
}
