use clap::Parser;
use codegraph::cli::{commands, Cli, Commands};
use codegraph::config::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {e}");
        std::process::exit(1);
    });

    let mut logging = settings.logging.clone();
    if cli.verbose >= 2 {
        logging.level = "trace".to_string();
    } else if cli.verbose == 1 {
        logging.level = "debug".to_string();
    }
    codegraph::logging::init_with_config(&logging);

    match cli.command {
        Commands::Init { path } => commands::init::run(&path),
        Commands::Index { path, mode } => commands::index::run(&settings, &path, &mode),
        Commands::Status { path } => commands::status::run(&settings, &path),
        Commands::Search { path, query, limit } => commands::search::run(&settings, &path, &query, limit),
        Commands::Snippet { path, file, start_line, end_line } => {
            commands::snippet::run(&path, &file, start_line, end_line)
        }
        Commands::Context { path, task, budget, hint_paths, hint_symbols } => {
            commands::context::run(&settings, &path, &task, budget, hint_paths, hint_symbols)
        }
        Commands::Serve { path } => commands::serve::run(settings, &path).await,
    }
}
