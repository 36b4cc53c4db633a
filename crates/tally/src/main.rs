//! `tally` - CLI for the persistent counter
//!
//! With no command this opens the counter screen.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;
use tracing::warn;

use tally::cli::{Cli, Command, ConfigCommand};
use tally::storage::{RecordStore, Storage, UnavailableStore};
use tally::ui::Ui;
use tally::{init_logging, Config, TotalController, TOTAL_ID};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            // The screen owns the terminal, so logs go to a file
            init_logging(verbosity, Some(&config.log_file_path()));
            handle_run(&config)
        }
        Command::Status(status_cmd) => {
            init_logging(verbosity, None);
            handle_status(&config, status_cmd.json)
        }
        Command::Config(config_cmd) => {
            init_logging(verbosity, None);
            handle_config(&config, config_cmd)
        }
    }
}

fn handle_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match Storage::shared(config.database_path()) {
        Ok(storage) => run_screen(config, storage),
        Err(e) => {
            warn!("Database unavailable, the total will not be saved: {}", e);
            run_screen(config, UnavailableStore::new(e.to_string()))
        }
    }
}

fn run_screen<S: RecordStore>(config: &Config, store: S) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = TotalController::new(store, config.notification_duration());
    controller.launch();

    let mut ui = Ui::init(config.tick_interval())?;
    ui.run(&mut controller)?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::open(config.database_path())?;
    let record = storage.get(TOTAL_ID)?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "record": record,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("tally status");
        println!("------------");
        println!("Database:      {}", storage.path().display());
        match record {
            Some(record) => {
                println!("Total:         {}", record.value);
                println!("Last updated:  {}", record.last_updated);
            }
            None => println!("Total:         (no saved total yet)"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[UI]");
                println!("  Notification (ms):  {}", config.ui.notification_ms);
                println!("  Tick (ms):          {}", config.ui.tick_ms);
                println!();
                println!("[Logging]");
                println!("  Log file:           {}", config.log_file_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
