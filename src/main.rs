use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

use paddock::core::config;
use paddock::tui;

#[derive(Parser)]
#[command(name = "paddock", about = "Terminal horse-training game")]
struct Args {
    /// Directory for save files (overrides config and PADDOCK_SAVE_DIR)
    #[arg(long)]
    save_dir: Option<String>,

    /// Log verbosity (error, warn, info, debug)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // File logger - the terminal itself belongs to the TUI
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    if let Ok(log_file) = File::create("paddock.log") {
        let _ = WriteLogger::init(args.log_level, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {e}; continuing with defaults");
            Default::default()
        }
    };
    let resolved = config::resolve(&file_config, args.save_dir.as_deref());
    log::info!("Paddock starting up");
    log::debug!("Resolved config: {:?}", resolved);

    tui::run(resolved).await
}
