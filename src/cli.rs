use clap::Parser;
use std::path::PathBuf;

/// armouryd — hotkey and mode daemon for ASUS ROG laptops
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML settings file path (default: ~/.config/armouryd/settings.yml)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Detach from the terminal and run as a daemon
    #[arg(short = 'd', long = "daemonize", default_value = "false")]
    pub daemonize: bool,
}
