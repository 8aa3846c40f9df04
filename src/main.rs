use std::fs::File;

use anyhow::{Result, anyhow};
use clap::Parser;
use daemonize::Daemonize;
use log::{LevelFilter, info};
use syslog::{BasicLogger, Facility, Formatter3164};

use armouryd::{application::Application, settings::SettingsManager};

mod cli;

fn init_log() -> Result<()> {
    syslog::unix(Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: "armouryd".into(),
        pid: 0,
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(LevelFilter::Info))
            .map_err(|e| anyhow!("{e}"))
    })
}

fn into_daemon() -> Result<()> {
    File::create("/var/tmp/armouryd.log")
        .and_then(|out| Ok((out.try_clone()?, out)))
        .map_err(|e| anyhow!("{e}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_log()?;

    // Fork before the runtime exists; tokio threads do not survive it.
    if args.daemonize {
        into_daemon()?;
    }

    run(args)
}

#[tokio::main]
async fn run(args: cli::Cli) -> Result<()> {
    info!("armouryd {} starting", env!("CARGO_PKG_VERSION"));

    let settings = SettingsManager::load(args.config).await?;

    Application::builder()
        .with_settings(settings)
        .build()
        .await?
        .run()
        .await
}
