use std::{path::Path, process::ExitCode};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use emcatcher::{
    application::{self, Application},
    cli::Cli,
    config::{self, RawSettings},
    reader::Proxmark,
    run_log::{self, RunLog},
};

fn report(e: &anyhow::Error) {
    if run_log::is_initialized() {
        error!("{e:#}");
    } else {
        eprintln!("{e:#}");
    }
}

async fn verify(path: &Path) -> Result<()> {
    let raw = RawSettings::from_path(path)?;
    application::verify_settings(&raw, |settings| Proxmark::new(settings.binary())).await?;
    Ok(())
}

fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => cancel.cancel(),
            Err(e) => warn!("Failed to listen for interrupt signal: {e}"),
        }
    });

    token
}

async fn collect(path: &Path) -> Result<()> {
    let raw = RawSettings::from_path(path);

    let logs_dir = config::logs_dir_or_default(raw.as_ref().ok());
    RunLog::create(&logs_dir, Utc::now().timestamp()).and_then(run_log::init_log)?;
    info!("Starting execution.");

    let settings = raw
        .and_then(|raw| Ok(raw.verify()?))
        .context("Error loading settings file")?;

    Application::builder()
        .with_settings(settings)
        .build()?
        .run(interrupt_token())
        .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let path = config::locate_settings(cli.settings);

    if cli.verify_settings {
        return match verify(&path).await {
            Ok(()) => {
                println!("[+] Settings file verified.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("[!] {e:#}");
                println!("[!] Settings file failed verification.");
                ExitCode::FAILURE
            }
        };
    }

    match collect(&path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
