use clap::Parser;
use std::path::PathBuf;

/// emcatcher — headless tag collector for Proxmark3 readers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON settings file path (default: $EMCATCHER_SETTINGS or ./settings.conf)
    #[arg(short = 's', long = "settings")]
    pub settings: Option<PathBuf>,

    /// Verify the settings file and the reader device, then exit
    #[arg(short = 'v', long = "verify-settings", visible_alias = "verify_settings")]
    pub verify_settings: bool,
}
