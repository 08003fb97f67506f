//! Application entry point and builder pattern implementation.

use anyhow::{Context, Result, bail};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::{
    capture::CaptureStore,
    collector::Collector,
    config::{RawSettings, Settings},
    reader::{Proxmark, ReaderClient},
};

/// Main application structure: a ready-to-run collector.
///
/// # Example
///
/// ```no_run
/// use emcatcher::{application::Application, config::RawSettings};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = RawSettings::from_path("settings.conf".as_ref())?.verify()?;
/// let app = Application::builder().with_settings(settings).build()?;
///
/// app.run(CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Application<R> {
    collector: Collector<R>,
}

impl Application<Proxmark> {
    /// Creates a new ApplicationBuilder for constructing Application instances.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }
}

impl<R: ReaderClient> Application<R> {
    pub fn collector(&self) -> &Collector<R> {
        &self.collector
    }

    /// Checks the reader, then collects until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        self.collector.check_binary().await?;
        self.collector.check_device().await?;

        self.collector
            .run(async move { shutdown.cancelled().await })
            .await
    }
}

/// Builder pattern for creating Application instances.
#[derive(Debug, Default)]
pub struct ApplicationBuilder {
    settings: Option<Settings>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self { settings: None }
    }

    /// Sets the verified settings for the application.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Builds the Application around the Proxmark client named in the settings.
    pub fn build(self) -> Result<Application<Proxmark>> {
        let reader = match &self.settings {
            Some(settings) => Proxmark::new(settings.binary()),
            None => bail!("Settings are required"),
        };
        self.build_with_reader(reader)
    }

    /// Builds the Application around any reader client.
    pub fn build_with_reader<R: ReaderClient>(self, reader: R) -> Result<Application<R>> {
        let settings = self
            .settings
            .ok_or_else(|| anyhow::anyhow!("Settings are required"))?;

        let store = CaptureStore::new(settings.cards_dir());
        store.ensure_dir()?;

        Ok(Application {
            collector: Collector::new(settings, reader, store),
        })
    }
}

/// Runs the `--verify-settings` checks against a settings file.
///
/// Loads and verifies the file, then asks the reader whether the device
/// answers.
pub async fn verify_settings<R, F>(raw: &RawSettings, reader_for: F) -> Result<Settings>
where
    R: ReaderClient,
    F: FnOnce(&Settings) -> R,
{
    let settings = raw.verify()?;
    let reader = reader_for(&settings);

    let reachable = reader
        .probe(settings.device())
        .await
        .with_context(|| format!("Could not run the reader against {}", settings.device()))?;

    if !reachable {
        bail!("Could not activate Proxmark on {}.", settings.device());
    }

    info!("Settings verified for device '{}'.", settings.device());
    Ok(settings)
}
