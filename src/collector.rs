//! Sampling loop.
//!
//! Checks that the reader is usable, then samples on a fixed interval until
//! the shutdown future resolves.

use std::{future::Future, path::PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use log::{debug, info, warn};
use tokio::time::sleep;

use crate::{
    capture::{CaptureStore, SampleOutcome, classify},
    config::Settings,
    reader::ReaderClient,
};

/// Drives one reader through the collection loop.
///
/// # Example
///
/// ```no_run
/// use emcatcher::{capture::CaptureStore, collector::Collector, config::RawSettings, reader::Proxmark};
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = RawSettings::from_path("settings.conf".as_ref())?.verify()?;
/// let collector = Collector::new(
///     settings.clone(),
///     Proxmark::new(settings.binary()),
///     CaptureStore::new(settings.cards_dir()),
/// );
///
/// collector.check_binary().await?;
/// collector.check_device().await?;
/// collector.run(async { tokio::signal::ctrl_c().await.ok(); }).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Collector<R> {
    settings: Settings,
    reader: R,
    store: CaptureStore,
}

impl<R: ReaderClient> Collector<R> {
    pub fn new(settings: Settings, reader: R, store: CaptureStore) -> Self {
        Self {
            settings,
            reader,
            store,
        }
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    /// Fails when the reader binary is not installed.
    pub async fn check_binary(&self) -> Result<PathBuf> {
        let path = self
            .reader
            .locate()
            .await
            .context("Error: reader binary not found")?;

        info!("Using reader binary '{}'.", path.display());
        Ok(path)
    }

    /// Fails when the reader cannot talk to the configured device.
    pub async fn check_device(&self) -> Result<()> {
        let device = self.settings.device();

        let reachable = self
            .reader
            .probe(device)
            .await
            .with_context(|| format!("Error: could not probe device '{device}'"))?;

        if !reachable {
            bail!("Error: Device '{device}' not found.");
        }

        info!("Device '{device}' found.");
        Ok(())
    }

    /// Takes one sample. Returns the capture file when a tag was seen.
    pub async fn sample_once(&self) -> Result<Option<PathBuf>> {
        let command = self.settings.reader_command();
        let output = self.reader.run(&command, self.settings.device()).await?;

        match classify(&output) {
            SampleOutcome::NoTag => {
                debug!("No tag in field");
                Ok(None)
            }
            SampleOutcome::Tag => {
                let path = self.store.persist(&output, Utc::now().timestamp())?;
                info!("Sample collected! Saved to {}", path.display());
                Ok(Some(path))
            }
        }
    }

    /// Samples every `sample_rate` until `shutdown` resolves.
    ///
    /// A failed sample is logged and the loop carries on.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Starting active collection.");
        debug!(
            "Running '{}' every {:?}",
            self.settings.reader_command(),
            self.settings.sample_rate()
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Interrupt caught, stopping collection.");
                    break;
                }

                result = self.tick() => {
                    if let Err(e) = result {
                        warn!("Sample failed: {e:#}");
                    }
                }
            }
        }

        Ok(())
    }

    async fn tick(&self) -> Result<Option<PathBuf>> {
        sleep(self.settings.sample_rate()).await;
        self.sample_once().await
    }
}
