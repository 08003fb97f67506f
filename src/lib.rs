//! # emcatcher
//!
//! A headless collector for Proxmark3-style RFID/NFC readers.
//!
//! ## Features
//!
//! - **Polling**: Runs the reader's search command on a fixed interval
//! - **Capture**: Keeps every sample that is not a "no tag found" answer
//! - **Run Log**: Timestamped, flushed-per-line log for every run
//! - **Verification**: Checks settings and device reachability up front
//!
//! ## Architecture
//!
//! - [`Collector`](collector::Collector) - Startup checks and sampling loop
//! - [`ReaderClient`](reader::ReaderClient) - Seam around the reader subprocess
//! - [`CaptureStore`](capture::CaptureStore) - Capture files on disk
//! - [`RunLogger`](run_log::RunLogger) - `log` backend for the run log
//!
//! ## Example
//!
//! ```no_run
//! use emcatcher::{application::Application, config::RawSettings};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = RawSettings::from_path("settings.conf".as_ref())?.verify()?;
//!     Application::builder()
//!         .with_settings(settings)
//!         .build()?
//!         .run(CancellationToken::new())
//!         .await
//! }
//! ```

pub mod application;
pub mod capture;
pub mod cli;
pub mod collector;
pub mod config;
pub mod reader;
pub mod run_log;
