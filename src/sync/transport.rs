//! Remote exchange seam

use std::path::PathBuf;

use super::payload::SyncItems;
use crate::error::{Result, TrailScribeError};

/// Carries one payload to the remote endpoint and brings one back
pub trait SyncTransport {
    /// Send the local payload and return the remote's payload for this device
    fn exchange(&self, outgoing: &SyncItems) -> Result<SyncItems>;
}

/// Exchange through JSON files, for sneakernet or a separate uploader.
///
/// The outgoing payload is written to `outbox`. The incoming payload is read
/// from `inbox`; a missing inbox means the remote had nothing to send.
#[derive(Debug, Clone)]
pub struct JsonFileTransport {
    outbox: PathBuf,
    inbox: PathBuf,
}

impl JsonFileTransport {
    pub fn new(outbox: impl Into<PathBuf>, inbox: impl Into<PathBuf>) -> Self {
        Self {
            outbox: outbox.into(),
            inbox: inbox.into(),
        }
    }
}

impl SyncTransport for JsonFileTransport {
    fn exchange(&self, outgoing: &SyncItems) -> Result<SyncItems> {
        if let Some(parent) = self.outbox.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.outbox, outgoing.to_json()?)?;
        tracing::info!(path = %self.outbox.display(), items = outgoing.len(), "Wrote outbox");

        if !self.inbox.exists() {
            return Ok(SyncItems::default());
        }
        let json = std::fs::read_to_string(&self.inbox)?;
        SyncItems::from_json(&json).map_err(|e| {
            TrailScribeError::Sync(format!(
                "unreadable inbox {}: {}",
                self.inbox.display(),
                e
            ))
        })
    }
}
