//! Live placement feed.
//!
//! The push service delivers one payload per accepted placement by any
//! identity. Payloads arrive either bare (`{lat, lng, color}`) or wrapped
//! in a row-change envelope (`{"new": {...}}`). Delivery is at-least-once
//! with no replay across reconnects, so a reconnect triggers a fresh seed.

use crate::{
    runtime::{self, AsyncHandle},
    store::{cell::Cell, live::LiveCellStore},
    traits::{PushFeed, SeedSource},
    MapError, Result,
};
use futures::stream::{BoxStream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

/// Default channel name used for placement broadcasts.
pub const PLACEMENTS_CHANNEL: &str = "pixels";

/// One item delivered by a [`PushFeed`] stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSignal {
    /// Raw JSON payload of one accepted placement
    Payload(String),
    /// The transport re-established its connection; events may have been lost
    Reconnected,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedPayload {
    Envelope { new: Cell },
    Bare(Cell),
}

/// Decodes one feed payload into a quantized cell.
pub fn decode_payload(raw: &str) -> Result<Cell> {
    let payload: FeedPayload = serde_json::from_str(raw)
        .map_err(|e| MapError::ParseError(format!("feed payload: {e}")))?;

    Ok(match payload {
        FeedPayload::Envelope { new } => new,
        FeedPayload::Bare(cell) => cell,
    })
}

/// Counters describing what a pump has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub merged: u64,
    pub skipped: u64,
    pub reseeded: u64,
}

/// Applies feed signals to the store.
pub struct FeedPump {
    store: LiveCellStore,
    seed_source: Option<Arc<dyn SeedSource>>,
    seed_limit: usize,
    stats: FeedStats,
}

impl FeedPump {
    pub fn new(store: LiveCellStore) -> Self {
        let seed_limit = store.retention();
        Self {
            store,
            seed_source: None,
            seed_limit,
            stats: FeedStats::default(),
        }
    }

    /// Source used to re-seed after a reconnect gap
    pub fn with_reseed(mut self, source: Arc<dyn SeedSource>, limit: usize) -> Self {
        self.seed_source = Some(source);
        self.seed_limit = limit;
        self
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Handles one signal. Malformed payloads are skipped without touching
    /// the store; a failed re-seed leaves the previous set intact.
    pub async fn handle(&mut self, signal: FeedSignal) -> Result<()> {
        match signal {
            FeedSignal::Payload(raw) => match decode_payload(&raw) {
                Ok(cell) => {
                    self.store.merge(cell);
                    self.stats.merged += 1;
                    Ok(())
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    log::warn!("skipping malformed feed payload: {}", e);
                    Err(e)
                }
            },
            FeedSignal::Reconnected => {
                let Some(source) = &self.seed_source else {
                    log::warn!("feed reconnected but no seed source is configured; cells may be missing");
                    return Ok(());
                };
                let cells = source.load_recent(self.seed_limit).await?;
                log::info!("feed reconnected, re-seeding {} cells", cells.len());
                self.store.seed(cells);
                self.stats.reseeded += 1;
                Ok(())
            }
        }
    }

    /// Drains `stream` until it ends
    pub async fn run(mut self, mut stream: BoxStream<'static, FeedSignal>) -> FeedStats {
        while let Some(signal) = stream.next().await {
            if let Err(e) = self.handle(signal).await {
                log::debug!("feed signal not applied: {}", e);
            }
        }
        log::debug!("feed stream ended: {:?}", self.stats);
        self.stats
    }
}

/// A running feed subscription. Must be torn down with
/// [`FeedSubscription::unsubscribe`]; dropping the handle leaves the pump
/// running.
pub struct FeedSubscription {
    channel: String,
    handle: Box<dyn AsyncHandle>,
}

impl FeedSubscription {
    /// Performs the subscription handshake, then spawns the pump
    pub async fn open(feed: Arc<dyn PushFeed>, channel: &str, pump: FeedPump) -> Result<Self> {
        let stream = feed.subscribe(channel).await?;
        let handle = runtime::spawn(async move {
            pump.run(stream).await;
        })?;
        log::info!("subscribed to feed channel '{}'", channel);

        Ok(Self {
            channel: channel.to_string(),
            handle,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the pump is still consuming the stream
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn unsubscribe(self) {
        self.handle.cancel();
        log::info!("unsubscribed from feed channel '{}'", self.channel);
    }
}
