// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process stand-in for the browser's `BroadcastChannel`.
//!
//! Channels are keyed by name within an origin. A message posted by one
//! handle reaches every other handle on the same name, never the sender.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::cart::CartMessage;

/// Messages buffered per channel before slow receivers start lagging.
pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct Envelope {
    sender: Uuid,
    message: CartMessage,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
}

impl ChannelRegistry {
    pub fn open(&self, name: &str) -> BroadcastChannel {
        let tx = self
            .channels
            .lock()
            .entry(name.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone();
        BroadcastChannel { name: name.to_owned(), id: Uuid::new_v4(), tx }
    }
}

/// One tab's handle on a named channel.
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    name: String,
    id: Uuid,
    tx: broadcast::Sender<Envelope>,
}

impl BroadcastChannel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Post to every other handle. Having no listeners is not an error.
    pub fn post(&self, message: CartMessage) {
        let delivered = self.tx.send(Envelope { sender: self.id, message }).unwrap_or(0);
        tracing::trace!(channel = %self.name, delivered, "broadcast posted");
    }

    pub fn subscribe(&self) -> ChannelReceiver {
        ChannelReceiver { id: self.id, rx: self.tx.subscribe() }
    }
}

pub struct ChannelReceiver {
    id: Uuid,
    rx: broadcast::Receiver<Envelope>,
}

impl ChannelReceiver {
    /// Next message from another handle, or `None` once the channel closes.
    /// Lagged messages are skipped: only the latest state matters.
    pub async fn recv(&mut self) -> Option<CartMessage> {
        loop {
            match self.rx.recv().await {
                Ok(env) if env.sender == self.id => continue,
                Ok(env) => return Some(env.message),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "cart channel lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
