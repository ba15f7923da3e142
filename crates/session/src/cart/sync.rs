// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cart projection kept in step across tabs.
//!
//! Every successful mutation replaces the local projection with the server's
//! answer and broadcasts it. Other tabs overwrite their projection with
//! whatever arrives last; there is no merging.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::ApiRequest;
use crate::cart::{
    BroadcastChannel, CartItem, CartLine, CartMessage, CartResponse, CartSnapshot,
    CartUpdateRequest, CART_NOTICE_TITLE, CART_PATH,
};
use crate::error::{ErrorCode, SessionError};
use crate::events::SessionEvent;
use crate::pipeline::RequestPipeline;

pub struct CartSync {
    pipeline: Arc<RequestPipeline>,
    channel: BroadcastChannel,
    projection: Arc<watch::Sender<CartSnapshot>>,
    events: broadcast::Sender<SessionEvent>,
    shutdown: CancellationToken,
}

impl CartSync {
    /// Join `channel` and start listening for other tabs' updates.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        pipeline: Arc<RequestPipeline>,
        channel: BroadcastChannel,
        events: broadcast::Sender<SessionEvent>,
    ) -> Arc<Self> {
        let projection = Arc::new(watch::Sender::new(CartSnapshot::default()));
        let shutdown = CancellationToken::new();

        // Subscribe before spawning so nothing posted after `spawn` returns is missed.
        let mut rx = channel.subscribe();
        let listener_projection = Arc::clone(&projection);
        let listener_shutdown = shutdown.clone();
        let name = channel.name().to_owned();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = listener_shutdown.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Some(CartMessage::Update { items, cart_total }) => {
                            debug!(channel = %name, lines = items.len(), "cart update from another tab");
                            let total = cart_total.unwrap_or_else(|| line_totals(&items));
                            listener_projection.send_replace(CartSnapshot { items, total });
                        }
                        None => break,
                    },
                }
            }
        });

        Arc::new(Self { pipeline, channel, projection, events, shutdown })
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.projection.borrow().clone()
    }

    /// Watch the projection; the receiver sees every overwrite.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.projection.subscribe()
    }

    /// Load the cart from the server without broadcasting.
    pub async fn fetch_cart(&self) -> Result<CartResponse, SessionError> {
        let resp: CartResponse = self.pipeline.send_json(ApiRequest::get(CART_PATH)).await?;
        self.projection.send_replace(CartSnapshot::from(&resp));
        self.publish_warnings(&resp);
        Ok(resp)
    }

    /// Replace the server cart with `lines` and share the result.
    pub async fn update_cart(&self, lines: &[CartLine]) -> Result<CartResponse, SessionError> {
        let req = ApiRequest::post(CART_PATH).json(&CartUpdateRequest { items: lines })?;
        let resp: CartResponse = self.pipeline.send_json(req).await?;
        self.apply_and_broadcast(CartSnapshot::from(&resp));
        self.publish_warnings(&resp);
        Ok(resp)
    }

    pub async fn clear_cart(&self) -> Result<CartResponse, SessionError> {
        let resp: Option<CartResponse> =
            self.pipeline.send_json(ApiRequest::delete(CART_PATH)).await?;
        self.apply_and_broadcast(CartSnapshot::default());
        info!("cart cleared");
        Ok(resp.unwrap_or_default())
    }

    /// Add `quantity` of a product, merging into an existing line.
    pub async fn add_to_cart(&self, product_id: u64, quantity: u32) -> Result<CartResponse, SessionError> {
        if quantity == 0 {
            return Err(SessionError::new(ErrorCode::BadRequest, "quantity must be positive"));
        }
        let mut lines = self.snapshot().lines();
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => lines.push(CartLine { product_id, quantity }),
        }
        self.update_cart(&lines).await
    }

    /// Take one unit off a product, dropping the line at quantity one.
    pub async fn decrease_from_cart(&self, product_id: u64) -> Result<CartResponse, SessionError> {
        let mut lines = self.snapshot().lines();
        match lines.iter().position(|l| l.product_id == product_id) {
            Some(idx) if lines[idx].quantity > 1 => lines[idx].quantity -= 1,
            Some(idx) => {
                lines.remove(idx);
            }
            None => {}
        }
        self.update_cart(&lines).await
    }

    pub async fn remove_from_cart(&self, product_id: u64) -> Result<CartResponse, SessionError> {
        let lines: Vec<CartLine> =
            self.snapshot().lines().into_iter().filter(|l| l.product_id != product_id).collect();
        self.update_cart(&lines).await
    }

    /// Empty the local projection only. Used when the credential is cleared.
    pub fn reset_local(&self) {
        self.projection.send_replace(CartSnapshot::default());
    }

    fn apply_and_broadcast(&self, snapshot: CartSnapshot) {
        let message = CartMessage::Update { items: snapshot.items.clone(), cart_total: Some(snapshot.total) };
        self.projection.send_replace(snapshot);
        self.channel.post(message);
    }

    fn publish_warnings(&self, resp: &CartResponse) {
        for warning in &resp.warnings {
            let _ = self.events.send(SessionEvent::warning(Some(CART_NOTICE_TITLE), warning.clone()));
        }
    }
}

impl Drop for CartSync {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for CartSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSync")
            .field("channel", &self.channel.name())
            .field("lines", &self.projection.borrow().count())
            .finish()
    }
}

fn line_totals(items: &[CartItem]) -> f64 {
    items.iter().filter_map(|i| i.total).sum()
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
