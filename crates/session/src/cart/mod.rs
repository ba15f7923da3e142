// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cart projection and its cross-tab synchronization.

pub mod channel;
pub mod sync;

use serde::{Deserialize, Serialize};

pub use channel::{BroadcastChannel, ChannelReceiver, ChannelRegistry};
pub use sync::CartSync;

pub const CART_PATH: &str = "cart";

/// Title of the notices raised for server-side cart warnings.
pub const CART_NOTICE_TITLE: &str = "Cart Notice";

/// One cart line as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: u64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

impl CartItem {
    pub fn line(&self) -> CartLine {
        CartLine { product_id: self.product_id, quantity: self.quantity }
    }
}

/// Desired quantity of one product, as sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: u64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CartUpdateRequest<'a> {
    pub items: &'a [CartLine],
}

/// Authoritative cart returned by every cart endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub cart_total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A tab's local copy of the cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: f64,
}

impl CartSnapshot {
    /// Number of distinct lines.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.items.iter().map(CartItem::line).collect()
    }

    pub fn quantity_of(&self, product_id: u64) -> Option<u32> {
        self.items.iter().find(|i| i.product_id == product_id).map(|i| i.quantity)
    }
}

impl CartResponse {
    pub fn lines(&self) -> Vec<CartLine> {
        self.items.iter().map(CartItem::line).collect()
    }
}

impl From<&CartResponse> for CartSnapshot {
    fn from(resp: &CartResponse) -> Self {
        Self { items: resp.items.clone(), total: resp.cart_total }
    }
}

/// Cross-tab cart message. Receivers overwrite their projection with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartMessage {
    Update {
        items: Vec<CartItem>,
        #[serde(default, rename = "cartTotal", skip_serializing_if = "Option::is_none")]
        cart_total: Option<f64>,
    },
}
