// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keel: client-side session manager for the storefront REST API.
//!
//! Every outbound call goes through the [`pipeline::RequestPipeline`], which
//! attaches the stored bearer token and funnels expired-token recovery into a
//! single-flight [`credential::refresh::RefreshCoordinator`]. Cart state is
//! projected locally per tab and kept convergent across tabs of the same
//! [`origin::Origin`] by a broadcast channel.

pub mod api;
pub mod cart;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod origin;
pub mod pipeline;
pub mod session;
pub mod token;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Once;

pub use crate::config::SessionConfig;
pub use crate::credential::{AuthResponse, Credential, Role, UserProfile};
pub use crate::error::{ErrorCode, SessionError};
pub use crate::events::SessionEvent;
pub use crate::origin::Origin;
pub use crate::session::Session;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
