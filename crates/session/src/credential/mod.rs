// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential handling: the access token plus identity metadata, its durable
//! storage, and the single-flight refresh coordinator.

pub mod persist;
pub mod refresh;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use persist::{CredentialStorage, FileStorage, MemoryStorage};
pub use refresh::{RefreshCoordinator, RefreshTrigger};
pub use store::{ClearReason, CredentialStore};

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Seller,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Seller => "Seller",
            Self::Customer => "Customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by login, register and refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Identity metadata carried alongside the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Whether the user holds any of `roles`. An empty slice admits everyone.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.is_empty() || roles.iter().any(|r| self.roles.contains(r))
    }
}

/// The current access credential. At most one lives in a [`CredentialStore`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub user: UserProfile,
}

impl Credential {
    /// Whether the token is expired or undecodable right now.
    pub fn is_expired(&self) -> bool {
        crate::token::is_expired(&self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl From<AuthResponse> for Credential {
    fn from(resp: AuthResponse) -> Self {
        Self {
            access_token: resp.access_token,
            user: UserProfile {
                user_id: resp.user_id,
                full_name: resp.full_name,
                email: resp.email,
                roles: resp.roles,
                avatar_url: resp.avatar_url,
            },
        }
    }
}
