// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication endpoints and their wire types.

use serde::{Deserialize, Serialize};

use crate::api::{read_json, ApiClient, ApiRequest};
use crate::credential::AuthResponse;
use crate::error::SessionError;

pub const LOGIN_PATH: &str = "auth/login";
pub const REGISTER_PATH: &str = "auth/register";
pub const REFRESH_PATH: &str = "auth/refresh-token";
pub const REVOKE_PATH: &str = "auth/revoke-token";

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email or user name.
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("remember_me", &self.remember_me)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Exchange the refresh cookie for a new access token. Never carries a
    /// bearer header.
    pub async fn refresh_token(&self) -> Result<AuthResponse, SessionError> {
        let resp = self.execute(&ApiRequest::post(REFRESH_PATH), None).await?;
        read_json(resp).await
    }

    /// Revoke the server-side session that `bearer` belongs to.
    pub async fn revoke_token(&self, bearer: &str) -> Result<(), SessionError> {
        self.execute(&ApiRequest::post(REVOKE_PATH), Some(bearer)).await?;
        Ok(())
    }
}
