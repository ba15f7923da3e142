// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One tab's view of the authenticated session.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::auth::{LoginRequest, RegisterRequest, LOGIN_PATH, REGISTER_PATH};
use crate::api::{ApiClient, ApiRequest};
use crate::cart::CartSync;
use crate::config::SessionConfig;
use crate::credential::{
    AuthResponse, ClearReason, Credential, CredentialStore, RefreshCoordinator, RefreshTrigger,
    Role, UserProfile,
};
use crate::error::{ErrorCode, SessionError};
use crate::events::{SessionEvent, EVENT_CAPACITY};
use crate::origin::Origin;
use crate::pipeline::RequestPipeline;

pub const LOGIN_REQUIRED_NOTICE: &str = "Please login first";
pub const FORBIDDEN_NOTICE: &str = "You do not have permission to access this page.";

pub struct Session {
    config: SessionConfig,
    store: Arc<CredentialStore>,
    pipeline: Arc<RequestPipeline>,
    cart: Arc<CartSync>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Open a tab on `origin`. Must be called from within a tokio runtime.
    pub fn open(config: SessionConfig, origin: &Origin) -> Result<Self, SessionError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let store = Arc::new(CredentialStore::open(origin.storage()));
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&store),
            events.clone(),
            config.login_path.clone(),
        ));
        let api = Arc::new(ApiClient::new(&config, origin.cookies())?);
        let pipeline = Arc::new(RequestPipeline::new(
            api,
            Arc::clone(&store),
            coordinator,
            events.clone(),
            config.bypass_markers.clone(),
        ));
        let cart = CartSync::spawn(
            Arc::clone(&pipeline),
            origin.channel(&config.cart_channel),
            events.clone(),
        );

        let weak_cart = Arc::downgrade(&cart);
        store.on_clear(move |reason| {
            if let Some(cart) = weak_cart.upgrade() {
                debug!(reason = reason.as_str(), "resetting cart projection");
                cart.reset_local();
            }
        });

        Ok(Self { config, store, pipeline, cart, events })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn current_credential(&self) -> Option<Credential> {
        self.store.get()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.store.get().map(|c| c.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_present()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn cart(&self) -> &Arc<CartSync> {
        &self.cart
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Credential, SessionError> {
        let body = LoginRequest {
            identifier: identifier.to_owned(),
            password: password.to_owned(),
            remember_me,
        };
        let resp: AuthResponse =
            self.pipeline.send_json(ApiRequest::post(LOGIN_PATH).json(&body)?).await?;
        let cred = self.sign_in(resp);

        if let Err(e) = self.cart.fetch_cart().await {
            warn!(err = %e, "failed to load cart after login");
        }
        Ok(cred)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<Credential, SessionError> {
        let resp: AuthResponse =
            self.pipeline.send_json(ApiRequest::post(REGISTER_PATH).json(req)?).await?;
        Ok(self.sign_in(resp))
    }

    /// Refresh now, joining any cycle already in flight.
    pub async fn refresh(&self) -> Result<Credential, SessionError> {
        self.pipeline.force_refresh(RefreshTrigger::Manual).await
    }

    /// Try to restore a session from the refresh cookie at startup.
    ///
    /// Returns whether a session was restored. Failure clears local state
    /// without raising a session-expired event.
    pub async fn bootstrap(&self) -> bool {
        match self.pipeline.force_refresh(RefreshTrigger::Startup).await {
            Ok(cred) => {
                info!(user = %cred.user.user_id, "session restored");
                if let Err(e) = self.cart.fetch_cart().await {
                    warn!(err = %e, "failed to load cart after restore");
                }
                true
            }
            Err(e) => {
                debug!(err = %e, "no session restored");
                false
            }
        }
    }

    /// Revoke the server session (best effort) and clear local state.
    /// Calling it again is harmless.
    pub async fn logout(&self) {
        if let Some(token) = self.store.token() {
            if let Err(e) = self.api().revoke_token(&token).await {
                warn!(err = %e, "token revoke failed");
            }
        }
        self.store.clear(ClearReason::Logout);
        info!("signed out");
        let _ = self.events.send(SessionEvent::SignedOut);
    }

    /// Replace the stored credential with a fresh server answer, e.g. after
    /// a profile edit.
    pub fn update_profile(&self, resp: AuthResponse) -> Credential {
        let cred = Credential::from(resp);
        self.store.set(cred.clone());
        cred
    }

    pub fn set_avatar_url(&self, avatar_url: Option<String>) -> Option<Credential> {
        self.store.update(|c| c.user.avatar_url = avatar_url)
    }

    /// Route guard: the signed-in user, if they hold one of `roles`.
    /// An empty slice admits any signed-in user.
    pub fn require_user(&self, roles: &[Role]) -> Result<UserProfile, SessionError> {
        let Some(user) = self.current_user() else {
            let _ = self.events.send(SessionEvent::info(LOGIN_REQUIRED_NOTICE));
            return Err(SessionError::new(ErrorCode::Unauthorized, LOGIN_REQUIRED_NOTICE));
        };
        if !user.has_any_role(roles) {
            let _ = self.events.send(SessionEvent::error(FORBIDDEN_NOTICE));
            return Err(SessionError::new(ErrorCode::Forbidden, FORBIDDEN_NOTICE));
        }
        Ok(user)
    }

    fn api(&self) -> &ApiClient {
        self.pipeline.api()
    }

    fn sign_in(&self, resp: AuthResponse) -> Credential {
        let cred = Credential::from(resp);
        self.store.set(cred.clone());
        info!(user = %cred.user.user_id, "signed in");
        let _ = self.events.send(SessionEvent::SignedIn { user: cred.user.clone() });
        cred
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("pipeline", &self.pipeline)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
