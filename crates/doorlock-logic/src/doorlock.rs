//! Authenticated entry point used by the outer request surface.

use std::sync::Arc;

use doorlock_auth::Authenticator;
use doorlock_backend::DoorBackend;
use doorlock_core::{Credentials, DoorState, Response};
use tracing::info;

use crate::handler::{DoorHandler, StatusCallback};

/// Authenticates a request, then hands it to the [`DoorHandler`].
pub struct Doorlock<B> {
    auth: Authenticator,
    handler: Arc<DoorHandler<B>>,
}

impl<B: DoorBackend> Doorlock<B> {
    pub fn new(auth: Authenticator, handler: Arc<DoorHandler<B>>) -> Self {
        Self { auth, handler }
    }

    /// Request `target` on behalf of `credentials`.
    ///
    /// Authentication failures are returned as is and never reach the
    /// backend. An `AlreadyActive` answer is also sent to the status
    /// callback so that every client sees the request was noticed.
    pub async fn request(&self, target: DoorState, credentials: &Credentials) -> Response {
        let auth = self.auth.try_auth(credentials).await;
        if auth != Response::Success {
            return auth;
        }

        info!(user = %credentials.username(), state = %target, "Door state requested");
        let response = self.handler.request(target).await;
        if response == Response::AlreadyActive {
            self.handler.invoke_callback(response).await;
        }
        response
    }

    /// Check credentials without touching the door.
    pub async fn status(&self, credentials: &Credentials) -> Response {
        self.auth.try_auth(credentials).await
    }

    pub async fn state(&self) -> DoorState {
        self.handler.current_state().await
    }

    pub fn register_callback(&self, callback: StatusCallback) {
        self.handler.register_callback(callback);
    }

    pub fn handler(&self) -> &Arc<DoorHandler<B>> {
        &self.handler
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }
}
