use std::sync::Arc;

use axum::extract::FromRef;

use crate::platform::{JwtSessionVerifier, Platform, ProductRepository};

#[derive(Clone)]
pub struct AppState {
    pub platform: Platform,
    pub products: Arc<dyn ProductRepository>,
    pub sessions: JwtSessionVerifier,
}

impl FromRef<AppState> for JwtSessionVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
