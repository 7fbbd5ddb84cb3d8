use serde::Deserialize;
use tokio::sync::broadcast;

use crate::{
    error::{AppError, AppResult, FieldError},
    models::{Role, Route, Session},
    notice::{Notice, Notices},
    platform::{AuthEvent, IdentityService, ProfileAttrs, RoleLookup},
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Navigate(Route),
    /// Account created; the user must confirm their email before signing in.
    AwaitConfirmation,
}

impl AuthForm {
    pub fn validate(&self, mode: AuthMode) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if !is_plausible_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Enter a valid email address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if mode == AuthMode::SignUp {
            if self.full_name.trim().is_empty() {
                errors.push(FieldError::new("full_name", "Full name is required"));
            }
            if self.role.is_none() {
                errors.push(FieldError::new("role", "Choose customer, vendor or rider"));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn profile(&self) -> Option<ProfileAttrs> {
        let phone = self.phone.trim();
        self.role.map(|role| ProfileAttrs {
            full_name: self.full_name.trim().to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            role,
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
        }
        _ => false,
    }
}

/// Submits the form. On failure a notice is raised and the form is left to
/// the caller untouched.
pub async fn submit(
    form: &AuthForm,
    mode: AuthMode,
    identity: &dyn IdentityService,
    roles: &dyn RoleLookup,
    notices: &Notices,
) -> AppResult<AuthOutcome> {
    let result = submit_inner(form, mode, identity, roles, notices).await;
    if let Err(err) = &result {
        notices.raise_error(err);
    }
    result
}

async fn submit_inner(
    form: &AuthForm,
    mode: AuthMode,
    identity: &dyn IdentityService,
    roles: &dyn RoleLookup,
    notices: &Notices,
) -> AppResult<AuthOutcome> {
    form.validate(mode).map_err(AppError::Validation)?;
    let email = form.email.trim();

    match mode {
        AuthMode::SignIn => {
            let session = identity
                .sign_in_with_password(email, &form.password)
                .await
                .map_err(AppError::AuthFailed)?;
            tracing::info!(user_id = %session.user_id, "signed in");
            notices.raise(Notice::success("Welcome back", "Signed in successfully."));
            Ok(AuthOutcome::Navigate(route_for(roles, &session).await))
        }
        AuthMode::SignUp => {
            let profile = form
                .profile()
                .ok_or_else(|| AppError::BadRequest("role is required".into()))?;
            identity
                .sign_up(email, &form.password, &profile)
                .await
                .map_err(AppError::AuthFailed)?;
            tracing::info!(role = %profile.role, "account created");
            notices.raise(Notice::info(
                "Account created",
                "Check your email to confirm your account.",
            ));
            Ok(AuthOutcome::AwaitConfirmation)
        }
    }
}

/// Dashboard for the session's role; home when the role is unknown or the
/// lookup fails.
pub async fn route_for(roles: &dyn RoleLookup, session: &Session) -> Route {
    match roles.role_of(session.user_id).await {
        Ok(Some(role)) => role.dashboard(),
        Ok(None) => Route::Home,
        Err(err) => {
            tracing::warn!(user_id = %session.user_id, error = %err, "role lookup failed");
            Route::Home
        }
    }
}

/// Where an already signed-in visitor of the auth page should go.
pub async fn resume_session(
    identity: &dyn IdentityService,
    roles: &dyn RoleLookup,
) -> AppResult<Option<Route>> {
    let session = identity.get_session().await.map_err(AppError::AuthFailed)?;
    match session {
        Some(session) => Ok(Some(route_for(roles, &session).await)),
        None => Ok(None),
    }
}

/// Waits for the next sign-in event and resolves its dashboard. `None` once
/// the event stream ends.
pub async fn next_sign_in_route(
    events: &mut broadcast::Receiver<AuthEvent>,
    roles: &dyn RoleLookup,
) -> Option<Route> {
    loop {
        match events.recv().await {
            Ok(AuthEvent::SignedIn(session)) => return Some(route_for(roles, &session).await),
            Ok(AuthEvent::SignedOut) => continue,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::debug!(missed, "auth events lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

pub async fn sign_out(identity: &dyn IdentityService, notices: &Notices) -> AppResult<Route> {
    match identity.sign_out().await {
        Ok(()) => Ok(Route::SignIn),
        Err(source) => {
            let err = AppError::AuthFailed(source);
            notices.raise_error(&err);
            Err(err)
        }
    }
}
