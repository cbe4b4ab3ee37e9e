//! Account operations: login, registration, identity, user search.

use tracing::info;

use crate::{
    error::ApiError,
    gateway::ApiGateway,
    session::Credentials,
    types::{LoginRequest, LoginResponse, RegisterRequest, User},
};

/// Exchange email/password for a credential pair. On success both slots are
/// persisted together before the call returns.
pub async fn login(gateway: &ApiGateway, email: &str, password: &str) -> Result<User, ApiError> {
    let payload = LoginRequest {
        email: email.into(),
        password: password.into(),
    };
    let resp: LoginResponse = gateway.post("/auth/token/", &payload).await?;

    gateway
        .session()
        .store(&Credentials::new(resp.access, resp.refresh))
        .map_err(ApiError::Session)?;

    info!(user = %resp.user.email, "logged in");
    Ok(resp.user)
}

/// Create a new account. Does not log in; call [`login`] afterwards.
pub async fn register(gateway: &ApiGateway, payload: &RegisterRequest) -> Result<User, ApiError> {
    gateway.post("/auth/register/", payload).await
}

/// Fetch the account behind the stored credentials.
pub async fn current_user(gateway: &ApiGateway) -> Result<User, ApiError> {
    gateway.get("/auth/me/").await
}

/// List other users, optionally filtered by an email/display-name substring.
pub async fn list_users(
    gateway: &ApiGateway,
    search: Option<&str>,
) -> Result<Vec<User>, ApiError> {
    match search {
        Some(s) => {
            gateway
                .get_with_query("/auth/users/", &[("search", s)])
                .await
        },
        None => gateway.get("/auth/users/").await,
    }
}

/// Drop the local session. Purely client-side — the server keeps no session
/// state beyond the credentials themselves.
pub fn logout(gateway: &ApiGateway) -> Result<(), ApiError> {
    gateway.session().clear().map_err(ApiError::Session)
}
