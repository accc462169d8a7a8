use std::path::Path;

use log::{debug, info};
use oj_api_utils::credentials::{Credentials, Password, UserName};

use crate::api::{ApiError, OjClient};
use crate::cookie_store;
use crate::prompt::{read_tfa_code, Prompter};
use crate::schema::Profile;

const LOGIN_SUCCEEDED: &str = "Succeeded";

#[derive(Debug)]
pub enum AuthOutcome {
    /// The saved session was still valid.
    Restored(Profile),
    LoggedIn,
    /// Wrong credentials or two-factor code.  Carries the server's message.
    Failed(String),
}

/// Makes sure `client` holds a logged-in session, asking for credentials if needed.
pub async fn ensure_authenticated(
    client: &mut OjClient,
    cookie_store_path: &Path,
    prompter: &mut impl Prompter,
) -> anyhow::Result<AuthOutcome> {
    if client.load_cookies(cookie_store_path) {
        info!("Cookie store was found.  Trying to use this cookie.");
    }
    // The server sets `csrftoken` on first contact, so the header is available afterwards either way.
    let profile = current_profile(client).await?;
    client.set_csrf_header()?;
    if let Some(profile) = profile {
        info!("Already logged in as {}.", profile.user.username);
        return Ok(AuthOutcome::Restored(profile));
    }

    info!("Not logged in yet.  Trying to log in.");
    let username = UserName::from(prompter.username()?);
    let password = Password::from(prompter.password()?);
    let tfa_code = if tfa_required(client, &username).await? {
        Some(read_tfa_code(prompter)?)
    } else {
        None
    };
    let credentials = Credentials::builder()
        .username(username)
        .password(password)
        .tfa_code(tfa_code)
        .build();

    match client.post_login(&credentials).await {
        Ok(data) if data == LOGIN_SUCCEEDED => {
            client.save_cookies(cookie_store_path)?;
            Ok(AuthOutcome::LoggedIn)
        }
        Ok(serde_json::Value::String(message)) => Ok(AuthOutcome::Failed(message)),
        Ok(data) => Ok(AuthOutcome::Failed(data.to_string())),
        Err(ApiError::Rejected { message, .. }) => Ok(AuthOutcome::Failed(message)),
        Err(e) => Err(e.into()),
    }
}

/// Logs out on the server and forgets the local session.
pub async fn logout(client: &mut OjClient, cookie_store_path: &Path) -> anyhow::Result<()> {
    client.load_cookies(cookie_store_path);
    current_profile(client).await?;
    client.set_csrf_header()?;
    client.post_logout().await?;
    client.clear_session_cookie()?;
    client.save_cookies(cookie_store_path)?;
    cookie_store::clear(cookie_store_path)?;
    Ok(())
}

/// A failing status or a rejected envelope just means "not logged in".
async fn current_profile(client: &OjClient) -> anyhow::Result<Option<Profile>> {
    match client.get_profile().await {
        Ok(profile) => Ok(profile),
        Err(e @ (ApiError::Status(_) | ApiError::Rejected { .. })) => {
            debug!("Profile is unavailable: {e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn tfa_required(client: &OjClient, username: &UserName) -> anyhow::Result<bool> {
    match client.post_tfa_required(username).await {
        Ok(required) => Ok(required),
        Err(ApiError::Rejected { message, .. }) => {
            debug!("Two-factor check was rejected: {message}");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
