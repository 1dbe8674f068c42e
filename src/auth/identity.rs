use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppError, AppResult, GetField};

use super::clients::ClientProvider;

/// What a provider tells us about the person logging in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

fn split_name(name: &str) -> (String, String) {
    match name.trim().split_once(' ') {
        Some((first, last)) => (first.to_owned(), last.trim().to_owned()),
        None => (name.trim().to_owned(), String::new()),
    }
}

/// Accounts are matched by email, so only a verified address may log in.
fn from_google(body: &Value) -> AppResult<Identity> {
    if body.get("email_verified").and_then(Value::as_bool) != Some(true) {
        return Err(AppError::Forbidden("Your Google email address is not verified".into()));
    }
    Ok(Identity {
        email: body.get_str_field("email")?,
        first_name: body.get_str_field("given_name").unwrap_or_default(),
        last_name: body.get_str_field("family_name").unwrap_or_default(),
    })
}

fn pick_github_email(emails: Vec<GithubEmail>) -> Option<String> {
    emails
        .into_iter()
        .filter(|e| e.verified)
        .max_by_key(|e| e.primary)
        .map(|e| e.email)
}

pub(crate) async fn fetch_identity(
    http_client: &reqwest::Client,
    provider: ClientProvider,
    access_token: &str,
) -> AppResult<Identity> {
    match provider {
        ClientProvider::Google => {
            let body: Value = http_client
                .get("https://openidconnect.googleapis.com/v1/userinfo")
                .bearer_auth(access_token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            from_google(&body)
        }
        ClientProvider::Github => {
            let user: Value = http_client
                .get("https://api.github.com/user")
                .bearer_auth(access_token)
                .header(USER_AGENT, "buddy-mentorship")
                .header(ACCEPT, "application/vnd.github+json")
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            let (first_name, last_name) = split_name(
                &user.get_str_field("name").unwrap_or_default(),
            );

            let email = match user.get_str_field("email") {
                Ok(email) => email,
                Err(_) => {
                    let emails: Vec<GithubEmail> = http_client
                        .get("https://api.github.com/user/emails")
                        .bearer_auth(access_token)
                        .header(USER_AGENT, "buddy-mentorship")
                        .header(ACCEPT, "application/vnd.github+json")
                        .send()
                        .await?
                        .error_for_status()?
                        .json()
                        .await?;
                    pick_github_email(emails).ok_or("GitHub account has no verified email")?
                }
            };

            Ok(Identity { email, first_name, last_name })
        }
    }
}
