use std::{fmt, path::Path};

use oauth2::{
    AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenUrl,
    basic::BasicClient,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppError, AppResult, GetField};

pub(crate) type OAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientProvider {
    Google,
    Github,
}

impl ClientProvider {
    pub fn id(&self) -> &str {
        use ClientProvider::*;
        match self {
            Google => "google",
            Github => "github",
        }
    }

    fn auth_url(&self) -> &'static str {
        use ClientProvider::*;
        match self {
            Google => "https://accounts.google.com/o/oauth2/auth",
            Github => "https://github.com/login/oauth/authorize",
        }
    }

    fn token_url(&self) -> &'static str {
        use ClientProvider::*;
        match self {
            Google => "https://oauth2.googleapis.com/token",
            Github => "https://github.com/login/oauth/access_token",
        }
    }

    pub(crate) fn scopes(&self) -> Vec<Scope> {
        use ClientProvider::*;
        let scopes: &[&str] = match self {
            Google => &["openid", "email", "profile"],
            Github => &["read:user", "user:email"],
        };
        scopes.iter().map(|s| Scope::new(s.to_string())).collect()
    }
}

impl fmt::Display for ClientProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Default)]
pub struct Clients {
    google_client: Option<OAuthClient>,
    github_client: Option<OAuthClient>,
}

impl Clients {
    /// Reads client credentials from a JSON file shaped like
    /// `{"google": {"client_id": "..", "client_secret": ".."}, "github": {..}}`.
    /// A missing file means social login is switched off.
    pub fn from_file(path: &Path, site_url: &str) -> AppResult<Clients> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "no OAuth client file, login is disabled");
                return Ok(Clients::default());
            }
            Err(err) => return Err(AppError::Internal(err.into())),
        };
        Clients::from_json(serde_json::from_str(&text)?, site_url)
    }

    pub fn from_json(json: Value, site_url: &str) -> AppResult<Clients> {
        let client = |provider: ClientProvider| -> AppResult<Option<OAuthClient>> {
            let Some(json) = json.get(provider.id()) else {
                return Ok(None);
            };
            let client_id = ClientId::new(json.get_str_field("client_id")?);
            let client_secret = ClientSecret::new(json.get_str_field("client_secret")?);

            let auth_url = AuthUrl::new(provider.auth_url().to_string())?;
            let token_url = TokenUrl::new(provider.token_url().to_string())?;
            let redirect_url = RedirectUrl::new(format!("{site_url}/lockin/{}", provider.id()))?;

            tracing::info!(%provider, "OAuth provider configured");
            Ok(Some(
                BasicClient::new(client_id)
                .set_client_secret(client_secret)
                .set_auth_uri(auth_url)
                .set_token_uri(token_url)
                .set_redirect_uri(redirect_url)
            ))
        };

        Ok(
            Clients {
                google_client: client(ClientProvider::Google)?,
                github_client: client(ClientProvider::Github)?,
            }
        )
    }

    pub fn providers(&self) -> Vec<ClientProvider> {
        let mut providers = Vec::new();
        if self.google_client.is_some() {
            providers.push(ClientProvider::Google);
        }
        if self.github_client.is_some() {
            providers.push(ClientProvider::Github);
        }
        providers
    }

    pub fn get_client(&self, provider: ClientProvider) -> AppResult<OAuthClient> {
        use ClientProvider::*;
        match provider {
            Google => self.google_client.clone(),
            Github => self.github_client.clone(),
        }.ok_or(AppError::NotFound("login provider"))
    }
}
