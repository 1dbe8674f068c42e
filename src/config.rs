//! Application configuration, read from the environment.
//!
//! `main` loads a `.env` file first (via `dotenv`), so every setting below
//! can live there during development. All settings have defaults that run
//! a local instance with no configuration at all.

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Env: `DATABASE_URL`
    /// Default: `sqlite://buddy.db`
    pub database_url: String,

    /// Env: `DB_MAX_CONNECTIONS`
    /// Default: `16`
    pub max_connections: u32,

    /// Socket address the HTTP server binds.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Public origin used in OAuth redirects and links inside emails.
    /// Env: `SITE_URL`
    /// Default: `http://localhost:8080`
    pub site_url: String,

    /// JSON file holding OAuth client ids and secrets.
    /// Env: `OAUTH_CLIENTS`
    /// Default: `client_secret.json`
    pub oauth_clients_path: PathBuf,

    /// Env: `SMTP_HOST`. Unset means mail is only logged.
    pub smtp_host: Option<String>,

    /// Env: `SMTP_PORT`
    /// Default: `587`
    pub smtp_port: u16,

    /// Env: `SMTP_USERNAME`
    pub smtp_username: Option<String>,

    /// Env: `SMTP_PASSWORD`
    pub smtp_password: Option<String>,

    /// Env: `DEFAULT_FROM_EMAIL`
    /// Default: `Buddy Mentorship <noreply@localhost>`
    pub mail_from: String,

    /// Sessions expire after this much inactivity.
    /// Env: `SESSION_EXPIRY_MINUTES`
    /// Default: `120`
    pub session_expiry_minutes: i64,

    /// Env: `SECURE_COOKIES` (true/false)
    /// Default: `false`
    pub secure_cookies: bool,

    /// Accounts promoted to staff when they log in.
    /// Env: `STAFF_EMAILS` (comma separated)
    pub staff_emails: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://buddy.db".to_string(),
            max_connections: 16,
            http_addr: ([0, 0, 0, 0], 8080).into(),
            site_url: "http://localhost:8080".to_string(),
            oauth_clients_path: PathBuf::from("client_secret.json"),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            mail_from: "Buddy Mentorship <noreply@localhost>".to_string(),
            session_expiry_minutes: 120,
            secure_cookies: false,
            staff_emails: Vec::new(),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|val| !val.trim().is_empty())
}

fn flag(val: &str) -> bool {
    val != "false" && val != "0"
}

impl Config {
    pub fn is_staff_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.staff_emails.iter().any(|staff| *staff == email)
    }

    pub fn from_env() -> Self {
        Self::from_lookup(non_empty)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(val) = lookup("DB_MAX_CONNECTIONS") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => tracing::warn!(value = %val, "Invalid DB_MAX_CONNECTIONS, using default"),
            }
        }

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(url) = lookup("SITE_URL") {
            config.site_url = url.trim_end_matches('/').to_string();
        }

        if let Some(path) = lookup("OAUTH_CLIENTS") {
            config.oauth_clients_path = PathBuf::from(path);
        }

        config.smtp_host = lookup("SMTP_HOST");
        if let Some(val) = lookup("SMTP_PORT") {
            match val.parse::<u16>() {
                Ok(port) => config.smtp_port = port,
                Err(_) => tracing::warn!(value = %val, "Invalid SMTP_PORT, using default"),
            }
        }
        config.smtp_username = lookup("SMTP_USERNAME");
        config.smtp_password = lookup("SMTP_PASSWORD");

        if let Some(from) = lookup("DEFAULT_FROM_EMAIL") {
            config.mail_from = from;
        }

        if let Some(val) = lookup("SESSION_EXPIRY_MINUTES") {
            match val.parse::<i64>() {
                Ok(minutes) if minutes > 0 => config.session_expiry_minutes = minutes,
                _ => tracing::warn!(value = %val, "Invalid SESSION_EXPIRY_MINUTES, using default"),
            }
        }

        if let Some(val) = lookup("SECURE_COOKIES") {
            config.secure_cookies = flag(&val);
        }

        if let Some(val) = lookup("STAFF_EMAILS") {
            config.staff_emails = val
                .split(',')
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect();
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = from_pairs(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.smtp_port, 587);
        assert!(config.smtp_host.is_none());
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:3000"),
            ("SITE_URL", "https://buddies.example.com/"),
            ("SMTP_HOST", "mail.example.com"),
            ("SECURE_COOKIES", "true"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 3000).into());
        assert_eq!(config.site_url, "https://buddies.example.com");
        assert_eq!(config.smtp_host.as_deref(), Some("mail.example.com"));
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_staff_emails() {
        let config = from_pairs(&[("STAFF_EMAILS", " Ada@Example.com, ,bob@example.com")]);
        assert_eq!(config.staff_emails, ["ada@example.com", "bob@example.com"]);
        assert!(config.is_staff_email("ADA@example.com"));
        assert!(!config.is_staff_email("eve@example.com"));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "nowhere"),
            ("SMTP_PORT", "lots"),
            ("SESSION_EXPIRY_MINUTES", "-5"),
        ]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.session_expiry_minutes, 120);
    }
}
