use std::env;

use super::error::{CouchDaoError, CouchResult};

const BASE_URL_ENV: &str = "COUCH_BASE_URL";
const DATABASE_ENV: &str = "COUCH_DB";
const USERNAME_ENV: &str = "COUCH_USERNAME";
const PASSWORD_ENV: &str = "COUCH_PASSWORD";
const DEFAULT_DATABASE: &str = "mini_golf";

/// Where the remote game store lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding the game documents.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
}

impl CouchConfig {
    /// Anonymous access to `database` on `base_url`.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
        }
    }

    /// Use basic auth on every request.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Read `COUCH_BASE_URL`, `COUCH_DB` and the optional credentials.
    ///
    /// Only the base URL is required; a missing one means the service runs on
    /// the local store alone.
    pub fn from_env() -> CouchResult<Self> {
        let base_url =
            non_blank(BASE_URL_ENV).ok_or(CouchDaoError::MissingEnvVar { var: BASE_URL_ENV })?;
        let database = non_blank(DATABASE_ENV).unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let config = Self::new(base_url, database);
        Ok(match (non_blank(USERNAME_ENV), env::var(PASSWORD_ENV).ok()) {
            (Some(username), Some(password)) => config.with_credentials(username, password),
            _ => config,
        })
    }
}

fn non_blank(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}
