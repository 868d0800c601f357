use std::{env, str::FromStr};

use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DbCredentials>,
}

#[derive(Clone, Debug)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db: DbConfig,
    pub bind_host: String,
    pub port: u16,
    pub cdn_base_url: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let credentials = match (env::var("DB_USER").ok(), env::var("DB_PASSWORD").ok()) {
            (Some(username), Some(password)) => Some(DbCredentials { username, password }),
            _ => None,
        };

        let max_upload_mb: usize = parse_env("MAX_UPLOAD_MB", 50)?;

        Ok(Self {
            db: DbConfig {
                url: env_or("DB_URL", "mem://"),
                namespace: env_or("DB_NS", "playlist"),
                database: env_or("DB_NAME", "playlist_db"),
                credentials,
            },
            bind_host: env_or("BIND_HOST", "127.0.0.1"),
            port: parse_env("PORT", 8000)?,
            cdn_base_url: env_or("CDN_BASE_URL", "https://cdn.example.com")
                .trim_end_matches('/')
                .to_string(),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(name: &'static str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| Error::ConfigInvalidEnv {
            name,
            reason: format!("'{}': {}", raw, e),
        }),
        Err(_) => Ok(default),
    }
}
