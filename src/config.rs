use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] io::Error),

    #[error("error parsing {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("{0} must be set to reach the database")]
    MissingEnv(&'static str),

    #[error("invalid database url: {0}")]
    Url(#[from] url::ParseError),

    #[error("cannot build a database url for host {0}")]
    Host(String),
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
}

impl AppConfig {
    /// Reads the TOML file at `path`, or falls back to defaults.
    pub fn load(path: Option<&OsStr>) -> Result<AppConfig, ConfigError> {
        let path = match path {
            Some(path) => PathBuf::from(path),
            None => return Ok(AppConfig::default()),
        };
        let config_str = fs::read_to_string(&path)
            .map_err(|e| ConfigError::Read(path.clone(), e))?;
        toml::from_str(&config_str)
            .map_err(|e| ConfigError::Parse(path, e))
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Bind the `POST /albums` body on stores that generate ids, instead of
    /// inserting the placeholder album.
    pub bind_create_body: bool,
}

impl Default for DatabaseConfig {
    fn default() -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            host: "127.0.0.1".into(),
            port: 5432,
            name: "recordings".into(),
            user: None,
            password: None,
            bind_create_body: false,
        }
    }
}

impl DatabaseConfig {
    /// The store url, with credentials taken from `DBUSER`/`DBPASS` when the
    /// file leaves them out.
    pub fn url(&self) -> Result<String, ConfigError> {
        self.url_with(env::var("DBUSER").ok(), env::var("DBPASS").ok())
    }

    fn url_with(&self, env_user: Option<String>, env_pass: Option<String>)
        -> Result<String, ConfigError>
    {
        if let Some(ref url) = self.url {
            return Ok(url.clone());
        }

        let user = self.user.clone().or(env_user)
            .ok_or(ConfigError::MissingEnv("DBUSER"))?;
        let password = self.password.clone().or(env_pass).unwrap_or_default();

        let mut url = Url::parse(&format!("postgresql://{}:{}/", self.host, self.port))?;
        let bad_host = |()| ConfigError::Host(self.host.clone());
        url.path_segments_mut()
            .map_err(bad_host)?
            .pop_if_empty()
            .push(&self.name);
        url.set_username(&user).map_err(bad_host)?;
        if !password.is_empty() {
            url.set_password(Some(&password)).map_err(bad_host)?;
        }
        Ok(url.into())
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct WebConfig {
    pub address: IpAddr,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> WebConfig {
        WebConfig {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
        }
    }
}
