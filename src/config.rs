// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Loaded once from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `APP_NAME` | Display name | `Trippple.fi` |
//! | `APP_SECRET` | HS256 session signing secret (24+ chars) | Required |
//! | `SESSION_TTL_DAYS` | Session token lifetime | `30` |
//! | `DATABASE_PATH` | redb file | `data/trippple.redb` |
//! | `GOOGLE_CLIENT_ID` | Google OAuth client id | Required |
//! | `TWITCH_CLIENT_ID` | Twitch OAuth client id | Required |
//! | `OAUTH_REDIRECT_URI` | Where providers send the ID token | `com.supple.fi://login` |
//! | `OIDC_VERIFY` | Verify ID token signatures against provider JWKS | `true` |
//! | `SUI_NETWORK` | `mainnet`, `testnet`, `devnet` or `localnet` | `devnet` |
//! | `SUI_RPC_URL` | Full node override | Network default |
//! | `SUI_RPC_TIMEOUT_SECS` | Full node request timeout | `30` |
//! | `SUI_PROVER_URL` | zkLogin prover | `http://localhost:9999/v1` |
//! | `SUI_PROVER_TIMEOUT_SECS` | Prover request timeout | `60` |
//! | `CEREMONY_TTL_SECS` | Lifetime of an open ceremony | `600` |
//! | `GAS_BUDGET_MIST` | Gas budget per transaction | `10000000` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both unset serves plain HTTP | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::Platform;
use crate::blockchain::types::NetworkConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const APP_NAME_ENV: &str = "APP_NAME";
pub const APP_SECRET_ENV: &str = "APP_SECRET";
pub const SESSION_TTL_DAYS_ENV: &str = "SESSION_TTL_DAYS";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const TWITCH_CLIENT_ID_ENV: &str = "TWITCH_CLIENT_ID";
pub const OAUTH_REDIRECT_URI_ENV: &str = "OAUTH_REDIRECT_URI";
pub const OIDC_VERIFY_ENV: &str = "OIDC_VERIFY";
pub const SUI_NETWORK_ENV: &str = "SUI_NETWORK";
pub const SUI_RPC_URL_ENV: &str = "SUI_RPC_URL";
pub const SUI_RPC_TIMEOUT_ENV: &str = "SUI_RPC_TIMEOUT_SECS";
pub const SUI_PROVER_URL_ENV: &str = "SUI_PROVER_URL";
pub const SUI_PROVER_TIMEOUT_ENV: &str = "SUI_PROVER_TIMEOUT_SECS";
pub const CEREMONY_TTL_ENV: &str = "CEREMONY_TTL_SECS";
pub const GAS_BUDGET_ENV: &str = "GAS_BUDGET_MIST";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Shortest accepted `APP_SECRET`.
pub const MIN_SECRET_LENGTH: usize = 24;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_PATH: &str = "data/trippple.redb";
pub const DEFAULT_REDIRECT_URI: &str = "com.supple.fi://login";
pub const DEFAULT_PROVER_URL: &str = "http://localhost:9999/v1";
pub const DEFAULT_GAS_BUDGET_MIST: u64 = 10_000_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub app_name: String,
    pub app_secret: String,
    pub session_ttl: chrono::Duration,
    pub database_path: PathBuf,
    pub google_client_id: String,
    pub twitch_client_id: String,
    pub redirect_uri: String,
    pub oidc_verify: bool,
    pub network: NetworkConfig,
    pub rpc_url: Option<String>,
    pub rpc_timeout: Duration,
    pub prover_url: String,
    pub prover_timeout: Duration,
    pub ceremony_ttl: Duration,
    pub gas_budget: u64,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid(HOST_ENV, &host, e))?;

        let app_secret = required(APP_SECRET_ENV)?;
        if app_secret.chars().count() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: APP_SECRET_ENV,
                value: "<redacted>".to_string(),
                reason: format!("must be at least {MIN_SECRET_LENGTH} characters"),
            });
        }

        let network_name = get(SUI_NETWORK_ENV).unwrap_or_else(|| "devnet".to_string());
        let network = NetworkConfig::from_name(&network_name)
            .ok_or_else(|| invalid(SUI_NETWORK_ENV, &network_name, "unknown network"))?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid(LOG_FORMAT_ENV, other, "expected `json` or `pretty`")),
        };

        Ok(Self {
            bind_addr,
            app_name: get(APP_NAME_ENV).unwrap_or_else(|| "Trippple.fi".to_string()),
            app_secret,
            session_ttl: chrono::Duration::days(parse_or(&get, SESSION_TTL_DAYS_ENV, 30)?),
            database_path: get(DATABASE_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            google_client_id: required(GOOGLE_CLIENT_ID_ENV)?,
            twitch_client_id: required(TWITCH_CLIENT_ID_ENV)?,
            redirect_uri: get(OAUTH_REDIRECT_URI_ENV).unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            oidc_verify: parse_or(&get, OIDC_VERIFY_ENV, true)?,
            network,
            rpc_url: get(SUI_RPC_URL_ENV),
            rpc_timeout: Duration::from_secs(parse_or(&get, SUI_RPC_TIMEOUT_ENV, 30)?),
            prover_url: get(SUI_PROVER_URL_ENV).unwrap_or_else(|| DEFAULT_PROVER_URL.to_string()),
            prover_timeout: Duration::from_secs(parse_or(&get, SUI_PROVER_TIMEOUT_ENV, 60)?),
            ceremony_ttl: Duration::from_secs(parse_or(&get, CEREMONY_TTL_ENV, 600)?),
            gas_budget: parse_or(&get, GAS_BUDGET_ENV, DEFAULT_GAS_BUDGET_MIST)?,
            tls,
            log_format,
        })
    }

    pub fn client_id(&self, platform: Platform) -> &str {
        match platform {
            Platform::Google => &self.google_client_id,
            Platform::Twitch => &self.twitch_client_id,
        }
    }

    /// `(platform, client id)` pairs accepted as ID token audiences.
    pub fn oidc_clients(&self) -> Vec<(Platform, String)> {
        Platform::ALL
            .iter()
            .map(|platform| (*platform, self.client_id(*platform).to_string()))
            .collect()
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        Some(raw) => raw.parse().map_err(|e| invalid(name, &raw, e)),
        None => Ok(default),
    }
}

fn invalid(name: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
