// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the crate. Configuration is loaded from the environment at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the local store | `./data` |
//! | `DB_FILE` | Local store file name inside `DATA_DIR` | `decrico.redb` |
//! | `PERSISTENCE` | `local` (embedded store) or `remote` (hosted backend) | `local` |
//! | `SUPABASE_URL` | Hosted backend base URL | Required for `remote` |
//! | `SUPABASE_ANON_KEY` | Hosted backend public API key | Required for `remote` |
//! | `RPC_URL` | EVM JSON-RPC endpoint | Chain bridge disabled if unset |
//! | `CHAIN_ID` | Expected chain id | `11155111` |
//! | `EXPLORER_URL` | Block explorer base URL | `https://sepolia.etherscan.io` |
//! | `AID_REQUEST_CONTRACT` | Aid request contract address | Required with `RPC_URL` |
//! | `DONATION_CONTRACT` | Donation contract address | Required with `RPC_URL` |
//! | `GOVERNANCE_CONTRACT` | Governance contract address | Required with `RPC_URL` |
//! | `SEED_SAMPLE_DATA` | Seed demo data into an empty local store (ignored for `remote`) | `false` |
//! | `VERIFICATION_QUORUM` | Verifier votes needed to verify/cancel a request | `1` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,decrico_core=debug` |

use std::path::PathBuf;

use crate::chain::{ChainConfig, ContractAddresses};
use crate::logging::LogFormat;
use crate::remote::RemoteConfig;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const DB_FILE_ENV: &str = "DB_FILE";
pub const PERSISTENCE_ENV: &str = "PERSISTENCE";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const EXPLORER_URL_ENV: &str = "EXPLORER_URL";
pub const AID_REQUEST_CONTRACT_ENV: &str = "AID_REQUEST_CONTRACT";
pub const DONATION_CONTRACT_ENV: &str = "DONATION_CONTRACT";
pub const GOVERNANCE_CONTRACT_ENV: &str = "GOVERNANCE_CONTRACT";
pub const SEED_SAMPLE_DATA_ENV: &str = "SEED_SAMPLE_DATA";
pub const VERIFICATION_QUORUM_ENV: &str = "VERIFICATION_QUORUM";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_DB_FILE: &str = "decrico.redb";
/// Sepolia testnet.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.etherscan.io";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value `{value}` for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which backend holds the platform data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceMode {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_file: String,
    pub persistence: PersistenceMode,
    /// Present when `SUPABASE_URL` is set
    pub remote: Option<RemoteConfig>,
    /// Present when `RPC_URL` is set
    pub chain: Option<ChainConfig>,
    pub seed_sample_data: bool,
    pub verification_quorum: u32,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let persistence = match get(PERSISTENCE_ENV).as_deref().map(str::trim) {
            None | Some("local") => PersistenceMode::Local,
            Some("remote") => PersistenceMode::Remote,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: PERSISTENCE_ENV,
                    value: other.to_string(),
                    reason: "expected `local` or `remote`".to_string(),
                })
            }
        };

        let remote = match get(SUPABASE_URL_ENV) {
            Some(url) => {
                let anon_key =
                    get(SUPABASE_ANON_KEY_ENV).ok_or(ConfigError::Missing(SUPABASE_ANON_KEY_ENV))?;
                Some(RemoteConfig::new(&url, anon_key).map_err(|e| ConfigError::Invalid {
                    var: SUPABASE_URL_ENV,
                    value: url.clone(),
                    reason: e.to_string(),
                })?)
            }
            None => None,
        };
        if persistence == PersistenceMode::Remote && remote.is_none() {
            return Err(ConfigError::Missing(SUPABASE_URL_ENV));
        }

        let chain = match get(RPC_URL_ENV) {
            Some(rpc_url) => {
                let chain_id = parse_or(&get, CHAIN_ID_ENV, DEFAULT_CHAIN_ID)?;
                let explorer_url =
                    get(EXPLORER_URL_ENV).unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string());
                let contracts = ContractAddresses {
                    aid_request: require(&get, AID_REQUEST_CONTRACT_ENV)?,
                    donation: require(&get, DONATION_CONTRACT_ENV)?,
                    governance: require(&get, GOVERNANCE_CONTRACT_ENV)?,
                };
                Some(
                    ChainConfig::new(&rpc_url, chain_id, &explorer_url, contracts).map_err(
                        |e| ConfigError::Invalid {
                            var: RPC_URL_ENV,
                            value: rpc_url.clone(),
                            reason: e.to_string(),
                        },
                    )?,
                )
            }
            None => None,
        };

        Ok(Self {
            data_dir: PathBuf::from(
                get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            db_file: get(DB_FILE_ENV).unwrap_or_else(|| DEFAULT_DB_FILE.to_string()),
            persistence,
            remote,
            chain,
            seed_sample_data: get(SEED_SAMPLE_DATA_ENV).is_some_and(|v| parse_bool(&v)),
            verification_quorum: parse_or(&get, VERIFICATION_QUORUM_ENV, 1u32)?.max(1),
            log_format: get(LOG_FORMAT_ENV)
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
        })
    }

    /// Full path of the local store file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}

fn require(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    get(name).ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match get(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_are_local_without_chain() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.persistence, PersistenceMode::Local);
        assert_eq!(cfg.db_path(), PathBuf::from("./data").join("decrico.redb"));
        assert!(cfg.remote.is_none());
        assert!(cfg.chain.is_none());
        assert!(!cfg.seed_sample_data);
        assert_eq!(cfg.verification_quorum, 1);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn remote_mode_requires_url() {
        assert_eq!(
            config(&[(PERSISTENCE_ENV, "remote")]).unwrap_err(),
            ConfigError::Missing(SUPABASE_URL_ENV)
        );
        assert_eq!(
            config(&[(SUPABASE_URL_ENV, "https://x.supabase.co")]).unwrap_err(),
            ConfigError::Missing(SUPABASE_ANON_KEY_ENV)
        );
        let cfg = config(&[
            (PERSISTENCE_ENV, "remote"),
            (SUPABASE_URL_ENV, "https://x.supabase.co"),
            (SUPABASE_ANON_KEY_ENV, "anon"),
        ])
        .unwrap();
        assert_eq!(cfg.persistence, PersistenceMode::Remote);
        assert!(cfg.remote.is_some());
    }

    #[test]
    fn chain_requires_all_contracts() {
        let err = config(&[
            (RPC_URL_ENV, "https://rpc.sepolia.org"),
            (AID_REQUEST_CONTRACT_ENV, "0x0000000000000000000000000000000000000001"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(DONATION_CONTRACT_ENV));

        let cfg = config(&[
            (RPC_URL_ENV, "https://rpc.sepolia.org"),
            (CHAIN_ID_ENV, "31337"),
            (AID_REQUEST_CONTRACT_ENV, "0x0000000000000000000000000000000000000001"),
            (DONATION_CONTRACT_ENV, "0x0000000000000000000000000000000000000002"),
            (GOVERNANCE_CONTRACT_ENV, "0x0000000000000000000000000000000000000003"),
        ])
        .unwrap();
        assert_eq!(cfg.chain.unwrap().chain_id, 31337);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config(&[(PERSISTENCE_ENV, "cloud")]),
            Err(ConfigError::Invalid { var: PERSISTENCE_ENV, .. })
        ));
        assert!(matches!(
            config(&[(VERIFICATION_QUORUM_ENV, "many")]),
            Err(ConfigError::Invalid { var: VERIFICATION_QUORUM_ENV, .. })
        ));
    }

    #[test]
    fn flags_and_quorum() {
        let cfg = config(&[
            (SEED_SAMPLE_DATA_ENV, "TRUE"),
            (VERIFICATION_QUORUM_ENV, "0"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();
        assert!(cfg.seed_sample_data);
        assert_eq!(cfg.verification_quorum, 1);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }
}
