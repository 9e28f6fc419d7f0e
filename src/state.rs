// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

use alloy::signers::local::PrivateKeySigner;

use crate::actions::{Actions, RemoteActions};
use crate::chain::{ChainActions, ChainBridge};
use crate::config::{AppConfig, PersistenceMode, DEFAULT_CHAIN_ID};
use crate::error::{AppError, AppResult};
use crate::remote::{RemoteRepository, RemoteStoreClient};
use crate::session::Session;
use crate::storage::{seed_sample_data, Analytics, LocalStore};

/// Where records live for this run. Exactly one backend is opened.
enum Backend {
    Local(LocalStore),
    Remote(RemoteStoreClient),
}

/// Everything a front end needs, passed explicitly instead of living in
/// globals.
pub struct AppContext {
    pub config: AppConfig,
    backend: Backend,
    pub chain: Option<ChainBridge>,
    pub session: Session,
}

impl AppContext {
    /// Open the configured backend: the local store (seeding it when
    /// configured) or the remote client. The chain bridge is attached
    /// later with a signer.
    pub fn open(config: AppConfig) -> AppResult<Self> {
        let backend = match config.persistence {
            PersistenceMode::Local => {
                let store = LocalStore::open(&config.db_path())?;
                if config.seed_sample_data {
                    let report = seed_sample_data(&store)?;
                    if !report.is_empty() {
                        tracing::info!(?report, "Sample data seeded");
                    }
                }
                Backend::Local(store)
            }
            PersistenceMode::Remote => {
                if config.seed_sample_data {
                    tracing::warn!("SEED_SAMPLE_DATA is ignored with remote persistence");
                }
                let remote = config
                    .remote
                    .as_ref()
                    .ok_or_else(|| AppError::Config("SUPABASE_URL is not set".to_string()))?;
                Backend::Remote(RemoteStoreClient::from_config(remote)?)
            }
        };

        let expected_chain_id = config
            .chain
            .as_ref()
            .map_or(DEFAULT_CHAIN_ID, |c| c.chain_id);

        match &backend {
            Backend::Local(_) => tracing::info!(
                db = %config.db_path().display(),
                chain = config.chain.is_some(),
                "Application context ready with local persistence"
            ),
            Backend::Remote(_) => tracing::info!(
                chain = config.chain.is_some(),
                "Application context ready with remote persistence"
            ),
        }

        Ok(Self {
            config,
            backend,
            chain: None,
            session: Session::new(expected_chain_id),
        })
    }

    /// Attach a chain bridge that signs with `signer`.
    pub fn connect_chain(&mut self, signer: PrivateKeySigner) -> AppResult<&ChainBridge> {
        let config = self
            .config
            .chain
            .clone()
            .ok_or_else(|| AppError::Config("RPC_URL is not set".to_string()))?;
        let chain_id = config.chain_id;
        let bridge = ChainBridge::connect(config, signer);
        self.session
            .wallet()
            .connect(bridge.account(), chain_id);
        Ok(self.chain.insert(bridge))
    }

    /// The local store; a config error under remote persistence.
    pub fn store(&self) -> AppResult<&LocalStore> {
        match &self.backend {
            Backend::Local(store) => Ok(store),
            Backend::Remote(_) => Err(AppError::Config(
                "the local store is not available with remote persistence".to_string(),
            )),
        }
    }

    /// Action layer over the local store and the attached chain bridge.
    pub fn actions(&self) -> AppResult<Actions<'_, ChainBridge>> {
        let store = self.store()?;
        let chain = self.chain.as_ref().ok_or(AppError::WalletNotConnected)?;
        Ok(Actions::new(store, chain).with_quorum(self.config.verification_quorum))
    }

    /// Action layer over the hosted backend and the attached chain bridge.
    pub fn remote_actions(&self) -> AppResult<RemoteActions<'_, ChainBridge>> {
        let Backend::Remote(client) = &self.backend else {
            return Err(AppError::Config(
                "remote actions need PERSISTENCE=remote".to_string(),
            ));
        };
        let chain = self.chain.as_ref().ok_or(AppError::WalletNotConnected)?;
        Ok(RemoteActions::new(client, chain).with_quorum(self.config.verification_quorum))
    }

    /// Hosted backend queries, when remote persistence is configured.
    pub fn remote(&self) -> Option<RemoteRepository<'_>> {
        match &self.backend {
            Backend::Remote(client) => Some(RemoteRepository::new(client)),
            Backend::Local(_) => None,
        }
    }

    /// Aggregates over the local store.
    pub fn analytics(&self) -> AppResult<Analytics<'_>> {
        self.store().map(Analytics::new)
    }
}
