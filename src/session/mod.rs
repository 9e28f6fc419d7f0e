// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Signed-in user and connected wallet.
//!
//! A [`Session`] is owned by the application context and passed explicitly;
//! there is no process-wide current user.

pub mod roles;
pub mod wallet;

pub use roles::{Dashboard, Role};
pub use wallet::{WalletSession, WalletState};

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::storage::{LocalStore, StoreResult, User, UserRepository};

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    user: Option<User>,
    wallet: WalletSession,
}

impl Session {
    pub fn new(expected_chain_id: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: None,
            wallet: WalletSession::new(expected_chain_id),
        }
    }

    /// Identifier for correlating log lines of one session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn wallet(&self) -> &WalletSession {
        &self.wallet
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> AppResult<&User> {
        self.user.as_ref().ok_or(AppError::NotSignedIn)
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn dashboard(&self) -> Option<Dashboard> {
        self.role().map(|r| r.dashboard())
    }

    pub fn sign_in(&mut self, user: User) {
        tracing::info!(
            session_id = %self.id,
            user_id = user.id,
            role = %user.role,
            "Signed in"
        );
        self.user = Some(user);
    }

    /// Sign in as the user registered for the connected wallet.
    /// Returns `None` when no wallet is connected or the wallet is unknown.
    pub fn sign_in_with_wallet(&mut self, store: &LocalStore) -> StoreResult<Option<&User>> {
        let Some(account) = self.wallet.account() else {
            return Ok(None);
        };
        match UserRepository::new(store).by_wallet(&account)? {
            Some(user) => {
                self.sign_in(user);
                Ok(self.user.as_ref())
            }
            None => {
                tracing::debug!(session_id = %self.id, account = %account, "No user for wallet");
                Ok(None)
            }
        }
    }

    /// Reload the signed-in user, e.g. after reputation changed.
    pub fn refresh(&mut self, store: &LocalStore) -> StoreResult<()> {
        if let Some(id) = self.user.as_ref().map(|u| u.id) {
            self.user = Some(UserRepository::new(store).get(id)?);
        }
        Ok(())
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(session_id = %self.id, user_id = user.id, "Signed out");
        }
        self.wallet.disconnect();
    }
}
