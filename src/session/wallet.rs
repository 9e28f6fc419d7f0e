// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Connected wallet state.
//!
//! Account and chain changes are published on a `watch` channel so that
//! observers react to the latest state rather than to every event.

use tokio::sync::watch;

use crate::models::WalletAddress;

/// Snapshot of the connected wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub account: Option<WalletAddress>,
    pub chain_id: Option<u64>,
}

impl WalletState {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

#[derive(Debug)]
pub struct WalletSession {
    /// Chain the platform contracts live on
    expected_chain_id: u64,
    tx: watch::Sender<WalletState>,
}

impl WalletSession {
    pub fn new(expected_chain_id: u64) -> Self {
        let (tx, _rx) = watch::channel(WalletState::default());
        Self {
            expected_chain_id,
            tx,
        }
    }

    /// Latest published state.
    pub fn current(&self) -> WalletState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.tx.subscribe()
    }

    pub fn account(&self) -> Option<WalletAddress> {
        self.tx.borrow().account.clone()
    }

    pub fn connect(&self, account: WalletAddress, chain_id: u64) {
        tracing::info!(account = %account, chain_id, "Wallet connected");
        self.tx.send_replace(WalletState {
            account: Some(account),
            chain_id: Some(chain_id),
        });
    }

    /// Record a network switch. Returns `false` when nothing changed.
    pub fn switch_chain(&self, chain_id: u64) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if state.chain_id == Some(chain_id) {
                return false;
            }
            state.chain_id = Some(chain_id);
            true
        });
        if changed {
            tracing::info!(chain_id, "Wallet switched chain");
        }
        changed
    }

    pub fn disconnect(&self) {
        tracing::info!("Wallet disconnected");
        self.tx.send_replace(WalletState::default());
    }

    /// `true` when connected to the chain the contracts are deployed on.
    pub fn on_expected_chain(&self) -> bool {
        self.tx.borrow().chain_id == Some(self.expected_chain_id)
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.expected_chain_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    #[test]
    fn connect_and_disconnect() {
        let wallet = WalletSession::new(11_155_111);
        assert!(!wallet.current().is_connected());

        wallet.connect(WalletAddress::from(ACCOUNT), 11_155_111);
        assert_eq!(wallet.account(), Some(WalletAddress::from(ACCOUNT)));
        assert!(wallet.on_expected_chain());

        wallet.disconnect();
        assert_eq!(wallet.current(), WalletState::default());
        assert!(!wallet.on_expected_chain());
    }

    #[test]
    fn switch_chain_reports_changes_only() {
        let wallet = WalletSession::new(1);
        wallet.connect(WalletAddress::from(ACCOUNT), 1);
        assert!(!wallet.switch_chain(1));
        assert!(wallet.switch_chain(5));
        assert!(!wallet.on_expected_chain());
    }

    #[tokio::test]
    async fn subscribers_see_latest_state() {
        let wallet = WalletSession::new(1);
        let mut rx = wallet.subscribe();

        wallet.connect(WalletAddress::from(ACCOUNT), 1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().chain_id, Some(1));

        wallet.switch_chain(137);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().chain_id, Some(137));

        assert!(!wallet.switch_chain(137));
        assert!(!rx.has_changed().unwrap());
    }
}
