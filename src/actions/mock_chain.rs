// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Chain double shared by the action tests.

use std::sync::Mutex;

use crate::chain::{ChainActions, ChainError, Submitted, TxReceipt};
use crate::models::{Amount, WalletAddress};
use crate::storage::{NewAidRequest, NewProposal};

pub(crate) const SIGNER: &str = "0x742d35cc6634c0532925a3b844bc9e7595f4ab12";
pub(crate) const RECIPIENT: &str = "0x8ba1f109551bd432803012645ac136ddd64dba72";
pub(crate) const CONTRACT: &str = "0x00000000000000000000000000000000000000aa";

/// Records every call; signs as [`SIGNER`].
pub(crate) struct MockChain {
    calls: Mutex<Vec<String>>,
    fail_with: Mutex<Option<ChainError>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    /// The next call fails with `err`.
    pub fn failing(err: ChainError) -> Self {
        let chain = Self::new();
        *chain.fail_with.lock().unwrap() = Some(err);
        chain
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn submit<T>(&self, call: String, value: T) -> Result<Submitted<T>, ChainError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(Submitted {
            value,
            receipt: TxReceipt {
                tx_hash: format!("0x{:064x}", calls.len()),
                to: WalletAddress::from(CONTRACT),
                block_number: Some(100 + calls.len() as u64),
                gas_used: 50_000,
                explorer_url: String::new(),
            },
        })
    }
}

impl ChainActions for MockChain {
    fn account(&self) -> WalletAddress {
        WalletAddress::from(SIGNER)
    }

    fn network(&self) -> String {
        "localhost".to_string()
    }

    async fn create_request(&self, input: &NewAidRequest) -> Result<Submitted<u64>, ChainError> {
        self.submit(format!("create_request:{}", input.title), 41)
    }

    async fn donate(
        &self,
        request_chain_id: u64,
        recipient: &WalletAddress,
        amount: Amount,
        _message: Option<&str>,
        _anonymous: bool,
    ) -> Result<Submitted<u64>, ChainError> {
        self.submit(
            format!("donate:{request_chain_id}:{}:{}", recipient.normalized(), amount.wei()),
            1,
        )
    }

    async fn vote_request(
        &self,
        request_chain_id: u64,
        approve: bool,
    ) -> Result<Submitted<()>, ChainError> {
        self.submit(format!("vote_request:{request_chain_id}:{approve}"), ())
    }

    async fn create_proposal(
        &self,
        input: &NewProposal,
        _voting_period_secs: u64,
    ) -> Result<Submitted<u64>, ChainError> {
        self.submit(format!("create_proposal:{}", input.title), 7)
    }

    async fn vote_proposal(
        &self,
        proposal_chain_id: u64,
        support: bool,
    ) -> Result<Submitted<()>, ChainError> {
        self.submit(format!("vote_proposal:{proposal_chain_id}:{support}"), ())
    }
}
