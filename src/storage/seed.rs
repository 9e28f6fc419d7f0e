// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Demo data for fresh installations.

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::models::{Amount, WalletAddress};
use crate::session::Role;

use super::database::{LocalStore, StoreResult};
use super::repository::{
    AidRequest, Donation, NewAidRequest, NewProposal, Proposal, ProposalCategory,
    RequestCategory, StoredTransaction, TransactionType, User, Vote, VoteTarget, VoteType,
};

const SEED_NETWORK: &str = "sepolia";

/// What a seeding run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub requests: usize,
    pub donations: usize,
    pub proposals: usize,
    pub votes: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == SeedReport::default()
    }
}

/// Populate an empty store with one user per role, a few requests, donations,
/// a proposal and votes. Does nothing if any user exists.
pub fn seed_sample_data(store: &LocalStore) -> StoreResult<SeedReport> {
    let report = store.write(|scope| {
        if !scope.list::<User>()?.is_empty() {
            return Ok(SeedReport::default());
        }
        let now = Utc::now();
        let mut report = SeedReport::default();

        let mut user = |wallet: &str, email: &str, name: &str, role: Role, reputation: u32| {
            let mut u = User::new(
                WalletAddress::from(wallet).normalized().into(),
                email.to_string(),
                name.to_string(),
                role,
            );
            u.reputation = reputation;
            u.verified = role != Role::Donor;
            report.users += 1;
            scope.insert(u)
        };
        let donor = user(
            "0x1000000000000000000000000000000000000001",
            "donor@decrico.org",
            "Dana Donor",
            Role::Donor,
            25,
        )?;
        let requester = user(
            "0x2000000000000000000000000000000000000002",
            "requester@decrico.org",
            "Riya Requester",
            Role::Requester,
            40,
        )?;
        let verifier = user(
            "0x3000000000000000000000000000000000000003",
            "verifier@decrico.org",
            "Victor Verifier",
            Role::Verifier,
            80,
        )?;
        let admin = user(
            "0x4000000000000000000000000000000000000004",
            "admin@decrico.org",
            "Ada Admin",
            Role::Admin,
            100,
        )?;

        let samples = [
            (
                "Emergency surgery for a child",
                "Funds for an urgent heart operation at the regional hospital",
                RequestCategory::Medical,
                "Nairobi, Kenya",
                10,
                21,
                true,
            ),
            (
                "Textbooks for a village school",
                "Replace the flood-damaged library of the village primary school",
                RequestCategory::Education,
                "Sylhet, Bangladesh",
                4,
                45,
                false,
            ),
            (
                "Temporary shelter after the earthquake",
                "Tents, blankets and water filters for displaced families",
                RequestCategory::Disaster,
                "Hatay, Turkey",
                25,
                14,
                true,
            ),
        ];
        let mut requests = Vec::with_capacity(samples.len());
        for (title, description, category, location, target, days, urgent) in samples {
            let request = AidRequest::new(
                requester.id,
                NewAidRequest {
                    title: title.to_string(),
                    description: description.to_string(),
                    category,
                    location: location.to_string(),
                    target_amount: Amount::eth(target),
                    deadline: now + Duration::days(days),
                    urgent,
                    media_urls: vec![],
                    external_links: vec![],
                },
            );
            requests.push(scope.insert(request)?);
            report.requests += 1;
        }

        for (i, (request, eth)) in [(&requests[0], 2u64), (&requests[0], 3), (&requests[1], 1)]
            .into_iter()
            .enumerate()
        {
            let tx_hash = format!("0x{:064x}", i + 1);
            let donation = scope.insert(Donation::confirmed(
                donor.id,
                request.id,
                Amount::eth(eth),
                tx_hash.clone(),
                SEED_NETWORK.to_string(),
            ))?;
            scope.update::<AidRequest, _>(request.id, |r| r.apply_donation(donation.amount))?;

            let mut tx = StoredTransaction::new_pending(
                TransactionType::Donation,
                donor.wallet_address.clone(),
                requester.wallet_address.clone(),
                Some(donation.amount),
                format!("Donation to \"{}\"", request.title),
            )
            .with_hash(tx_hash);
            tx.mark_confirmed(None, None);
            scope.insert(tx)?;
            report.donations += 1;
        }

        let proposal = scope.insert(Proposal::new(
            admin.id,
            NewProposal {
                title: "Fast-track medical requests".to_string(),
                description: "Verified medical requests skip the 24 hour review window".to_string(),
                rationale: "Medical cases are the most time critical".to_string(),
                implementation: "Add an urgent lane to the verification queue".to_string(),
                timeline: "Two weeks".to_string(),
                category: ProposalCategory::Platform,
                deadline: now + Duration::days(7),
            },
        ))?;
        report.proposals += 1;

        scope.insert(Vote::new(
            verifier.id,
            VoteTarget::Request(requests[0].id),
            VoteType::Approve,
        ))?;
        scope.update::<AidRequest, _>(requests[0].id, |r| r.verified = true)?;
        scope.insert(Vote::new(
            verifier.id,
            VoteTarget::Proposal(proposal.id),
            VoteType::Approve,
        ))?;
        scope.update::<Proposal, _>(proposal.id, |p| p.votes_for += 1)?;
        report.votes += 2;

        Ok(report)
    })?;

    if report.is_empty() {
        tracing::debug!("Store already populated, skipping sample data");
    } else {
        tracing::info!(
            users = report.users,
            requests = report.requests,
            donations = report.donations,
            "Seeded sample data"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::analytics::Analytics;

    fn temp_store() -> (LocalStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("seed.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn seeds_one_user_per_role() {
        let (store, _dir) = temp_store();
        let report = seed_sample_data(&store).unwrap();
        assert_eq!(report.users, 4);

        let stats = Analytics::new(&store).platform_stats().unwrap();
        assert_eq!(stats.users_by_role.donors, 1);
        assert_eq!(stats.users_by_role.admins, 1);
        assert_eq!(stats.total_raised, Amount::eth(6));
        assert_eq!(stats.votes_total, 2);
    }

    #[test]
    fn seeded_totals_agree_with_request_counters() {
        let (store, _dir) = temp_store();
        seed_sample_data(&store).unwrap();
        let analytics = Analytics::new(&store);
        for request in store.list::<AidRequest>().unwrap() {
            let progress = analytics.request_progress(request.id, Utc::now()).unwrap();
            assert_eq!(progress.raised, request.raised_amount);
        }
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (store, _dir) = temp_store();
        seed_sample_data(&store).unwrap();
        let again = seed_sample_data(&store).unwrap();
        assert!(again.is_empty());
        assert_eq!(store.count::<User>().unwrap(), 4);
    }
}
