// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Derived statistics over the local store.
//!
//! Every report loads the tables it needs inside one read transaction and
//! reduces them in memory. Raised totals are always summed from completed
//! donations, not read from the request's running counter.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Amount, RecordId};
use crate::session::Role;

use super::database::{LocalStore, StoreResult};
use super::repository::{
    AidRequest, Donation, Proposal, ProposalStatus, RequestCategory, RequestStatus, User, Vote,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleCounts {
    pub donors: usize,
    pub requesters: usize,
    pub verifiers: usize,
    pub admins: usize,
}

impl RoleCounts {
    fn add(&mut self, role: Role) {
        match role {
            Role::Donor => self.donors += 1,
            Role::Requester => self.requesters += 1,
            Role::Verifier => self.verifiers += 1,
            Role::Admin => self.admins += 1,
        }
    }
}

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformStats {
    pub users_total: usize,
    pub users_by_role: RoleCounts,
    pub requests_total: usize,
    pub requests_active: usize,
    pub requests_completed: usize,
    pub requests_cancelled: usize,
    pub requests_verified: usize,
    pub total_target: Amount,
    pub total_raised: Amount,
    pub donations_count: usize,
    pub unique_donors: usize,
    pub proposals_total: usize,
    pub proposals_active: usize,
    pub votes_total: usize,
    /// Completed requests as a percentage of all requests
    pub success_rate: f64,
}

/// Per-user impact figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: RecordId,
    pub total_donated: Amount,
    pub donation_count: usize,
    pub requests_funded: usize,
    pub requests_created: usize,
    pub raised_for_requests: Amount,
    pub votes_cast: usize,
    pub reputation: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestProgress {
    pub request_id: RecordId,
    pub raised: Amount,
    pub target: Amount,
    /// Two decimals, capped at 100
    pub progress: f64,
    pub donor_count: usize,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: RequestCategory,
    pub requests: usize,
    pub raised: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorTotal {
    pub donor_id: RecordId,
    pub name: String,
    pub total: Amount,
    pub donation_count: usize,
}

/// Read-only reporting over a [`LocalStore`].
pub struct Analytics<'a> {
    store: &'a LocalStore,
}

impl<'a> Analytics<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    pub fn platform_stats(&self) -> StoreResult<PlatformStats> {
        self.store.read(|scope| {
            let users = scope.list::<User>()?;
            let requests = scope.list::<AidRequest>()?;
            let donations = completed(scope.list::<Donation>()?);
            let proposals = scope.list::<Proposal>()?;
            let votes_total = scope.count::<Vote>()?;

            let mut stats = PlatformStats {
                users_total: users.len(),
                requests_total: requests.len(),
                donations_count: donations.len(),
                proposals_total: proposals.len(),
                votes_total,
                ..Default::default()
            };
            for user in &users {
                stats.users_by_role.add(user.role);
            }
            for request in &requests {
                match request.status {
                    RequestStatus::Active => stats.requests_active += 1,
                    RequestStatus::Completed => stats.requests_completed += 1,
                    RequestStatus::Cancelled => stats.requests_cancelled += 1,
                }
                if request.verified {
                    stats.requests_verified += 1;
                }
            }
            stats.total_target = requests.iter().map(|r| r.target_amount).sum();
            stats.total_raised = donations.iter().map(|d| d.amount).sum();
            stats.unique_donors = donations
                .iter()
                .map(|d| d.donor_id)
                .collect::<HashSet<_>>()
                .len();
            stats.proposals_active = proposals
                .iter()
                .filter(|p| p.status == ProposalStatus::Active)
                .count();
            stats.success_rate = percent(stats.requests_completed, stats.requests_total);
            Ok(stats)
        })
    }

    pub fn user_stats(&self, user_id: RecordId) -> StoreResult<UserStats> {
        self.store.read(|scope| {
            let user = scope.require::<User>(user_id)?;
            let id = user_id.to_string();
            let given = completed(scope.find_by::<Donation>("donor", &id)?);
            let own_requests = scope.find_by::<AidRequest>("creator", &id)?;
            let mut raised_for_requests = Amount::ZERO;
            for request in &own_requests {
                let received = completed(
                    scope.find_by::<Donation>("request", &request.id.to_string())?,
                );
                raised_for_requests = raised_for_requests
                    .saturating_add(received.iter().map(|d| d.amount).sum());
            }
            let votes_cast = scope.find_by::<Vote>("voter", &id)?.len();

            Ok(UserStats {
                user_id,
                total_donated: given.iter().map(|d| d.amount).sum(),
                donation_count: given.len(),
                requests_funded: given
                    .iter()
                    .map(|d| d.request_id)
                    .collect::<HashSet<_>>()
                    .len(),
                requests_created: own_requests.len(),
                raised_for_requests,
                votes_cast,
                reputation: user.reputation,
            })
        })
    }

    pub fn request_progress(
        &self,
        request_id: RecordId,
        now: DateTime<Utc>,
    ) -> StoreResult<RequestProgress> {
        self.store.read(|scope| {
            let request = scope.require::<AidRequest>(request_id)?;
            let donations =
                completed(scope.find_by::<Donation>("request", &request_id.to_string())?);
            let raised: Amount = donations.iter().map(|d| d.amount).sum();

            Ok(RequestProgress {
                request_id,
                raised,
                target: request.target_amount,
                progress: raised.percentage_of(request.target_amount),
                donor_count: donations
                    .iter()
                    .map(|d| d.donor_id)
                    .collect::<HashSet<_>>()
                    .len(),
                days_remaining: days_until(request.deadline, now),
            })
        })
    }

    /// Requests and raised amount per category, in category order.
    pub fn category_breakdown(&self) -> StoreResult<Vec<CategoryStats>> {
        self.store.read(|scope| {
            let requests = scope.list::<AidRequest>()?;
            let donations = completed(scope.list::<Donation>()?);

            let category_of: HashMap<RecordId, RequestCategory> =
                requests.iter().map(|r| (r.id, r.category)).collect();
            let mut raised: HashMap<RequestCategory, Amount> = HashMap::new();
            for donation in &donations {
                if let Some(category) = category_of.get(&donation.request_id) {
                    let entry = raised.entry(*category).or_default();
                    *entry = entry.saturating_add(donation.amount);
                }
            }

            Ok(RequestCategory::ALL
                .into_iter()
                .map(|category| CategoryStats {
                    category,
                    requests: requests.iter().filter(|r| r.category == category).count(),
                    raised: raised.get(&category).copied().unwrap_or_default(),
                })
                .collect())
        })
    }

    /// Donors ordered by total completed donations, largest first.
    pub fn top_donors(&self, limit: usize) -> StoreResult<Vec<DonorTotal>> {
        self.store.read(|scope| {
            let donations = completed(scope.list::<Donation>()?);
            let mut totals: HashMap<RecordId, (Amount, usize)> = HashMap::new();
            for donation in &donations {
                let entry = totals.entry(donation.donor_id).or_default();
                entry.0 = entry.0.saturating_add(donation.amount);
                entry.1 += 1;
            }

            let mut ranked = Vec::with_capacity(totals.len());
            for (donor_id, (total, donation_count)) in totals {
                let name = scope
                    .get::<User>(donor_id)?
                    .map(|u| u.name)
                    .unwrap_or_default();
                ranked.push(DonorTotal {
                    donor_id,
                    name,
                    total,
                    donation_count,
                });
            }
            ranked.sort_by(|a, b| b.total.cmp(&a.total).then(a.donor_id.cmp(&b.donor_id)));
            ranked.truncate(limit);
            Ok(ranked)
        })
    }
}

fn completed(donations: Vec<Donation>) -> Vec<Donation> {
    donations.into_iter().filter(Donation::is_completed).collect()
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((part * 10_000 / total) as f64) / 100.0
}

/// Whole days left before `deadline`, rounded up; zero once it has passed.
fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (deadline - now).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + 86_399) / 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletAddress;
    use crate::storage::repository::{
        DonationRepository, DonationStatus, NewAidRequest, RequestRepository, UserRepository,
        VoteRepository, VoteTarget, VoteType,
    };
    use chrono::Duration;

    fn temp_store() -> (LocalStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("analytics.redb")).unwrap();
        (store, dir)
    }

    fn user(store: &LocalStore, n: u8, role: Role) -> User {
        UserRepository::new(store)
            .create(User::new(
                WalletAddress(format!("0x{:040x}", n)),
                format!("user{n}@example.org"),
                format!("User {n}"),
                role,
            ))
            .unwrap()
    }

    fn request(
        store: &LocalStore,
        creator: RecordId,
        category: RequestCategory,
        target: Amount,
    ) -> AidRequest {
        RequestRepository::new(store)
            .create(AidRequest::new(
                creator,
                NewAidRequest {
                    title: "Relief request".to_string(),
                    description: "Relief supplies for the affected district".to_string(),
                    category,
                    location: "Beira".to_string(),
                    target_amount: target,
                    deadline: Utc::now() + Duration::days(5),
                    urgent: false,
                    media_urls: vec![],
                    external_links: vec![],
                },
            ))
            .unwrap()
    }

    fn donate(store: &LocalStore, donor: RecordId, request: RecordId, eth: u64, hash: &str) {
        DonationRepository::new(store)
            .record(Donation::confirmed(
                donor,
                request,
                Amount::eth(eth),
                hash.to_string(),
                "sepolia".to_string(),
            ))
            .unwrap();
    }

    #[test]
    fn progress_of_ten_eth_target_with_nine_raised() {
        let (store, _dir) = temp_store();
        let creator = user(&store, 1, Role::Requester);
        let donor = user(&store, 2, Role::Donor);
        let req = request(&store, creator.id, RequestCategory::Medical, Amount::eth(10));
        donate(&store, donor.id, req.id, 2, "0x01");
        donate(&store, donor.id, req.id, 3, "0x02");
        donate(&store, donor.id, req.id, 4, "0x03");

        let progress = Analytics::new(&store)
            .request_progress(req.id, Utc::now())
            .unwrap();
        assert_eq!(progress.raised, Amount::eth(9));
        assert_eq!(progress.progress, 90.0);
        assert_eq!(progress.donor_count, 1);
        assert_eq!(progress.days_remaining, 5);
    }

    #[test]
    fn platform_totals_equal_sums() {
        let (store, _dir) = temp_store();
        let creator = user(&store, 1, Role::Requester);
        let a = user(&store, 2, Role::Donor);
        let b = user(&store, 3, Role::Donor);
        let verifier = user(&store, 4, Role::Verifier);

        let r1 = request(&store, creator.id, RequestCategory::Medical, Amount::eth(10));
        let r2 = request(&store, creator.id, RequestCategory::Food, Amount::eth(2));
        donate(&store, a.id, r1.id, 1, "0x01");
        donate(&store, b.id, r1.id, 2, "0x02");
        donate(&store, b.id, r2.id, 2, "0x03");

        let mut pending = Donation::confirmed(a.id, r1.id, Amount::eth(50), String::new(), "sepolia".into());
        pending.status = DonationStatus::Pending;
        DonationRepository::new(&store).record(pending).unwrap();

        VoteRepository::new(&store)
            .cast(Vote::new(verifier.id, VoteTarget::Request(r1.id), VoteType::Approve))
            .unwrap();

        let stats = Analytics::new(&store).platform_stats().unwrap();
        assert_eq!(stats.users_total, 4);
        assert_eq!(stats.users_by_role.donors, 2);
        assert_eq!(stats.requests_total, 2);
        assert_eq!(stats.requests_completed, 1);
        assert_eq!(stats.requests_verified, 1);
        assert_eq!(stats.total_target, Amount::eth(12));
        assert_eq!(stats.total_raised, Amount::eth(5));
        assert_eq!(stats.donations_count, 3);
        assert_eq!(stats.unique_donors, 2);
        assert_eq!(stats.votes_total, 1);
        assert_eq!(stats.success_rate, 50.0);
    }

    #[test]
    fn user_stats_cover_both_sides() {
        let (store, _dir) = temp_store();
        let creator = user(&store, 1, Role::Requester);
        let donor = user(&store, 2, Role::Donor);
        let req = request(&store, creator.id, RequestCategory::Shelter, Amount::eth(10));
        donate(&store, donor.id, req.id, 3, "0x01");

        let analytics = Analytics::new(&store);
        let donor_stats = analytics.user_stats(donor.id).unwrap();
        assert_eq!(donor_stats.total_donated, Amount::eth(3));
        assert_eq!(donor_stats.requests_funded, 1);

        let creator_stats = analytics.user_stats(creator.id).unwrap();
        assert_eq!(creator_stats.requests_created, 1);
        assert_eq!(creator_stats.raised_for_requests, Amount::eth(3));
    }

    #[test]
    fn category_breakdown_and_top_donors() {
        let (store, _dir) = temp_store();
        let creator = user(&store, 1, Role::Requester);
        let a = user(&store, 2, Role::Donor);
        let b = user(&store, 3, Role::Donor);
        let med = request(&store, creator.id, RequestCategory::Medical, Amount::eth(10));
        let edu = request(&store, creator.id, RequestCategory::Education, Amount::eth(10));
        donate(&store, a.id, med.id, 1, "0x01");
        donate(&store, b.id, edu.id, 4, "0x02");

        let breakdown = Analytics::new(&store).category_breakdown().unwrap();
        assert_eq!(breakdown.len(), RequestCategory::ALL.len());
        let medical = &breakdown[0];
        assert_eq!(medical.category, RequestCategory::Medical);
        assert_eq!((medical.requests, medical.raised), (1, Amount::eth(1)));

        let top = Analytics::new(&store).top_donors(1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].donor_id, b.id);
        assert_eq!(top[0].name, "User 3");
    }

    #[test]
    fn days_until_rounds_up_and_floors_at_zero() {
        let now = Utc::now();
        assert_eq!(days_until(now + Duration::hours(1), now), 1);
        assert_eq!(days_until(now - Duration::hours(1), now), 0);
    }
}
