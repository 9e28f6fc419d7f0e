// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! User repository.
//!
//! Indexed by lowercase wallet address (unique), role and email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{RecordId, WalletAddress};
use crate::session::Role;
use crate::storage::database::{LocalStore, Record, StoreError, StoreResult, Table};

/// Optional profile fields filled in after sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store
    #[serde(default)]
    pub id: RecordId,
    /// Connected wallet (unique)
    pub wallet_address: WalletAddress,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Never decreases
    #[serde(default)]
    pub reputation: u32,
    #[serde(default)]
    pub verified: bool,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub profile: UserProfile,
}

impl User {
    /// A fresh, unverified user with zero reputation.
    pub fn new(wallet_address: WalletAddress, email: String, name: String, role: Role) -> Self {
        Self {
            id: 0,
            wallet_address,
            email,
            name,
            role,
            reputation: 0,
            verified: false,
            joined_at: Utc::now(),
            profile: UserProfile::default(),
        }
    }

    /// `true` when the user can receive funds.
    pub fn has_wallet(&self) -> bool {
        !self.wallet_address.is_empty()
    }
}

impl Record for User {
    const TABLE: Table = Table::Users;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("role", self.role.as_str().to_string()),
            ("email", self.email.trim().to_lowercase()),
        ];
        if self.has_wallet() {
            entries.push(("wallet", self.wallet_address.normalized()));
        }
        entries
    }

    fn unique_fields() -> &'static [&'static str] {
        &["wallet"]
    }
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub website: Option<String>,
}

impl ProfileUpdate {
    fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        let profile = &mut user.profile;
        if self.bio.is_some() {
            profile.bio = self.bio;
        }
        if self.avatar_url.is_some() {
            profile.avatar_url = self.avatar_url;
        }
        if self.location.is_some() {
            profile.location = self.location;
        }
        if self.phone.is_some() {
            profile.phone = self.phone;
        }
        if self.organization.is_some() {
            profile.organization = self.organization;
        }
        if self.website.is_some() {
            profile.website = self.website;
        }
    }
}

/// Repository for user records.
pub struct UserRepository<'a> {
    store: &'a LocalStore,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Register a user. Fails with `StoreError::Duplicate` if the wallet is taken.
    pub fn create(&self, user: User) -> StoreResult<User> {
        let user = self.store.insert(user)?;
        tracing::debug!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub fn get(&self, id: RecordId) -> StoreResult<User> {
        self.store.read(|scope| scope.require(id))
    }

    /// Look up by wallet address (case-insensitive).
    pub fn by_wallet(&self, wallet: &WalletAddress) -> StoreResult<Option<User>> {
        Ok(self
            .store
            .find_by::<User>("wallet", &wallet.normalized())?
            .into_iter()
            .next())
    }

    pub fn by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        self.store.find_by("role", role.as_str())
    }

    /// All users, oldest first.
    pub fn list(&self) -> StoreResult<Vec<User>> {
        let mut users = self.store.list::<User>()?;
        users.sort_by_key(|u| (u.joined_at, u.id));
        Ok(users)
    }

    pub fn update_profile(&self, id: RecordId, update: ProfileUpdate) -> StoreResult<User> {
        self.store.update::<User, _>(id, |user| update.apply(user))
    }

    pub fn set_role(&self, id: RecordId, role: Role) -> StoreResult<User> {
        self.store.update::<User, _>(id, |user| user.role = role)
    }

    pub fn set_verified(&self, id: RecordId, verified: bool) -> StoreResult<User> {
        self.store.update::<User, _>(id, |user| user.verified = verified)
    }

    /// Add reputation points (saturating; reputation never decreases).
    pub fn add_reputation(&self, id: RecordId, points: u32) -> StoreResult<User> {
        self.store.update::<User, _>(id, |user| {
            user.reputation = user.reputation.saturating_add(points);
        })
    }

    /// Admin removal.
    pub fn delete(&self, id: RecordId) -> StoreResult<User> {
        self.store
            .delete::<User>(id)?
            .ok_or_else(|| StoreError::NotFound(format!("User {id}")))
    }
}
