//! Shared wiring for handler tests: one in-memory store behind every port.

use std::sync::Arc;

use crate::adapters::memory::InMemoryStore;
use crate::adapters::razorpay::MockPaymentGateway;
use crate::adapters::settings::SharedSettings;
use crate::domain::fees::EarningsBucket;
use crate::domain::foundation::{Money, Timestamp, UserId};
use crate::domain::group::Group;
use crate::domain::invite::GroupInvite;
use crate::domain::group::MemberRole;
use crate::domain::ledger::{WalletEntry, WalletSource};
use crate::domain::settings::PlatformSettings;
use crate::ports::{EarningsLedger, PaymentGateway, WalletLedger};

use super::join::JoinFinalizer;

pub(crate) struct World {
    pub store: Arc<InMemoryStore>,
    pub gateway: MockPaymentGateway,
    pub settings: Arc<SharedSettings>,
}

impl World {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            gateway: MockPaymentGateway::new(),
            settings: Arc::new(SharedSettings::default()),
        }
    }

    pub fn update_settings(&self, change: impl FnOnce(&mut PlatformSettings)) {
        let mut settings = self.settings.snapshot();
        change(&mut settings);
        self.settings.replace(settings);
    }

    pub fn gateway_port(&self) -> Arc<dyn PaymentGateway> {
        Arc::new(self.gateway.clone())
    }

    pub fn finalizer(&self) -> Arc<JoinFinalizer> {
        Arc::new(JoinFinalizer::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.settings.clone(),
        ))
    }

    /// Seeds a waiting group owned by `owner`.
    pub fn group(&self, owner: UserId, price_minor: i64, limit: u32) -> Group {
        let group = Group::new(
            "Streaming plan",
            owner,
            Money::from_minor(price_minor),
            limit,
            Timestamp::now(),
        )
        .expect("valid group");
        self.store.seed_group(group.clone(), owner);
        group
    }

    /// Seeds an active invite for `group`, expiring in an hour.
    pub fn invite(&self, group: &Group, max_uses: Option<u32>) -> GroupInvite {
        let now = Timestamp::now();
        let invite = GroupInvite::issue(
            group.id,
            group.created_by,
            MemberRole::Owner,
            max_uses,
            Some(now.plus_hours(1)),
            now,
        );
        self.store.seed_invite(invite.clone());
        invite
    }

    pub async fn fund_wallet(&self, user: UserId, minor: i64) {
        WalletLedger::credit(
            &*self.store,
            &user,
            Money::from_minor(minor),
            WalletEntry::new(WalletSource::Topup, "Test top-up"),
        )
        .await
        .expect("wallet credit");
    }

    pub async fn fund_earnings(&self, owner: UserId, minor: i64) {
        EarningsLedger::credit(
            &*self.store,
            &owner,
            EarningsBucket::Withdrawable,
            Money::from_minor(minor),
            Timestamp::now(),
        )
        .await
        .expect("earnings credit");
    }
}
