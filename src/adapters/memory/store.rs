use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::foundation::{
    DomainError, ErrorCode, GroupId, InviteId, JoinIntentId, Money, Timestamp, TransactionId,
    UserId, WithdrawalId,
};
use crate::domain::group::{Group, GroupMembership};
use crate::domain::invite::GroupInvite;
use crate::domain::join::JoinIntent;
use crate::domain::ledger::{
    insufficient_funds, Direction, EarningsAccount, GroupTransaction, WalletAccount, WalletEntry,
    WalletMutation, WalletTransaction,
};
use crate::domain::withdrawal::WithdrawalRequest;

/// Shared in-memory backing for all ports.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// store.seed_group(group.clone(), owner_id);
///
/// let handler = InitiateJoinHandler::new(store.clone(), store.clone(), ...);
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
pub(super) struct StoreState {
    pub groups: HashMap<GroupId, Group>,
    pub memberships: Vec<GroupMembership>,
    pub invites: HashMap<InviteId, GroupInvite>,
    pub intents: HashMap<JoinIntentId, JoinIntent>,
    pub transactions: HashMap<TransactionId, GroupTransaction>,
    pub wallets: HashMap<UserId, WalletAccount>,
    pub wallet_log: Vec<WalletTransaction>,
    pub earnings: HashMap<UserId, EarningsAccount>,
    pub withdrawals: HashMap<WithdrawalId, WithdrawalRequest>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("InMemoryStore: state lock poisoned")
    }

    // ════════════════════════════════════════════════════════════════════════
    // Seeding and inspection helpers
    // ════════════════════════════════════════════════════════════════════════

    /// Stores a group together with its owner membership.
    pub fn seed_group(&self, group: Group, owner_id: UserId) {
        let mut state = self.lock();
        state
            .memberships
            .push(GroupMembership::owner(group.id, owner_id, group.created_at));
        state.groups.insert(group.id, group);
    }

    pub fn seed_invite(&self, invite: GroupInvite) {
        self.lock().invites.insert(invite.id, invite);
    }

    pub fn group(&self, id: &GroupId) -> Option<Group> {
        self.lock().groups.get(id).cloned()
    }

    pub fn invite(&self, id: &InviteId) -> Option<GroupInvite> {
        self.lock().invites.get(id).cloned()
    }

    pub fn intent(&self, id: &JoinIntentId) -> Option<JoinIntent> {
        self.lock().intents.get(id).cloned()
    }

    pub fn withdrawal(&self, id: &WithdrawalId) -> Option<WithdrawalRequest> {
        self.lock().withdrawals.get(id).cloned()
    }

    /// Non-left memberships of a group.
    pub fn members_of(&self, group_id: &GroupId) -> Vec<GroupMembership> {
        self.lock()
            .memberships
            .iter()
            .filter(|m| m.group_id == *group_id && m.is_current())
            .cloned()
            .collect()
    }

    pub fn all_transactions(&self) -> Vec<GroupTransaction> {
        self.lock().transactions.values().cloned().collect()
    }

    pub fn wallet_balance(&self, owner_id: &UserId) -> Money {
        self.lock()
            .wallets
            .get(owner_id)
            .map(|w| w.balance)
            .unwrap_or(Money::ZERO)
    }

    pub fn wallet_log_len(&self, owner_id: &UserId) -> usize {
        let state = self.lock();
        match state.wallets.get(owner_id) {
            Some(wallet) => state
                .wallet_log
                .iter()
                .filter(|t| t.wallet_id == wallet.id)
                .count(),
            None => 0,
        }
    }

    pub fn earnings_of(&self, owner_id: &UserId) -> Option<EarningsAccount> {
        self.lock().earnings.get(owner_id).cloned()
    }
}

impl StoreState {
    /// Applies one wallet mutation and appends its log row.
    pub(super) fn apply_wallet(
        &mut self,
        owner_id: &UserId,
        direction: Direction,
        amount: Money,
        entry: WalletEntry,
        now: Timestamp,
    ) -> Result<WalletMutation, DomainError> {
        if let Some(key) = &entry.idempotency_key {
            if let Some(existing) = self
                .wallet_log
                .iter()
                .find(|t| t.idempotency_key.as_deref() == Some(key.as_str()))
            {
                return Ok(WalletMutation::Replayed(existing.clone()));
            }
        }
        if amount.is_zero() || amount.is_negative() {
            return Err(DomainError::validation("amount", "Amount must be positive"));
        }

        let wallet = self
            .wallets
            .entry(*owner_id)
            .or_insert_with(|| WalletAccount::open(*owner_id, now));

        let balance_after = match direction {
            Direction::Credit => wallet.balance + amount,
            Direction::Debit => {
                if wallet.balance < amount {
                    return Err(insufficient_funds(wallet.balance, amount));
                }
                wallet.balance - amount
            }
        };
        wallet.balance = balance_after;
        wallet.updated_at = now;

        let tx = WalletTransaction::record(wallet.id, direction, amount, balance_after, entry, now);
        self.wallet_log.push(tx.clone());
        Ok(WalletMutation::Applied(tx))
    }
}

pub(super) fn not_found(code: ErrorCode, what: &str, id: impl std::fmt::Display) -> DomainError {
    DomainError::new(code, format!("{} not found: {}", what, id))
}
