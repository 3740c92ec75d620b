//! TopUpWalletHandler - Command handler for adding stored value to a wallet.

use std::sync::Arc;

use crate::domain::foundation::{Money, UserId};
use crate::domain::ledger::{WalletEntry, WalletError, WalletSource, WalletTransaction};
use crate::ports::{PlatformSettingsSource, WalletLedger};

#[derive(Debug, Clone)]
pub struct TopUpWalletCommand {
    pub user_id: UserId,
    pub amount: Money,
    /// Client-supplied key; a retried top-up with the same key credits once.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TopUpWalletResult {
    pub transaction: WalletTransaction,
    pub balance: Money,
    pub replayed: bool,
}

pub struct TopUpWalletHandler {
    wallet: Arc<dyn WalletLedger>,
    settings: Arc<dyn PlatformSettingsSource>,
}

impl TopUpWalletHandler {
    pub fn new(wallet: Arc<dyn WalletLedger>, settings: Arc<dyn PlatformSettingsSource>) -> Self {
        Self { wallet, settings }
    }

    pub async fn handle(&self, cmd: TopUpWalletCommand) -> Result<TopUpWalletResult, WalletError> {
        let settings = self.settings.current().await?;
        if cmd.amount < settings.min_topup || cmd.amount > settings.max_topup {
            return Err(WalletError::AmountOutOfRange {
                min: settings.min_topup,
                max: settings.max_topup,
                requested: cmd.amount,
            });
        }

        // Advisory: the cap is checked against the balance read here.
        let balance = self
            .wallet
            .find_account(&cmd.user_id)
            .await?
            .map_or(Money::ZERO, |a| a.balance);
        let over_cap = balance
            .checked_add(cmd.amount)
            .map_or(true, |after| after > settings.max_wallet_balance);
        if over_cap {
            return Err(WalletError::BalanceLimitExceeded {
                limit: settings.max_wallet_balance,
            });
        }

        let mut entry = WalletEntry::new(WalletSource::Topup, "Wallet top-up");
        if let Some(key) = cmd.idempotency_key.filter(|k| !k.trim().is_empty()) {
            entry = entry.with_idempotency_key(format!("topup:{}:{}", cmd.user_id, key));
        }
        let mutation = self.wallet.credit(&cmd.user_id, cmd.amount, entry).await?;
        let replayed = mutation.is_replay();
        let transaction = mutation.transaction().clone();

        if !replayed {
            tracing::info!(
                user_id = %cmd.user_id,
                amount = %cmd.amount,
                balance = %transaction.balance_after,
                "Wallet topped up"
            );
        }
        Ok(TopUpWalletResult {
            balance: transaction.balance_after,
            transaction,
            replayed,
        })
    }
}
