//! Shared application state for the HTTP adapter.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::memory::InMemoryStore;
use crate::application::handlers::{
    ApproveWithdrawalHandler, ConfirmDevJoinHandler, ExpireJoinIntentHandler, GetEarningsSummaryHandler, GetWalletHandler,
    HandleGatewayWebhookHandler, InitiateDirectPurchaseHandler, InitiateJoinHandler,
    IssueInviteHandler, JoinFinalizer, ListEarningsTransactionsHandler,
    ListWalletTransactionsHandler, ListWithdrawalsHandler, RejectWithdrawalHandler,
    RequestWithdrawalHandler, ResolveInviteHandler, SettleWithdrawalHandler, TopUpWalletHandler,
    VerifyPaymentHandler,
};
use crate::domain::webhook::SignatureVerifier;
use crate::ports::{
    EarningsLedger, GroupRepository, GroupTransactionRepository, InviteRepository,
    JoinIntentRepository, PaymentGateway, PlatformSettingsSource, WalletLedger,
    WithdrawalRepository,
};

/// Bound on how long an approval waits for the payout call.
pub const DEFAULT_PAYOUT_TIMEOUT: Duration = Duration::from_secs(20);

/// Dependencies shared by every route.
///
/// Cloned per request; all fields are cheap `Arc` clones. Handlers are
/// built on demand from the ports.
#[derive(Clone)]
pub struct AppState {
    pub groups: Arc<dyn GroupRepository>,
    pub invites: Arc<dyn InviteRepository>,
    pub intents: Arc<dyn JoinIntentRepository>,
    pub transactions: Arc<dyn GroupTransactionRepository>,
    pub wallet: Arc<dyn WalletLedger>,
    pub earnings: Arc<dyn EarningsLedger>,
    pub withdrawals: Arc<dyn WithdrawalRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub settings: Arc<dyn PlatformSettingsSource>,
    /// Keyed with the webhook secret.
    pub webhook_verifier: SignatureVerifier,
    /// Keyed with the gateway API secret.
    pub checkout_verifier: SignatureVerifier,
    pub payout_timeout: Duration,
}

impl AppState {
    /// State backed entirely by one in-memory store.
    ///
    /// Signature secrets start empty; set them with `with_webhook_secret`
    /// and `with_checkout_secret`.
    pub fn in_memory(
        store: Arc<InMemoryStore>,
        gateway: Arc<dyn PaymentGateway>,
        settings: Arc<dyn PlatformSettingsSource>,
    ) -> Self {
        Self {
            groups: store.clone(),
            invites: store.clone(),
            intents: store.clone(),
            transactions: store.clone(),
            wallet: store.clone(),
            earnings: store.clone(),
            withdrawals: store,
            gateway,
            settings,
            webhook_verifier: SignatureVerifier::new(""),
            checkout_verifier: SignatureVerifier::new(""),
            payout_timeout: DEFAULT_PAYOUT_TIMEOUT,
        }
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_verifier = SignatureVerifier::new(secret);
        self
    }

    pub fn with_checkout_secret(mut self, secret: impl Into<String>) -> Self {
        self.checkout_verifier = SignatureVerifier::new(secret);
        self
    }

    pub fn with_payout_timeout(mut self, timeout: Duration) -> Self {
        self.payout_timeout = timeout;
        self
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Handler construction
    // ════════════════════════════════════════════════════════════════════════════

    pub fn finalizer(&self) -> Arc<JoinFinalizer> {
        Arc::new(JoinFinalizer::new(
            self.groups.clone(),
            self.invites.clone(),
            self.transactions.clone(),
            self.settings.clone(),
        ))
    }

    pub fn expire_join_intent_handler(&self) -> ExpireJoinIntentHandler {
        ExpireJoinIntentHandler::new(self.intents.clone())
    }

    pub fn resolve_invite_handler(&self) -> ResolveInviteHandler {
        ResolveInviteHandler::new(
            self.invites.clone(),
            self.groups.clone(),
            self.settings.clone(),
        )
    }

    pub fn issue_invite_handler(&self) -> IssueInviteHandler {
        IssueInviteHandler::new(
            self.groups.clone(),
            self.invites.clone(),
            self.settings.clone(),
        )
    }

    pub fn initiate_join_handler(&self) -> InitiateJoinHandler {
        InitiateJoinHandler::new(
            self.invites.clone(),
            self.groups.clone(),
            self.intents.clone(),
            self.wallet.clone(),
            self.gateway.clone(),
            self.settings.clone(),
            self.finalizer(),
        )
    }

    pub fn confirm_dev_join_handler(&self) -> ConfirmDevJoinHandler {
        ConfirmDevJoinHandler::new(
            self.intents.clone(),
            self.invites.clone(),
            self.transactions.clone(),
            self.settings.clone(),
            self.finalizer(),
        )
    }

    pub fn direct_purchase_handler(&self) -> InitiateDirectPurchaseHandler {
        InitiateDirectPurchaseHandler::new(
            self.groups.clone(),
            self.transactions.clone(),
            self.gateway.clone(),
            self.settings.clone(),
            self.finalizer(),
        )
    }

    pub fn webhook_handler(&self) -> HandleGatewayWebhookHandler {
        HandleGatewayWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.intents.clone(),
            self.transactions.clone(),
            self.finalizer(),
        )
    }

    pub fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            self.checkout_verifier.clone(),
            self.intents.clone(),
            self.transactions.clone(),
            self.finalizer(),
        )
    }

    pub fn earnings_summary_handler(&self) -> GetEarningsSummaryHandler {
        GetEarningsSummaryHandler::new(
            self.earnings.clone(),
            self.groups.clone(),
            self.withdrawals.clone(),
            self.settings.clone(),
        )
    }

    pub fn earnings_transactions_handler(&self) -> ListEarningsTransactionsHandler {
        ListEarningsTransactionsHandler::new(self.transactions.clone())
    }

    pub fn get_wallet_handler(&self) -> GetWalletHandler {
        GetWalletHandler::new(self.wallet.clone())
    }

    pub fn wallet_transactions_handler(&self) -> ListWalletTransactionsHandler {
        ListWalletTransactionsHandler::new(self.wallet.clone())
    }

    pub fn top_up_handler(&self) -> TopUpWalletHandler {
        TopUpWalletHandler::new(self.wallet.clone(), self.settings.clone())
    }

    pub fn request_withdrawal_handler(&self) -> RequestWithdrawalHandler {
        RequestWithdrawalHandler::new(self.withdrawals.clone(), self.settings.clone())
    }

    pub fn list_withdrawals_handler(&self) -> ListWithdrawalsHandler {
        ListWithdrawalsHandler::new(self.withdrawals.clone())
    }

    pub fn approve_withdrawal_handler(&self) -> ApproveWithdrawalHandler {
        ApproveWithdrawalHandler::new(
            self.withdrawals.clone(),
            self.gateway.clone(),
            self.settings.clone(),
            self.payout_timeout,
        )
    }

    pub fn reject_withdrawal_handler(&self) -> RejectWithdrawalHandler {
        RejectWithdrawalHandler::new(self.withdrawals.clone())
    }

    pub fn settle_withdrawal_handler(&self) -> SettleWithdrawalHandler {
        SettleWithdrawalHandler::new(self.withdrawals.clone())
    }
}
