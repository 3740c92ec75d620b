//! RejectWithdrawalHandler - Command handler for an operator rejecting a withdrawal.

use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, Timestamp, WithdrawalId};
use crate::domain::withdrawal::{WithdrawalError, WithdrawalRequest};
use crate::ports::WithdrawalRepository;

const DEFAULT_REASON: &str = "Rejected by admin";

#[derive(Debug, Clone)]
pub struct RejectWithdrawalCommand {
    pub withdrawal_id: WithdrawalId,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RejectWithdrawalResult {
    pub request: WithdrawalRequest,
}

/// Handler for withdrawal rejection.
///
/// The status re-check, status write and refund are one store operation; a
/// request that reached `paid` is never refunded.
pub struct RejectWithdrawalHandler {
    withdrawals: Arc<dyn WithdrawalRepository>,
}

impl RejectWithdrawalHandler {
    pub fn new(withdrawals: Arc<dyn WithdrawalRepository>) -> Self {
        Self { withdrawals }
    }

    pub async fn handle(
        &self,
        cmd: RejectWithdrawalCommand,
    ) -> Result<RejectWithdrawalResult, WithdrawalError> {
        let reason = cmd
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REASON);

        let request = self
            .withdrawals
            .reject_with_refund(&cmd.withdrawal_id, reason, Timestamp::now())
            .await
            .map_err(|e| {
                if e.code == ErrorCode::WithdrawalNotFound {
                    return WithdrawalError::NotFound(cmd.withdrawal_id);
                }
                match WithdrawalError::from(e) {
                    WithdrawalError::InvalidState { current, .. } => {
                        WithdrawalError::invalid_state(current, "reject")
                    }
                    other => other,
                }
            })?;

        tracing::info!(
            withdrawal_id = %request.id,
            owner_id = %request.owner_id,
            amount = %request.amount,
            reason,
            "Withdrawal rejected, funds restored"
        );
        Ok(RejectWithdrawalResult { request })
    }
}
