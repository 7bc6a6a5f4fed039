//! Payment update lifecycle for the payment calendar.
//!
//! Owns the local view of the payment list and runs the optimistic update
//! path: validate, apply locally, then confirm against the remote gateway
//! or queue for offline replay, rolling back on failure. Collaborators
//! (remote gateway, conflict resolver, field cipher) are injected trait
//! objects constructed in `main`, never implicit singletons.

use crate::db::{DbConnection, QueuedAction};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    ConflictMetadata, FeedbackSignal, MarkPaidOutcome, MarkPaidResponse, Payment,
    ResolveConflictsResponse,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("unknown payment: {0}")]
    UnknownPayment(String),
    #[error("offline queue write failed")]
    QueueWrite(#[source] anyhow::Error),
    #[error("payload encryption failed")]
    Cipher(#[source] anyhow::Error),
}

/// Upstream persistence for payment updates. `broadcast_update` propagates a
/// confirmed change to other concurrently-connected viewers of the same
/// record; everything past invoking it is outside this service's scope.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn update_payment(&self, payment: &Payment) -> Result<()>;
    async fn broadcast_update(&self, payment: &Payment) -> Result<()>;
}

/// Verdict from the external conflict-resolution procedure
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictVerdict {
    /// Apply the resolved record through the normal update path
    UseResolved(Payment),
    /// Leave the local record as it is
    KeepLocal,
}

/// External collaborator that owns the conflict comparison/merge algorithm
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve(
        &self,
        payment: &Payment,
        metadata: &ConflictMetadata,
    ) -> Result<ConflictVerdict>;
}

/// Encrypts sensitive payment fields before they touch the offline queue
pub trait FieldCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String>;
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

/// Identity cipher for local development; deployments inject the
/// keychain-backed implementation.
pub struct IdentityCipher;

impl FieldCipher for IdentityCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        Ok(ciphertext.to_string())
    }
}

/// Gateway that accepts every update and only logs it; stands in for the
/// hosted API in local runs.
pub struct LoggingRemoteGateway;

#[async_trait]
impl RemoteGateway for LoggingRemoteGateway {
    async fn update_payment(&self, payment: &Payment) -> Result<()> {
        info!(payment_id = %payment.id, "remote update accepted");
        Ok(())
    }

    async fn broadcast_update(&self, payment: &Payment) -> Result<()> {
        info!(payment_id = %payment.id, "broadcast to connected viewers");
        Ok(())
    }
}

/// Resolver that keeps the local record when it carries the later timestamp
/// (clearing the flag) and otherwise defers to the next upstream push.
pub struct LastWriteWinsResolver;

#[async_trait]
impl ConflictResolver for LastWriteWinsResolver {
    async fn resolve(
        &self,
        payment: &Payment,
        metadata: &ConflictMetadata,
    ) -> Result<ConflictVerdict> {
        let local = DateTime::parse_from_rfc3339(&metadata.local_updated_at)?;
        let remote = DateTime::parse_from_rfc3339(&metadata.remote_updated_at)?;
        if local >= remote {
            let mut resolved = payment.clone();
            resolved.conflict = None;
            Ok(ConflictVerdict::UseResolved(resolved))
        } else {
            // The remote copy is newer; its owner will push the winning
            // version, so nothing to apply from this side.
            Ok(ConflictVerdict::KeepLocal)
        }
    }
}

struct PaymentState {
    payments: HashMap<String, Payment>,
    /// Monotonic per-record write tokens; a completion holding a stale
    /// token neither confirms nor rolls back (last write wins)
    write_tokens: HashMap<String, u64>,
}

/// Domain service owning the optimistic payment lifecycle
#[derive(Clone)]
pub struct PaymentService {
    state: Arc<Mutex<PaymentState>>,
    remote: Arc<dyn RemoteGateway>,
    resolver: Arc<dyn ConflictResolver>,
    cipher: Arc<dyn FieldCipher>,
    db: DbConnection,
}

impl PaymentService {
    pub fn new(
        db: DbConnection,
        remote: Arc<dyn RemoteGateway>,
        resolver: Arc<dyn ConflictResolver>,
        cipher: Arc<dyn FieldCipher>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(PaymentState {
                payments: HashMap::new(),
                write_tokens: HashMap::new(),
            })),
            remote,
            resolver,
            cipher,
            db,
        }
    }

    /// Replace the payment snapshot the calendar works from. The canonical
    /// list is owned by the caller; this service keeps a local view and
    /// requests mutations through the gateway rather than writing upstream
    /// state directly.
    pub fn load_snapshot(&self, payments: Vec<Payment>) {
        let mut state = self.state.lock().unwrap();
        state.payments = payments.into_iter().map(|p| (p.id.clone(), p)).collect();
        state.write_tokens.clear();
        info!(count = state.payments.len(), "payment snapshot loaded");
    }

    /// Current local view, ordered by due date then id for stable output
    pub fn list_payments(&self) -> Vec<Payment> {
        let state = self.state.lock().unwrap();
        let mut payments: Vec<Payment> = state.payments.values().cloned().collect();
        payments.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        payments
    }

    pub fn get_payment(&self, payment_id: &str) -> Option<Payment> {
        self.state.lock().unwrap().payments.get(payment_id).cloned()
    }

    /// Mark a payment as paid.
    ///
    /// The local view is updated synchronously before any await, so the
    /// caller always sees the change immediately; the remote resolution
    /// arrives later and either confirms or reverts it.
    pub async fn mark_paid(
        &self,
        payment_id: &str,
        online: bool,
        now: DateTime<Utc>,
    ) -> Result<MarkPaidResponse> {
        let (snapshot, updated) = {
            let state = self.state.lock().unwrap();
            let current = state
                .payments
                .get(payment_id)
                .cloned()
                .ok_or_else(|| PaymentError::UnknownPayment(payment_id.to_string()))?;
            (current.clone(), current.mark_paid(now))
        };

        let errors = updated.validate();
        if !errors.is_empty() {
            // Validation failure is a logged no-op; nothing was touched
            warn!(payment_id, ?errors, "mark-paid rejected by validation");
            return Ok(respond(MarkPaidOutcome::Rejected { errors }));
        }

        let token = self.apply_optimistic(&updated);

        if online {
            self.confirm_remote(snapshot, updated, token).await
        } else {
            self.enqueue_offline(snapshot, updated, token, now).await
        }
    }

    /// Optimistically install an updated record, returning the write token
    /// that identifies this write against later completions
    fn apply_optimistic(&self, updated: &Payment) -> u64 {
        let mut state = self.state.lock().unwrap();
        state
            .payments
            .insert(updated.id.clone(), updated.clone());
        let token = state
            .write_tokens
            .entry(updated.id.clone())
            .and_modify(|t| *t += 1)
            .or_insert(1);
        *token
    }

    /// True if `token` is still the newest write for the record
    fn token_is_current(&self, payment_id: &str, token: u64) -> bool {
        self.state
            .lock()
            .unwrap()
            .write_tokens
            .get(payment_id)
            .copied()
            == Some(token)
    }

    fn restore(&self, snapshot: Payment) {
        let mut state = self.state.lock().unwrap();
        state.payments.insert(snapshot.id.clone(), snapshot);
    }

    async fn confirm_remote(
        &self,
        snapshot: Payment,
        updated: Payment,
        token: u64,
    ) -> Result<MarkPaidResponse> {
        match self.remote.update_payment(&updated).await {
            Ok(()) => {
                // Cross-device propagation is best effort; the update itself
                // is already durable upstream
                if let Err(e) = self.remote.broadcast_update(&updated).await {
                    warn!(payment_id = %updated.id, error = %e, "broadcast failed");
                }
                info!(payment_id = %updated.id, "mark-paid confirmed remotely");
                Ok(respond(MarkPaidOutcome::Applied { payment: updated }))
            }
            Err(e) => {
                error!(payment_id = %updated.id, error = %e, "remote update failed");
                if self.token_is_current(&updated.id, token) {
                    self.restore(snapshot.clone());
                    Ok(respond(MarkPaidOutcome::RolledBack { payment: snapshot }))
                } else {
                    // A newer write owns this record; leave it alone
                    Ok(respond(MarkPaidOutcome::Superseded))
                }
            }
        }
    }

    async fn enqueue_offline(
        &self,
        snapshot: Payment,
        updated: Payment,
        token: u64,
        now: DateTime<Utc>,
    ) -> Result<MarkPaidResponse> {
        let plaintext = serde_json::to_string(&updated)?;
        let ciphertext = match self.cipher.encrypt(&plaintext) {
            Ok(c) => c,
            Err(e) => {
                if self.token_is_current(&updated.id, token) {
                    self.restore(snapshot);
                }
                return Err(PaymentError::Cipher(e).into());
            }
        };

        let action = QueuedAction::new(&updated.id, "mark_paid", ciphertext, now.to_rfc3339());
        match self.db.enqueue_action(&action).await {
            Ok(()) => {
                info!(payment_id = %updated.id, action_id = %action.id, "queued for offline replay");
                Ok(respond(MarkPaidOutcome::QueuedOffline { payment: updated }))
            }
            Err(e) => {
                // The view must never show a change that exists nowhere
                // durable, so a failed enqueue reverts the local apply
                if self.token_is_current(&updated.id, token) {
                    self.restore(snapshot);
                }
                Err(PaymentError::QueueWrite(e).into())
            }
        }
    }

    /// Detect records flagged by the data source as concurrently modified
    /// and run each through the resolver. A "use resolved" verdict re-enters
    /// the normal update path; resolver failures are logged only.
    pub async fn resolve_conflicts(
        &self,
        online: bool,
        now: DateTime<Utc>,
    ) -> Result<ResolveConflictsResponse> {
        let flagged: Vec<(Payment, ConflictMetadata)> = {
            let state = self.state.lock().unwrap();
            state
                .payments
                .values()
                .filter(|p| p.has_conflict())
                .filter_map(|p| p.conflict.clone().map(|meta| (p.clone(), meta)))
                .collect()
        };

        let mut resolved = 0;
        let mut failed = 0;

        for (payment, metadata) in flagged {
            match self.resolver.resolve(&payment, &metadata).await {
                Ok(ConflictVerdict::UseResolved(record)) => {
                    match self.apply_resolved(payment.clone(), record, online, now).await {
                        Ok(true) => resolved += 1,
                        Ok(false) => {
                            warn!(payment_id = %payment.id, "resolved record was not applied");
                            failed += 1;
                        }
                        Err(e) => {
                            error!(payment_id = %payment.id, error = %e, "applying resolved record failed");
                            failed += 1;
                        }
                    }
                }
                Ok(ConflictVerdict::KeepLocal) => {}
                Err(e) => {
                    error!(payment_id = %payment.id, error = %e, "conflict resolution failed");
                    failed += 1;
                }
            }
        }

        Ok(ResolveConflictsResponse { resolved, failed })
    }

    /// Push a resolver-produced record through the normal update path.
    /// Returns whether the record ended up applied or queued; a rollback,
    /// rejection or superseded completion is not a resolution.
    async fn apply_resolved(
        &self,
        snapshot: Payment,
        record: Payment,
        online: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let errors = record.validate();
        if !errors.is_empty() {
            warn!(payment_id = %record.id, ?errors, "resolved record rejected by validation");
            return Ok(false);
        }

        let token = self.apply_optimistic(&record);
        let response = if online {
            self.confirm_remote(snapshot, record, token).await?
        } else {
            self.enqueue_offline(snapshot, record, token, now).await?
        };
        Ok(matches!(
            response.outcome,
            MarkPaidOutcome::Applied { .. } | MarkPaidOutcome::QueuedOffline { .. }
        ))
    }

    /// Drain pending offline actions through the remote gateway. Stops at
    /// the first failure so ordering is preserved for the next attempt.
    pub async fn replay_offline_actions(&self) -> Result<usize> {
        let pending = self.db.pending_actions().await?;
        let mut replayed = 0;

        for action in pending {
            let plaintext = self.cipher.decrypt(&action.payload).map_err(PaymentError::Cipher)?;
            let payment: Payment = serde_json::from_str(&plaintext)?;

            if let Err(e) = self.remote.update_payment(&payment).await {
                warn!(action_id = %action.id, error = %e, "offline replay halted");
                break;
            }
            self.db.mark_replayed(&action.id).await?;
            replayed += 1;
        }

        if replayed > 0 {
            info!(replayed, "offline actions replayed");
        }
        Ok(replayed)
    }
}

fn respond(outcome: MarkPaidOutcome) -> MarkPaidResponse {
    let feedback = match &outcome {
        MarkPaidOutcome::Applied { .. } | MarkPaidOutcome::QueuedOffline { .. } => {
            FeedbackSignal::Success
        }
        MarkPaidOutcome::RolledBack { .. } => FeedbackSignal::Error,
        MarkPaidOutcome::Rejected { .. } | MarkPaidOutcome::Superseded => FeedbackSignal::None,
    };
    MarkPaidResponse { outcome, feedback }
}
