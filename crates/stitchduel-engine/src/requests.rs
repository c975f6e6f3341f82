//! Duel request lifecycle
//!
//! A request is a time-limited proposal from one user to another. It ends
//! one of four ways: accepted (a duel starts), declined, expired, or
//! invalidated because a sibling request from the same sender was accepted
//! first.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use stitchduel_domain::{BlackoutPolicy, DuelConfig, SiblingCleanup};
use stitchduel_types::{
    DuelError, DuelRequest, DuelRequestAction, DuelRequestId, DuelResult, RemovedRequest,
    ScheduledTask, UserBrief, UserId,
};

use crate::duels::DuelEngine;
use crate::ports::{DuelStore, Notifier, TaskScheduler};

/// Creates, resolves and expires duel requests
pub struct DuelRequestManager {
    store: Arc<dyn DuelStore>,
    scheduler: Arc<dyn TaskScheduler>,
    notifier: Arc<dyn Notifier>,
    blackout: Arc<dyn BlackoutPolicy>,
    engine: Arc<DuelEngine>,
    config: DuelConfig,
}

impl DuelRequestManager {
    pub fn new(
        store: Arc<dyn DuelStore>,
        scheduler: Arc<dyn TaskScheduler>,
        notifier: Arc<dyn Notifier>,
        blackout: Arc<dyn BlackoutPolicy>,
        engine: Arc<DuelEngine>,
        config: DuelConfig,
    ) -> Self {
        Self {
            store,
            scheduler,
            notifier,
            blackout,
            engine,
            config,
        }
    }

    /// Send duel requests from one user to several targets.
    ///
    /// Targets that already hold a pending request from this sender are
    /// silently skipped. Each request actually created gets a best-effort
    /// notification (capturing the returned message marker, if any) and an
    /// expiration task after the validity period.
    pub async fn send_requests(
        &self,
        from_user_id: UserId,
        to_user_ids: &[UserId],
    ) -> DuelResult<Vec<DuelRequest>> {
        if to_user_ids.is_empty() {
            return Err(DuelError::Validation(
                "at least one target user is required".to_string(),
            ));
        }
        if to_user_ids.contains(&from_user_id) {
            return Err(DuelError::Validation(
                "cannot send a duel request to yourself".to_string(),
            ));
        }

        if self.store.user_in_active_duel(from_user_id, None).await? {
            return Err(DuelError::UserAlreadyInDuel(from_user_id));
        }
        if self.blackout.is_blackout(chrono::Utc::now()) {
            return Err(DuelError::BlackoutWindow);
        }

        let created = self.store.create_requests(from_user_id, to_user_ids).await?;
        if created.is_empty() {
            debug!(%from_user_id, "no new duel requests: all targets already requested");
            return Ok(created);
        }

        let from_user = self
            .store
            .get_user_brief(from_user_id)
            .await?
            .ok_or(DuelError::UserNotFound(from_user_id))?;

        info!(%from_user_id, count = created.len(), "duel requests sent");

        join_all(
            created
                .iter()
                .map(|request| self.dispatch_request(request, &from_user)),
        )
        .await
        .into_iter()
        .collect::<DuelResult<Vec<()>>>()?;

        Ok(created)
    }

    /// Resolve a pending request by its target.
    pub async fn handle_request(
        &self,
        request_id: DuelRequestId,
        acting_user_id: UserId,
        action: DuelRequestAction,
    ) -> DuelResult<()> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or(DuelError::RequestNotFound(request_id))?;
        if request.to_user_id != acting_user_id {
            return Err(DuelError::NotAllowed);
        }

        if self.blackout.is_blackout(chrono::Utc::now()) {
            return Err(DuelError::BlackoutWindow);
        }
        if self.store.user_in_active_duel(acting_user_id, None).await? {
            // The target can no longer duel; the stale request goes away.
            self.store.remove_request(request_id).await?;
            return Err(DuelError::UserAlreadyInDuel(acting_user_id));
        }

        match action {
            DuelRequestAction::Accept => self.accept_request(request_id).await,
            DuelRequestAction::Decline => self.decline_request(request_id).await,
        }
    }

    /// Remove a request whose validity period elapsed.
    ///
    /// Idempotent — a request already resolved some other way is a no-op.
    pub async fn remove_expired_request(&self, request_id: DuelRequestId) -> DuelResult<()> {
        let Some(removed) = self.store.remove_request(request_id).await? else {
            return Ok(());
        };
        info!(%request_id, "duel request expired");

        if let Err(err) = self
            .notifier
            .notify_request_expired(&removed.from_user, &removed.to_user)
            .await
        {
            warn!(%request_id, %err, "failed to notify about expired request");
        }
        if let Some(marker) = removed.message_marker {
            if let Err(err) = self
                .notifier
                .edit_request_invalidated(removed.to_user.id, marker, &removed.from_user)
                .await
            {
                warn!(%request_id, %err, "failed to edit expired request message");
            }
        }
        Ok(())
    }

    /// Pending requests addressed to a user, newest first
    pub async fn requests_for_user(&self, user_id: UserId) -> DuelResult<Vec<DuelRequest>> {
        self.store.requests_for_user(user_id).await
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn dispatch_request(
        &self,
        request: &DuelRequest,
        from_user: &UserBrief,
    ) -> DuelResult<()> {
        match self
            .notifier
            .notify_duel_requested(request.to_user_id, from_user)
            .await
        {
            Ok(Some(marker)) => {
                self.store.set_request_marker(request.id, marker).await?;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(request_id = %request.id, %err, "failed to notify duel request target");
            }
        }
        self.scheduler
            .schedule(
                ScheduledTask::CancelDuelRequest {
                    request_id: request.id,
                },
                self.config.request_validity,
            )
            .await
    }

    async fn accept_request(&self, request_id: DuelRequestId) -> DuelResult<()> {
        // Atomic delete-returning: whoever removes the row owns the accept.
        let Some(removed) = self.store.remove_request(request_id).await? else {
            return Ok(());
        };
        let RemovedRequest {
            from_user, to_user, ..
        } = removed;

        match self.engine.create_duel(&from_user, &to_user).await {
            Ok(duel) => {
                info!(%request_id, duel_id = %duel.id, "duel request accepted");
            }
            // The request is already consumed at this point, so a busy
            // sender is a terminal conflict, not a retryable one.
            Err(DuelError::UserAlreadyInDuel(busy)) if busy == from_user.id => {
                return Err(DuelError::OtherUserAlreadyInDuel(busy));
            }
            Err(err) => return Err(err),
        }

        if let Err(err) = self
            .notifier
            .notify_request_accepted(from_user.id, &to_user)
            .await
        {
            warn!(%request_id, %err, "failed to notify sender about acceptance");
        }

        self.invalidate_siblings(from_user.id, request_id, &from_user)
            .await
    }

    async fn decline_request(&self, request_id: DuelRequestId) -> DuelResult<()> {
        let Some(removed) = self.store.remove_request(request_id).await? else {
            return Ok(());
        };
        info!(%request_id, "duel request declined");

        if let Err(err) = self
            .notifier
            .notify_request_declined(removed.from_user.id, &removed.to_user)
            .await
        {
            warn!(%request_id, %err, "failed to notify sender about decline");
        }
        Ok(())
    }

    /// Once one request from a sender is accepted, their other pending
    /// requests are stale: nobody can duel a user who just entered a duel.
    async fn invalidate_siblings(
        &self,
        from_user_id: UserId,
        accepted_request_id: DuelRequestId,
        from_user: &UserBrief,
    ) -> DuelResult<()> {
        let siblings = self
            .store
            .sibling_requests(from_user_id, accepted_request_id)
            .await?;

        for sibling in siblings {
            match (sibling.message_marker, self.config.sibling_cleanup) {
                (Some(marker), _) => {
                    if let Err(err) = self
                        .notifier
                        .edit_request_invalidated(sibling.to_user_id, marker, from_user)
                        .await
                    {
                        warn!(request_id = %sibling.id, %err, "failed to edit sibling request message");
                    }
                    self.store.remove_request(sibling.id).await?;
                }
                (None, SiblingCleanup::All) => {
                    self.store.remove_request(sibling.id).await?;
                }
                (None, SiblingCleanup::MarkedOnly) => {
                    // Left to expire through its scheduled cancellation.
                }
            }
        }
        Ok(())
    }
}
