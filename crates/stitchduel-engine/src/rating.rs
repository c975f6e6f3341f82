//! Rating reads and the monthly winner celebration

use std::sync::Arc;

use tracing::{info, warn};

use stitchduel_domain::compute_winners;
use stitchduel_types::{DuelResult, RatingRecord};

use crate::ports::{DuelStore, Notifier};

/// Aggregated win/participation rating over the duel archive
pub struct RatingService {
    store: Arc<dyn DuelStore>,
    notifier: Arc<dyn Notifier>,
}

impl RatingService {
    pub fn new(store: Arc<dyn DuelStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Current-period counts per active user, unordered
    pub async fn current_rating(&self) -> DuelResult<Vec<RatingRecord>> {
        self.store.current_rating().await
    }

    /// Prior-calendar-month counts, ordered by wins then participation
    pub async fn previous_period_rating(&self) -> DuelResult<Vec<RatingRecord>> {
        self.store.previous_month_rating().await
    }

    /// Publish the previous month's rating and celebrate the winners.
    ///
    /// The caller decides *when* (the task that fires this runs on the
    /// last day of the month); this only decides *what* gets posted.
    pub async fn publish_monthly_rating(&self) -> DuelResult<()> {
        let rating = self.store.previous_month_rating().await?;
        let winners = compute_winners(&rating);

        info!(
            entries = rating.len(),
            winners = winners.len(),
            "publishing monthly rating"
        );

        if let Err(err) = self.notifier.post_monthly_rating(&rating, &winners).await {
            warn!(%err, "failed to post monthly rating");
        }
        Ok(())
    }

    /// Refresh the materialized rating store.
    ///
    /// The duel engine calls this after every completion; exposing it here
    /// lets operational tooling force a refresh too.
    pub async fn refresh(&self) -> DuelResult<()> {
        self.store.refresh_rating().await
    }
}
