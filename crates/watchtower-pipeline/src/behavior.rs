// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavior scoring job and the trusted-user action.

use chrono::Utc;
use tracing::{debug, info};
use watchtower_behavior::apply;
use watchtower_bus::{SuspicionAlert, WatchtowerEvent};
use watchtower_core::WatchtowerError;
use watchtower_core::types::{BehaviorKey, UserBehaviorProfile};

use crate::Services;

/// Community traffic read around a user's history for response latency.
const LATENCY_CONTEXT: usize = 200;

impl Services {
    /// Re-scores one user from stored history. Read-modify-write happens
    /// under the per-user lock.
    pub(crate) async fn analyze_behavior(
        &self,
        key: &BehaviorKey,
    ) -> Result<UserBehaviorProfile, WatchtowerError> {
        let _guard = self.behavior_locks.lock(key).await;

        let history = self
            .bounded(
                self.storage
                    .user_messages(key, self.config.behavior.history_limit),
            )
            .await?;
        let context = self
            .bounded(
                self.storage
                    .community_messages(&key.community_id, LATENCY_CONTEXT),
            )
            .await?;
        let mut profile = self
            .bounded(self.storage.get_behavior_profile(key))
            .await?
            .unwrap_or_else(|| UserBehaviorProfile::new(key));

        let analysis = self.scorer.score(&profile, &history, &context);
        apply(&mut profile, &analysis, Utc::now());
        self.bounded(self.storage.upsert_behavior_profile(&profile))
            .await?;
        debug!(
            user = %key,
            score = profile.suspicion_score,
            messages = analysis.message_count,
            "behavior scored"
        );

        if let Some(signal) = self.scorer.signal(&profile, &analysis) {
            info!(
                user = %key,
                score = signal.score,
                risk_factors = ?signal.risk_factors,
                "suspicious activity"
            );
            self.bus
                .publish(WatchtowerEvent::SuspiciousActivity(SuspicionAlert {
                    user_id: signal.user_id,
                    community_id: signal.community_id,
                    suspicion_score: signal.score,
                    risk_factors: signal.risk_factors,
                    timestamp: Utc::now(),
                }));
        }
        Ok(profile)
    }

    pub(crate) async fn mark_trusted(
        &self,
        key: &BehaviorKey,
    ) -> Result<UserBehaviorProfile, WatchtowerError> {
        let _guard = self.behavior_locks.lock(key).await;
        let mut profile = self
            .bounded(self.storage.get_behavior_profile(key))
            .await?
            .unwrap_or_else(|| UserBehaviorProfile::new(key));
        self.scorer.mark_trusted(&mut profile);
        self.bounded(self.storage.upsert_behavior_profile(&profile))
            .await?;
        info!(user = %key, score = profile.suspicion_score, "user marked trusted");
        Ok(profile)
    }
}
