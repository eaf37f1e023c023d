// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Community discovery trigger and profiling job.

use chrono::Utc;
use tracing::{debug, info};
use watchtower_bus::WatchtowerEvent;
use watchtower_core::WatchtowerError;
use watchtower_core::types::CommunityProfile;
use watchtower_scheduler::job::JobHandle;

use crate::Services;
use crate::jobs;

impl Services {
    /// Queues a profiling job unless one is already pending for the
    /// community. Returns `None` when deduplicated.
    pub(crate) fn request_discovery(
        &self,
        community_id: &str,
    ) -> Result<Option<JobHandle>, WatchtowerError> {
        if !self.pending().insert(community_id.to_string()) {
            debug!(community_id, "discovery already pending");
            return Ok(None);
        }
        let queued = jobs::profile_request(community_id)
            .and_then(|request| self.scheduler.enqueue(request));
        match queued {
            Ok(handle) => {
                info!(community_id, job_id = %handle.id, "community discovery queued");
                Ok(Some(handle))
            }
            Err(e) => {
                self.pending().remove(community_id);
                Err(e)
            }
        }
    }

    /// Runs one discovery attempt. The pending marker is cleared on success
    /// and when no retry will follow.
    pub(crate) async fn profile_community(
        &self,
        community_id: &str,
        last_attempt: bool,
    ) -> Result<CommunityProfile, WatchtowerError> {
        let result = self.discover(community_id).await;
        let retrying = matches!(&result, Err(e) if e.is_transient() && !last_attempt);
        if !retrying {
            self.pending().remove(community_id);
        }
        result
    }

    async fn discover(&self, community_id: &str) -> Result<CommunityProfile, WatchtowerError> {
        let metadata = self
            .bounded(self.channel.fetch_community(community_id))
            .await?;

        let _guard = self.community_locks.lock(&community_id.to_string()).await;
        let prior = self
            .bounded(self.storage.get_community_profile(community_id))
            .await?;
        let profile = self
            .profiler
            .discover(&metadata, self.channel.as_ref(), prior.as_ref(), Utc::now())
            .await;
        self.bounded(self.storage.upsert_community_profile(&profile))
            .await?;

        info!(
            community_id,
            project_type = %profile.project_type,
            roadmap = ?profile.roadmap_status,
            "community profiled"
        );
        self.bus.publish(WatchtowerEvent::CommunityProfiled {
            community_id: profile.community_id.clone(),
            project_type: profile.project_type.to_string(),
        });
        Ok(profile)
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, std::collections::HashSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.pending_discovery
            .lock()
            .unwrap_or_else(|p| p.into_inner())
    }
}
