// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Community and behaviour profile documents.
//!
//! Profiles are stored as JSON documents alongside a few indexed columns.
//! Upserts replace the whole document.

use rusqlite::{OptionalExtension, params};
use watchtower_core::WatchtowerError;
use watchtower_core::types::{BehaviorKey, CommunityProfile, UserBehaviorProfile};

use super::{from_json, to_json};
use crate::database::{Database, map_tr_err};

pub async fn get_community_profile(
    db: &Database,
    community_id: &str,
) -> Result<Option<CommunityProfile>, WatchtowerError> {
    let community_id = community_id.to_string();
    db.connection()
        .call(move |conn| {
            let doc: Option<String> = conn
                .query_row(
                    "SELECT document FROM community_profiles WHERE community_id = ?1",
                    params![community_id],
                    |row| row.get(0),
                )
                .optional()?;
            doc.map(|d| from_json(0, &d)).transpose()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert_community_profile(
    db: &Database,
    profile: &CommunityProfile,
) -> Result<(), WatchtowerError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO community_profiles (community_id, project_type, document, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(community_id) DO UPDATE SET
                     project_type = excluded.project_type,
                     document = excluded.document,
                     updated_at = excluded.updated_at",
                params![
                    profile.community_id,
                    profile.project_type.to_string(),
                    to_json(&profile)?,
                    profile.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_behavior_profile(
    db: &Database,
    key: &BehaviorKey,
) -> Result<Option<UserBehaviorProfile>, WatchtowerError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| {
            let doc: Option<String> = conn
                .query_row(
                    "SELECT document FROM behavior_profiles WHERE user_id = ?1 AND community_id = ?2",
                    params![key.user_id, key.community_id],
                    |row| row.get(0),
                )
                .optional()?;
            doc.map(|d| from_json(0, &d)).transpose()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert_behavior_profile(
    db: &Database,
    profile: &UserBehaviorProfile,
) -> Result<(), WatchtowerError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO behavior_profiles (user_id, community_id, suspicion_score, verified, document)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id, community_id) DO UPDATE SET
                     suspicion_score = excluded.suspicion_score,
                     verified = excluded.verified,
                     document = excluded.document",
                params![
                    profile.user_id,
                    profile.community_id,
                    profile.suspicion_score,
                    profile.verified,
                    to_json(&profile)?,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
