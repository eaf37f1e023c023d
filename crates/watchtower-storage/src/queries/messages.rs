// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysed message persistence.

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use watchtower_core::WatchtowerError;
use watchtower_core::types::MessageRecord;

use super::{from_json, to_json};
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, community_id, channel_id, author_id, content, timestamp, \
     is_moderator, is_bot, reply_to, sentiment, topics, mentions, domain";

/// Insert a message. An existing id leaves the stored row untouched.
pub async fn insert_message(db: &Database, record: &MessageRecord) -> Result<(), WatchtowerError> {
    let r = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO messages (id, community_id, channel_id, author_id, content, \
                 timestamp, ts_ms, is_moderator, is_bot, reply_to, sentiment, topics, mentions, domain)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    r.id,
                    r.community_id,
                    r.channel_id,
                    r.author_id,
                    r.content,
                    r.timestamp.to_rfc3339(),
                    r.timestamp.timestamp_millis(),
                    r.is_moderator,
                    r.is_bot,
                    r.reply_to,
                    r.sentiment,
                    to_json(&r.topics)?,
                    to_json(&r.mentions)?,
                    to_json(&r.domain)?,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_record(row: &Row<'_>) -> Result<MessageRecord, rusqlite::Error> {
    let timestamp: String = row.get(5)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let topics: String = row.get(10)?;
    let mentions: String = row.get(11)?;
    let domain: String = row.get(12)?;
    Ok(MessageRecord {
        id: row.get(0)?,
        community_id: row.get(1)?,
        channel_id: row.get(2)?,
        author_id: row.get(3)?,
        content: row.get(4)?,
        timestamp,
        is_moderator: row.get(6)?,
        is_bot: row.get(7)?,
        reply_to: row.get(8)?,
        sentiment: row.get(9)?,
        topics: from_json(10, &topics)?,
        mentions: from_json(11, &mentions)?,
        domain: from_json(12, &domain)?,
    })
}

/// Runs a newest-first query and returns the rows oldest first.
async fn newest(
    db: &Database,
    filter: &'static str,
    args: Vec<String>,
    limit: usize,
) -> Result<Vec<MessageRecord>, WatchtowerError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM messages WHERE {filter} \
                 ORDER BY ts_ms DESC, rowid DESC LIMIT ?{}",
                args.len() + 1
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut bind: Vec<&dyn rusqlite::ToSql> =
                args.iter().map(|a| a as &dyn rusqlite::ToSql).collect();
            bind.push(&limit);
            let rows = stmt.query_map(bind.as_slice(), row_to_record)?;
            let mut records = rows.collect::<Result<Vec<_>, _>>()?;
            records.reverse();
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn user_messages(
    db: &Database,
    community_id: &str,
    author_id: &str,
    limit: usize,
) -> Result<Vec<MessageRecord>, WatchtowerError> {
    newest(
        db,
        "community_id = ?1 AND author_id = ?2",
        vec![community_id.to_string(), author_id.to_string()],
        limit,
    )
    .await
}

pub async fn channel_messages(
    db: &Database,
    community_id: &str,
    channel_id: &str,
    limit: usize,
) -> Result<Vec<MessageRecord>, WatchtowerError> {
    newest(
        db,
        "community_id = ?1 AND channel_id = ?2",
        vec![community_id.to_string(), channel_id.to_string()],
        limit,
    )
    .await
}

pub async fn community_messages(
    db: &Database,
    community_id: &str,
    limit: usize,
) -> Result<Vec<MessageRecord>, WatchtowerError> {
    newest(db, "community_id = ?1", vec![community_id.to_string()], limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;
    use watchtower_core::types::{DomainAnalysis, Mention, MentionKind};

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap(), true)
            .await
            .unwrap();
        (db, dir)
    }

    fn record(id: &str, channel: &str, author: &str, offset: i64) -> MessageRecord {
        let base = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        MessageRecord {
            id: id.into(),
            community_id: "c1".into(),
            channel_id: channel.into(),
            author_id: author.into(),
            content: format!("message {id}"),
            timestamp: base + Duration::seconds(offset),
            is_moderator: false,
            is_bot: false,
            reply_to: None,
            sentiment: 1.5,
            topics: vec!["staking".into()],
            mentions: vec![Mention { kind: MentionKind::User, id: "42".into() }],
            domain: DomainAnalysis {
                crypto_mentions: vec!["staking".into(), "eth".into()],
                ..DomainAnalysis::default()
            },
        }
    }

    #[tokio::test]
    async fn stored_record_reads_back_intact() {
        let (db, _dir) = setup().await;
        let rec = record("m1", "general", "alice", 0);
        insert_message(&db, &rec).await.unwrap();
        let back = community_messages(&db, "c1", 10).await.unwrap();
        assert_eq!(back, vec![rec]);
    }

    #[tokio::test]
    async fn duplicate_insert_is_ignored() {
        let (db, _dir) = setup().await;
        let rec = record("m1", "general", "alice", 0);
        insert_message(&db, &rec).await.unwrap();
        let mut other = rec.clone();
        other.content = "rewritten".into();
        insert_message(&db, &other).await.unwrap();
        let back = community_messages(&db, "c1", 10).await.unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].content, "message m1");
    }

    #[tokio::test]
    async fn queries_return_newest_window_oldest_first() {
        let (db, _dir) = setup().await;
        for (id, channel, author, offset) in [
            ("a", "general", "alice", 30),
            ("b", "general", "bob", 10),
            ("c", "trading", "alice", 20),
            ("d", "general", "alice", 40),
        ] {
            insert_message(&db, &record(id, channel, author, offset)).await.unwrap();
        }
        let ids = |v: Vec<MessageRecord>| v.into_iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(ids(user_messages(&db, "c1", "alice", 2).await.unwrap()), vec!["a", "d"]);
        assert_eq!(
            ids(channel_messages(&db, "c1", "general", 10).await.unwrap()),
            vec!["b", "a", "d"]
        );
        assert_eq!(ids(community_messages(&db, "c1", 3).await.unwrap()), vec!["c", "a", "d"]);
        assert!(community_messages(&db, "other", 3).await.unwrap().is_empty());
    }
}
