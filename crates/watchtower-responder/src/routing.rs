// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response-type routing: first match wins in the order greeting,
//! technical, trading, community, general.

use serde::Serialize;
use strum::Display;
use watchtower_analyzer::AnalysisResult;
use watchtower_analyzer::tokenize::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseType {
    Greeting,
    Technical,
    Trading,
    Community,
    General,
}

const GREETINGS: &[&str] = &[
    "gm", "gn", "hello", "hi", "hey", "heya", "yo", "sup", "howdy", "morning", "evening",
];

const COMMUNITY_WORDS: &[&str] = &[
    "community", "event", "events", "ama", "giveaway", "contest", "team", "mods", "moderator",
    "discord", "join", "joined", "welcome", "frens", "members", "meetup",
];

pub fn route(content: &str, analysis: &AnalysisResult) -> ResponseType {
    let tokens = tokenize(content);
    let has = |list: &[&str]| tokens.iter().any(|t| list.contains(&t.as_str()));

    if has(GREETINGS) {
        ResponseType::Greeting
    } else if analysis.domain.is_technical() {
        ResponseType::Technical
    } else if !analysis.domain.trading_signals.is_empty() || analysis.domain.price_discussion {
        ResponseType::Trading
    } else if has(COMMUNITY_WORDS) {
        ResponseType::Community
    } else {
        ResponseType::General
    }
}
