// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response style selection and text post-processing.
//!
//! Rules run in a fixed order: project type, then community mood, then the
//! message's own vocabulary. A later rule overwrites any field an earlier
//! rule set.

use serde::Serialize;
use strum::Display;
use watchtower_analyzer::AnalysisResult;
use watchtower_core::types::ProjectType;

use crate::context::Mood;

/// Appended when enthusiasm is high.
pub const ENTHUSIASM_MARKER: &str = " 🚀";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Formality {
    VeryCasual,
    Casual,
    Formal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Technicality {
    Basic,
    Intermediate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Enthusiasm {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Helpfulness {
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponseStyle {
    pub formality: Formality,
    pub technicality: Technicality,
    pub enthusiasm: Enthusiasm,
    pub helpfulness: Helpfulness,
}

impl Default for ResponseStyle {
    fn default() -> Self {
        Self {
            formality: Formality::Casual,
            technicality: Technicality::Intermediate,
            enthusiasm: Enthusiasm::Moderate,
            helpfulness: Helpfulness::High,
        }
    }
}

/// Technical level above which a message counts as technical vocabulary.
const TECHNICAL_LEVEL_CUTOFF: f64 = 3.0;

pub fn select_style(project_type: ProjectType, mood: Mood, analysis: &AnalysisResult) -> ResponseStyle {
    let mut style = ResponseStyle::default();

    match project_type {
        ProjectType::Defi | ProjectType::Infrastructure => {
            style.technicality = Technicality::High;
        }
        ProjectType::Nft | ProjectType::Gaming => {
            style.enthusiasm = Enthusiasm::High;
        }
        ProjectType::Meme => {
            style.formality = Formality::VeryCasual;
            style.technicality = Technicality::Basic;
            style.enthusiasm = Enthusiasm::High;
        }
        ProjectType::Unknown => {}
    }

    match mood {
        Mood::Bullish => style.enthusiasm = Enthusiasm::High,
        Mood::Cautious | Mood::Bearish => style.enthusiasm = Enthusiasm::Low,
        Mood::Optimistic | Mood::Neutral => {}
    }

    if analysis.technical_level > TECHNICAL_LEVEL_CUTOFF || analysis.domain.is_technical() {
        style.technicality = Technicality::High;
    }
    if analysis.urgency > 0.0 {
        style.formality = Formality::Formal;
        style.enthusiasm = Enthusiasm::Low;
        style.helpfulness = Helpfulness::High;
    }

    style
}

/// Applies formality and enthusiasm transforms to generated text.
pub fn apply_style(text: &str, style: &ResponseStyle) -> String {
    let mut out = text.trim().to_string();
    if style.formality == Formality::VeryCasual {
        out = out
            .to_lowercase()
            .trim_end_matches(['.', '!'])
            .replace(". ", " ")
            .replace("! ", " ");
    }
    match style.enthusiasm {
        Enthusiasm::Low => out = out.replace('!', "."),
        Enthusiasm::High if !out.ends_with(ENTHUSIASM_MARKER) => out.push_str(ENTHUSIASM_MARKER),
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_analyzer::Analyzer;

    #[test]
    fn baseline_for_unknown_neutral() {
        let a = Analyzer::new().analyze("nice day");
        assert_eq!(select_style(ProjectType::Unknown, Mood::Neutral, &a), ResponseStyle::default());
    }

    #[test]
    fn later_rules_override_earlier_ones() {
        let calm = Analyzer::new().analyze("what a week");
        // Type sets high enthusiasm, bearish mood lowers it.
        let s = select_style(ProjectType::Gaming, Mood::Bearish, &calm);
        assert_eq!(s.enthusiasm, Enthusiasm::Low);

        // Meme sets basic technicality, technical vocabulary raises it.
        let tech = Analyzer::new().analyze("the rpc node and validator consensus latency");
        let s = select_style(ProjectType::Meme, Mood::Neutral, &tech);
        assert_eq!(s.technicality, Technicality::High);
        assert_eq!(s.formality, Formality::VeryCasual);

        let urgent = Analyzer::new().analyze("help my wallet is stuck");
        let s = select_style(ProjectType::Meme, Mood::Bullish, &urgent);
        assert_eq!(s.formality, Formality::Formal);
        assert_eq!(s.enthusiasm, Enthusiasm::Low);
    }

    #[test]
    fn post_processing() {
        let very_casual = ResponseStyle {
            formality: Formality::VeryCasual,
            enthusiasm: Enthusiasm::Moderate,
            ..ResponseStyle::default()
        };
        assert_eq!(apply_style("Great News. Vaults Are Live!", &very_casual), "great news vaults are live");

        let low = ResponseStyle {
            enthusiasm: Enthusiasm::Low,
            ..ResponseStyle::default()
        };
        assert_eq!(apply_style("Welcome aboard!", &low), "Welcome aboard.");

        let high = ResponseStyle {
            enthusiasm: Enthusiasm::High,
            ..ResponseStyle::default()
        };
        assert_eq!(apply_style("Welcome aboard", &high), format!("Welcome aboard{ENTHUSIASM_MARKER}"));
    }
}
