// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply templates keyed by project type and response type, with
//! placeholder substitution drawn from the injected random source.
//!
//! Placeholders: `{topic}`, `{metric}`, `{comparison}`, `{community}`.

use watchtower_core::RandomSource;
use watchtower_core::types::ProjectType;

use crate::context::ConversationContext;
use crate::knowledge::KnowledgeEntry;
use crate::routing::ResponseType;

const GENERIC_TOPICS: &[&str] = &["the roadmap", "recent updates", "the community"];
const GENERIC_METRICS: &[&str] = &["activity", "engagement", "growth"];
const GENERIC_COMPARISONS: &[&str] = &["other projects", "similar communities"];

pub fn templates_for(project_type: ProjectType, response_type: ResponseType) -> &'static [&'static str] {
    use ProjectType as P;
    use ResponseType as R;
    match (project_type, response_type) {
        (P::Defi, R::Technical) => &[
            "The {topic} side is worth reading up on, the docs explain how {metric} is calculated.",
            "Compared to {comparison}, the approach to {topic} here is a bit different. Check the audit notes.",
        ],
        (P::Defi, R::Trading) => &[
            "Keep an eye on {metric} rather than just price.",
            "Price moves aside, {metric} tells you more about the protocol's health.",
        ],
        (P::Nft, R::Trading) => &[
            "Floor moves come and go, {metric} is the one to watch.",
            "Holding through the noise, {topic} is what matters long term.",
        ],
        (P::Nft, R::Community) => &[
            "The {community} community is the best part, can't wait for {topic}!",
        ],
        (P::Gaming, R::Community) => &[
            "See you at {topic}! The {community} crew is growing fast.",
        ],
        (P::Meme, R::Greeting) => &["gm gm, {community} never sleeps", "gm fren, wagmi"],
        (P::Meme, R::General) => &["{topic} are the real utility", "vibes check: {metric} looking spicy"],
        (P::Infrastructure, R::Technical) => &[
            "For {topic}, the developer docs have a section on it.",
            "That is covered in the latest release notes, mostly around {topic}.",
        ],
        (_, R::Greeting) => &[
            "gm! Welcome to {community}.",
            "Hey there! Lots of talk about {topic} today.",
        ],
        (_, R::Technical) => &[
            "Good question on {topic}, the docs go deeper on it.",
            "On the technical side, {topic} is probably the place to start.",
        ],
        (_, R::Trading) => &[
            "Not financial advice, but {metric} is worth watching.",
            "Always DYOR, {metric} says more than the chart.",
        ],
        (_, R::Community) => &[
            "The {community} community has been great lately!",
            "Good to see everyone here, lots happening around {topic}.",
        ],
        (_, R::General) => &[
            "Interesting, people have been discussing {topic} a lot.",
            "Thanks for sharing! How do you see {topic} playing out?",
        ],
    }
}

fn pick<'a>(pool: &[&'a str], rng: &dyn RandomSource) -> &'a str {
    pool[rng.pick_index(pool.len())]
}

/// Fills placeholders in `template`. Each placeholder is drawn once.
pub fn render(
    template: &str,
    community_name: &str,
    context: &ConversationContext,
    knowledge: Option<&KnowledgeEntry>,
    rng: &dyn RandomSource,
) -> String {
    let mut out = template.to_string();
    if out.contains("{topic}") {
        let topic = if context.topics.is_empty() {
            pick(knowledge.map_or(GENERIC_TOPICS, |k| k.topics), rng).to_string()
        } else {
            context.topics[rng.pick_index(context.topics.len())].clone()
        };
        out = out.replace("{topic}", &topic);
    }
    if out.contains("{metric}") {
        let metric = pick(knowledge.map_or(GENERIC_METRICS, |k| k.metrics), rng);
        out = out.replace("{metric}", metric);
    }
    if out.contains("{comparison}") {
        let comparison = pick(knowledge.map_or(GENERIC_COMPARISONS, |k| k.comparisons), rng);
        out = out.replace("{comparison}", comparison);
    }
    out.replace("{community}", community_name)
}

/// Uniformly picks and renders a template for the pair.
pub fn compose(
    project_type: ProjectType,
    response_type: ResponseType,
    community_name: &str,
    context: &ConversationContext,
    knowledge: Option<&KnowledgeEntry>,
    rng: &dyn RandomSource,
) -> String {
    let template = pick(templates_for(project_type, response_type), rng);
    render(template, community_name, context, knowledge, rng)
}
