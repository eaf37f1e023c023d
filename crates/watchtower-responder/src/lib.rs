// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context-aware auto-response engine.
//!
//! [`ContextualResponder::decide`] assembles the channel context, gates,
//! picks a response type and style, drafts a reply from templates and
//! optionally rewrites it through a [`CompletionAdapter`]. Completion
//! failures and timeouts fall back to a fixed per-type reply pool.
//!
//! Delivery is the caller's decision: [`ResponseDecision::should_deliver`]
//! applies the confidence threshold and [`ContextualResponder::delivery_delay`]
//! draws the human-like delay.

pub mod context;
pub mod gate;
pub mod knowledge;
pub mod routing;
pub mod style;
pub mod templates;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use watchtower_analyzer::AnalysisResult;
use watchtower_config::model::{CompletionConfig, ResponderConfig};
use watchtower_core::types::{CommunityProfile, CompletionRequest, MessageRecord, ProjectType};
use watchtower_core::{CompletionAdapter, RandomSource, StorageAdapter};

use crate::context::{ContextCache, ConversationContext};
use crate::gate::{GateDecision, GatePolicy, GateReason, RecentResponses};
use crate::knowledge::{fallback_replies, knowledge_for};
use crate::routing::ResponseType;
use crate::style::ResponseStyle;

/// Window length above which the context adds confidence.
const RICH_CONTEXT_MESSAGES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDecision {
    pub should_respond: bool,
    pub gate: GateReason,
    /// Present only when `should_respond`.
    pub response: Option<String>,
    pub confidence: f64,
    pub response_type: ResponseType,
    pub style: ResponseStyle,
    /// True when the reply came from the fallback pool.
    pub fallback: bool,
    confidence_threshold: f64,
}

impl ResponseDecision {
    /// Whether the caller should actually send the reply.
    pub fn should_deliver(&self) -> bool {
        self.should_respond && self.response.is_some() && self.confidence > self.confidence_threshold
    }
}

/// Confidence in a reply: 0.5 base, plus 0.2 for a known project type,
/// 0.1 for a window of more than ten messages, 0.2 for a knowledge entry.
pub fn confidence(project_type: ProjectType, window_len: usize) -> f64 {
    let mut c: f64 = 0.5;
    if project_type.is_known() {
        c += 0.2;
    }
    if window_len > RICH_CONTEXT_MESSAGES {
        c += 0.1;
    }
    if knowledge_for(project_type).is_some() {
        c += 0.2;
    }
    c.min(1.0)
}

/// Settings for the optional completion rewrite.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CompletionSettings {
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

pub struct ContextualResponder {
    storage: Arc<dyn StorageAdapter>,
    completion: Option<Arc<dyn CompletionAdapter>>,
    rng: Arc<dyn RandomSource>,
    contexts: ContextCache,
    recent: RecentResponses,
    policy: GatePolicy,
    settings: CompletionSettings,
    bot_user_id: Option<String>,
    confidence_threshold: f64,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl ContextualResponder {
    pub fn new(
        config: &ResponderConfig,
        completion_config: &CompletionConfig,
        bot_user_id: Option<String>,
        storage: Arc<dyn StorageAdapter>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            storage,
            completion: None,
            rng,
            contexts: ContextCache::new(
                config.context_window,
                Duration::from_secs(config.context_ttl_secs),
            ),
            recent: RecentResponses::new(Duration::from_secs(config.recent_response_window_secs)),
            policy: GatePolicy::from(config),
            settings: CompletionSettings {
                max_tokens: completion_config.max_tokens,
                temperature: completion_config.temperature,
                timeout: Duration::from_secs(config.completion_timeout_secs),
            },
            bot_user_id,
            confidence_threshold: config.confidence_threshold,
            min_delay_ms: config.min_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    pub fn with_completion(mut self, completion: Arc<dyn CompletionAdapter>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Feeds a freshly stored message into any cached channel context.
    pub fn observe(&self, record: &MessageRecord) {
        self.contexts.observe(record);
    }

    /// Reserves a spam-cap slot for a reply to the channel. `false` when
    /// the channel is already over the cap.
    pub fn claim_send(&self, community_id: &str, channel_id: &str) -> bool {
        self.recent
            .try_record(community_id, channel_id, self.policy.recent_limit)
    }

    /// Random delay in `[min_delay_ms, max_delay_ms]`.
    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.rng.range_inclusive(self.min_delay_ms, self.max_delay_ms))
    }

    pub fn prune(&self) {
        self.contexts.prune();
        self.recent.prune();
    }

    pub async fn decide(
        &self,
        record: &MessageRecord,
        analysis: &AnalysisResult,
        profile: Option<&CommunityProfile>,
    ) -> ResponseDecision {
        let project_type = profile.map_or(ProjectType::Unknown, |p| p.project_type);
        let context = self
            .contexts
            .get(self.storage.as_ref(), &record.community_id, &record.channel_id)
            .await;

        let recent = self.recent.count(&record.community_id, &record.channel_id);
        let GateDecision { respond, reason } = gate::should_respond(
            record,
            analysis,
            recent,
            self.bot_user_id.as_deref(),
            &self.policy,
            self.rng.as_ref(),
        );

        let response_type = routing::route(&record.content, analysis);
        let style = style::select_style(project_type, context.mood, analysis);
        let mut decision = ResponseDecision {
            should_respond: respond,
            gate: reason,
            response: None,
            confidence: confidence(project_type, context.len()),
            response_type,
            style,
            fallback: false,
            confidence_threshold: self.confidence_threshold,
        };
        if !respond {
            debug!(message_id = %record.id, reason = %reason, "not responding");
            return decision;
        }

        let name = profile.map_or("the community", |p| p.name.as_str());
        let draft = templates::compose(
            project_type,
            response_type,
            name,
            &context,
            knowledge_for(project_type),
            self.rng.as_ref(),
        );

        let text = match &self.completion {
            Some(completion) => {
                match self
                    .rewrite(completion.as_ref(), record, &context, &draft, project_type, &style)
                    .await
                {
                    Some(text) => style::apply_style(&text, &style),
                    None => {
                        decision.fallback = true;
                        self.fallback(project_type)
                    }
                }
            }
            None => style::apply_style(&draft, &style),
        };

        debug!(
            message_id = %record.id,
            response_type = %response_type,
            confidence = decision.confidence,
            fallback = decision.fallback,
            "response generated"
        );
        decision.response = Some(text);
        decision
    }

    fn fallback(&self, project_type: ProjectType) -> String {
        let pool = fallback_replies(project_type);
        pool[self.rng.pick_index(pool.len())].to_string()
    }

    /// Asks the completion capability for a reply. `None` on error, timeout
    /// or empty output.
    async fn rewrite(
        &self,
        completion: &dyn CompletionAdapter,
        record: &MessageRecord,
        context: &ConversationContext,
        draft: &str,
        project_type: ProjectType,
        style: &ResponseStyle,
    ) -> Option<String> {
        let request = CompletionRequest {
            system_prompt: Some(system_prompt(project_type, style)),
            prompt: user_prompt(record, context, draft),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };
        match tokio::time::timeout(self.settings.timeout, completion.complete(request)).await {
            Ok(Ok(resp)) if !resp.content.trim().is_empty() => Some(resp.content),
            Ok(Ok(_)) => {
                warn!(message_id = %record.id, "completion returned empty text, using fallback");
                None
            }
            Ok(Err(e)) => {
                warn!(message_id = %record.id, error = %e, "completion failed, using fallback");
                None
            }
            Err(_) => {
                warn!(
                    message_id = %record.id,
                    timeout = ?self.settings.timeout,
                    "completion timed out, using fallback"
                );
                None
            }
        }
    }
}

fn system_prompt(project_type: ProjectType, style: &ResponseStyle) -> String {
    format!(
        "You are a regular member of a {project_type} crypto community chat. \
         Reply in one or two short sentences. Formality: {}. Technical depth: {}. \
         Enthusiasm: {}. Never give financial advice or mention being a bot.",
        style.formality, style.technicality, style.enthusiasm
    )
}

fn user_prompt(record: &MessageRecord, context: &ConversationContext, draft: &str) -> String {
    let mut prompt = String::from("Recent conversation:\n");
    for m in context.messages.iter().rev().take(5).rev() {
        prompt.push_str(&format!("- {}: {}\n", m.author_id, m.content));
    }
    if !context.topics.is_empty() {
        prompt.push_str(&format!("Current topics: {}\n", context.topics.join(", ")));
    }
    prompt.push_str(&format!("Mood: {}\n", context.mood));
    prompt.push_str(&format!("Reply to {}: {}\n", record.author_id, record.content));
    prompt.push_str(&format!("Draft reply to improve: {draft}"));
    prompt
}
