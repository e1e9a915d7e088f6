use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// The analysis schema promises exactly this many reply options; anything
/// extra the model volunteers is dropped.
pub const SUGGESTED_REPLY_COUNT: usize = 3;

const ANALYSIS_INSTRUCTION: &str = "You are a dating-conversation analyst. Analyze the chat \
screenshot and respond with a single JSON object with keys: confidenceScore (integer 0-100), \
subtext (what the other person is really signaling), feedback (blunt advice on the user's last \
message), suggestedReplies (exactly 3 reply options). No prose outside the JSON.";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

/// Result of a screenshot analysis, as the model is instructed to shape it.
/// The reply count is prompt-enforced; `normalize` trims any excess.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAnalysis {
    pub confidence_score: i32,
    pub subtext: String,
    pub feedback: String,
    pub suggested_replies: Vec<String>,
}

impl MessageAnalysis {
    pub fn normalize(mut self) -> Self {
        self.suggested_replies.truncate(SUGGESTED_REPLY_COUNT);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoachingGoal {
    Flirty,
    Direct,
    Funny,
    Mysterious,
    Intellectual,
}

impl CoachingGoal {
    fn prompt_hint(self) -> &'static str {
        match self {
            CoachingGoal::Flirty => "flirty and playful",
            CoachingGoal::Direct => "direct and confident",
            CoachingGoal::Funny => "funny and light",
            CoachingGoal::Mysterious => "intriguing and a little mysterious",
            CoachingGoal::Intellectual => "thoughtful and intellectual",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI gateway not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("blocked by safety filters")]
    SafetyBlocked,
    #[error("empty response")]
    EmptyResponse,
}

// ---- Gemini generateContent wire types ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData", rename_all = "camelCase")]
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn safety_blocked(&self) -> bool {
        if self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
            .is_some()
        {
            return true;
        }
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .is_some_and(|reason| reason.eq_ignore_ascii_case("SAFETY"))
    }
}

/// Client for the hosted multimodal LLM. One attempt per call: a failed
/// request surfaces to the user, who retries manually.
#[derive(Clone)]
pub struct AiGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl AiGateway {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.ai_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config: GatewayConfig {
                api_key: config.ai_api_key.clone(),
                model: config.ai_model.clone(),
                api_endpoint: config.ai_api_endpoint.clone(),
                timeout: config.ai_timeout,
            },
            client,
        }
    }

    pub fn is_available(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// Analyzes a chat screenshot (raw base64 image payload) against the
    /// fixed analysis schema.
    pub async fn analyze_image(&self, image_base64: &str) -> Result<MessageAnalysis, GatewayError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        mime_type: "image/png".to_string(),
                        data: image_base64.to_string(),
                    },
                    Part::Text(ANALYSIS_INSTRUCTION.to_string()),
                ],
            }],
        };

        let text = self.generate(&request).await?;
        let analysis: MessageAnalysis = serde_json::from_str(strip_code_fence(&text))?;
        Ok(analysis.normalize())
    }

    /// Free-form coaching for a drafted message, returned as markdown.
    pub async fn coaching_advice(
        &self,
        text: &str,
        goal: CoachingGoal,
        context: Option<&str>,
    ) -> Result<String, GatewayError> {
        let mut prompt = format!(
            "You are a dating coach. Rewrite and improve this message so it reads {}: {text}",
            goal.prompt_hint()
        );
        if let Some(context) = context {
            prompt.push_str(&format!("\nConversation context: {context}"));
        }
        prompt.push_str("\nAnswer in markdown with a short explanation and the rewritten message.");

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::Text(prompt)],
            }],
        };

        self.generate(&request).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, GatewayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(GatewayError::NotConfigured("AI_API_KEY"))?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_endpoint.trim_end_matches('/'),
            self.config.model
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: GenerateResponse = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %String::from_utf8_lossy(&bytes),
                    "failed to parse gateway response"
                );
                return Err(GatewayError::Json(e));
            }
        };

        if parsed.safety_blocked() {
            return Err(GatewayError::SafetyBlocked);
        }

        parsed.first_text().ok_or(GatewayError::EmptyResponse)
    }
}

/// Models wrap JSON answers in ``` fences often enough to be worth stripping.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_safety_block_detected_from_prompt_feedback() {
        let raw = r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.safety_blocked());
    }

    #[test]
    fn test_safety_block_detected_from_finish_reason() {
        let raw = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.safety_blocked());
        assert!(parsed.first_text().is_none());
    }

    #[test]
    fn test_first_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"hel"},{"text":"lo"}]},"finishReason":"STOP"}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(!parsed.safety_blocked());
        assert_eq!(parsed.first_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_normalize_trims_extra_replies() {
        let raw = r#"{"confidenceScore":50,"subtext":"s","feedback":"f",
            "suggestedReplies":["a","b","c","d","e"]}"#;
        let analysis: MessageAnalysis = serde_json::from_str(raw).unwrap();
        let analysis = analysis.normalize();
        assert_eq!(analysis.suggested_replies, vec!["a", "b", "c"]);

        // three or fewer pass through untouched
        let raw = r#"{"confidenceScore":50,"subtext":"s","feedback":"f",
            "suggestedReplies":["a","b"]}"#;
        let analysis: MessageAnalysis = serde_json::from_str::<MessageAnalysis>(raw)
            .unwrap()
            .normalize();
        assert_eq!(analysis.suggested_replies.len(), 2);
    }

    #[test]
    fn test_analysis_schema_round_trips_camel_case() {
        let raw = r#"{"confidenceScore":72,"subtext":"interested but testing you",
            "feedback":"too eager","suggestedReplies":["a","b","c"]}"#;
        let analysis: MessageAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(analysis.confidence_score, 72);
        assert_eq!(analysis.suggested_replies.len(), 3);
    }
}
