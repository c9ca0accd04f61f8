use scene_core::generation::{GenerationError, ObjectGenerator};
use scene_core::scoring::{ComparatorError, ImageComparator, MAX_SCORE};
use serde_json::{json, Value};
use shared::{ImagePayload, ValidationError, ViewName, ViewScore};
use thiserror::Error;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const GENERATOR_PROMPT: &str = r##"
You are a building designer. You turn requests into a simple building made of box-like parts.

Part types: floor, wall, roof, door, window, chimney, triangleWall, pillar, stairs, fence,
decoration.

Each part:
{ "type": <part type>, "position": [x, y, z], "rotation": [x, y, z], "size": [width, height, depth], "color": "#rrggbb" }

Rules:
- Units are meters, Y is up, the floor sits at y = 0 and is centered on the origin.
- Only rotation[1] (yaw, radians) is used. Keep the other rotation components 0.
- All sizes are positive.
- If the conversation already contains a building, REVISE it: start from the latest building,
  keep every part the request does not concern exactly as it was, and change only what is needed.
- When a new part conflicts with an existing one (e.g. a gable roof instead of a flat roof),
  remove the old part and add the new one. Never merge them.
- If the user asks to reset or start over, return exactly one floor:
  { "type": "floor", "position": [0, 0, 0], "rotation": [0, 0, 0], "size": [4, 0.2, 4], "color": "#8b7355" }

Respond with JSON only: { "object": { "parts": [ ... ] } }
"##;

const COMPARATOR_PROMPT: &str = r#"
You compare two renders of a building taken from the same camera direction.
The first image is the user's building, the second is the reference.
Judge how similar the shapes, proportions and colors are.

Respond with JSON only: { "score": <integer 0-100>, "comment": <one short sentence> }
"#;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("ANTHROPIC_API_KEY not set")]
    MissingKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response has no text content")]
    EmptyResponse,
}

/// Thin client for the messages API, shared by the generator and comparator
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl AnthropicClient {
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one user message and return the first text block of the reply.
    async fn complete(
        &self,
        system: &str,
        content: Value,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let api_key = self.api_key.as_ref().ok_or(AiError::MissingKey)?;

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&json!({
                "model": self.model,
                "max_tokens": max_tokens,
                "system": system,
                "messages": [{ "role": "user", "content": content }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        body["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find_map(|block| block["text"].as_str()))
            .map(str::to_string)
            .ok_or(AiError::EmptyResponse)
    }
}

/// Pull a JSON object out of model text, tolerating code fences and prose.
fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

pub struct AnthropicGenerator {
    client: AnthropicClient,
}

impl AnthropicGenerator {
    pub fn new(client: AnthropicClient) -> Self {
        Self { client }
    }
}

impl ObjectGenerator for AnthropicGenerator {
    async fn generate(
        &self,
        user_input: &str,
        history_json: &str,
    ) -> Result<Value, GenerationError> {
        let message = format!("Conversation so far:\n{history_json}\n\nUser request: {user_input}");
        let text = self
            .client
            .complete(GENERATOR_PROMPT, json!(message), 4096)
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;

        let parsed = extract_json(&text)
            .ok_or_else(|| ValidationError::Malformed("response contained no JSON object".into()))?;
        // Accept both { "object": {...} } and a bare object
        Ok(match parsed.get("object") {
            Some(object) => object.clone(),
            None => parsed,
        })
    }
}

fn image_block(image: &ImagePayload) -> Value {
    json!({
        "type": "image",
        "source": {
            "type": "base64",
            "media_type": image.media_type,
            "data": image.data,
        }
    })
}

fn parse_view_score(text: &str) -> Result<ViewScore, ComparatorError> {
    let parsed =
        extract_json(text).ok_or_else(|| ComparatorError::InvalidResponse(text.to_string()))?;
    let score = parsed["score"]
        .as_f64()
        .filter(|s| s.is_finite())
        .ok_or_else(|| ComparatorError::InvalidResponse("missing numeric score".into()))?;
    Ok(ViewScore {
        score: score.round().clamp(0.0, f64::from(MAX_SCORE)) as u8,
        comment: parsed["comment"].as_str().unwrap_or_default().to_string(),
    })
}

pub struct AnthropicComparator {
    client: AnthropicClient,
}

impl AnthropicComparator {
    pub fn new(client: AnthropicClient) -> Self {
        Self { client }
    }
}

impl ImageComparator for AnthropicComparator {
    async fn compare(
        &self,
        view: ViewName,
        user: &ImagePayload,
        reference: &ImagePayload,
    ) -> Result<ViewScore, ComparatorError> {
        let content = json!([
            { "type": "text", "text": format!("View: {}", view.as_str()) },
            image_block(user),
            image_block(reference),
        ]);
        let text = self
            .client
            .complete(COMPARATOR_PROMPT, content, 512)
            .await
            .map_err(|e| match e {
                AiError::MissingKey => ComparatorError::Unavailable(e.to_string()),
                other => ComparatorError::Request(other.to_string()),
            })?;
        parse_view_score(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(json!({"a": 1})));
        let fenced = "Here you go:\n```json\n{\"object\": {\"parts\": []}}\n```";
        assert_eq!(extract_json(fenced), Some(json!({"object": {"parts": []}})));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_parse_view_score() {
        let score = parse_view_score(r#"{"score": 87.6, "comment": "Close match"}"#).unwrap();
        assert_eq!(score.score, 88);
        assert_eq!(score.comment, "Close match");

        assert_eq!(parse_view_score(r#"{"score": 140}"#).unwrap().score, 100);
        assert_eq!(parse_view_score(r#"{"score": -3}"#).unwrap().score, 0);
        assert!(parse_view_score(r#"{"comment": "no score"}"#).is_err());
        assert!(parse_view_score("I cannot compare these").is_err());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = AnthropicClient {
            http: reqwest::Client::new(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        };

        let generator = AnthropicGenerator::new(client.clone());
        assert!(matches!(
            generator.generate("a house", "[]").await,
            Err(GenerationError::Failed(_))
        ));

        let comparator = AnthropicComparator::new(client);
        let image = ImagePayload {
            media_type: "image/png".into(),
            data: "AAAA".into(),
        };
        assert!(matches!(
            comparator.compare(ViewName::Top, &image, &image).await,
            Err(ComparatorError::Unavailable(_))
        ));
    }
}
