//! Album recommendations and review sentiment via an OpenAI chat model

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::validation::{Validate, ValidationErrors, validate_required};

const RECOMMENDATION_PROMPT: &str = "You are a music recommendation expert. Based on the user's \
    liked albums and their reviews, suggest similar albums they might enjoy. Provide \
    recommendations and a brief explanation of why they might like each one. Return in JSON \
    format with 'recommendations' array and 'explanation' string.";

const SENTIMENT_PROMPT: &str = "Analyze the sentiment of this music review and provide a rating \
    from 1 to 5 stars and confidence score between 0 and 1. Return in JSON format with 'rating' \
    and 'confidence' keys.";

/// Request body for `POST /api/recommendations`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub liked_albums: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<String>,
}

impl Validate for RecommendationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.liked_albums.is_empty() {
            errors.add("likedAlbums", "At least one liked album is required");
        } else if self.liked_albums.iter().any(|album| album.trim().is_empty()) {
            errors.add("likedAlbums", "Album names cannot be empty");
        }
        errors.into_result()
    }
}

/// Request body for `POST /api/analyze-review`
#[derive(Debug, Deserialize)]
pub struct AnalyzeReviewRequest {
    pub review: String,
}

impl Validate for AnalyzeReviewRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("review", validate_required(&self.review, "Review"));
        errors.into_result()
    }
}

/// Model-estimated star rating of a review
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    /// Whole stars, 1 to 5
    pub rating: u8,
    /// 0 to 1
    pub confidence: f64,
}

impl Sentiment {
    /// Round and clamp raw model output
    pub fn from_raw(rating: f64, confidence: f64) -> Result<Self> {
        if !rating.is_finite() || !confidence.is_finite() {
            return Err(anyhow!(
                "Sentiment values are not numbers: rating={}, confidence={}",
                rating,
                confidence
            ));
        }

        Ok(Self {
            rating: rating.round().clamp(1.0, 5.0) as u8,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

/// External model that suggests albums and scores reviews
#[async_trait]
pub trait RecommendationEngine: Send + Sync + 'static {
    /// Structured suggestions (`recommendations` + `explanation`) as returned by the model
    async fn recommend(&self, liked_albums: &[String], reviews: &[String]) -> Result<Value>;

    async fn analyze_sentiment(&self, review: &str) -> Result<Sentiment>;
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// OpenAI chat completions client
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSentiment {
    rating: f64,
    confidence: f64,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Run one chat completion in JSON mode and parse the reply
    async fn complete_json(&self, system_prompt: &str, user_prompt: String) -> Result<Value> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "response_format": {"type": "json_object"},
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("OpenAI request failed: {}", response.status()));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .context("Invalid OpenAI response body")?;

        parse_completion(completion)
    }
}

fn parse_completion(completion: ChatCompletion) -> Result<Value> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("OpenAI response has no content"))?;

    serde_json::from_str(&content).context("OpenAI content is not JSON")
}

fn recommendation_prompt(liked_albums: &[String], reviews: &[String]) -> String {
    format!(
        "Liked albums: {}\nReviews: {}",
        liked_albums.join(", "),
        reviews.join("\n")
    )
}

#[async_trait]
impl RecommendationEngine for OpenAiClient {
    async fn recommend(&self, liked_albums: &[String], reviews: &[String]) -> Result<Value> {
        info!(
            "Requesting recommendations for {} liked albums",
            liked_albums.len()
        );
        self.complete_json(
            RECOMMENDATION_PROMPT,
            recommendation_prompt(liked_albums, reviews),
        )
        .await
        .context("Failed to generate recommendations")
    }

    async fn analyze_sentiment(&self, review: &str) -> Result<Sentiment> {
        let value = self
            .complete_json(SENTIMENT_PROMPT, review.to_string())
            .await
            .context("Failed to analyze sentiment")?;

        let raw: RawSentiment =
            serde_json::from_value(value).context("Sentiment reply is missing numeric fields")?;
        Sentiment::from_raw(raw.rating, raw.confidence)
    }
}
