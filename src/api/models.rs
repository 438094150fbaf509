//! Wire types for the backend REST contract.
//!
//! Projections are read-only: they are decoded fresh from every response and
//! never merged client-side. Unknown enum values decode as `Other` so a newer
//! backend does not break listing.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::session::Filters;

// ============================================================================
// Enumerations
// ============================================================================

/// Where an article was crawled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSource {
    Arxiv,
    OpenaiBlog,
    GoogleAiBlog,
    MetaAiBlog,
    Techcrunch,
    TheVerge,
    Jiqizhixin,
    #[serde(other)]
    Other,
}

impl ArticleSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Arxiv => "arXiv",
            Self::OpenaiBlog => "OpenAI",
            Self::GoogleAiBlog => "Google AI",
            Self::MetaAiBlog => "Meta AI",
            Self::Techcrunch => "TechCrunch",
            Self::TheVerge => "The Verge",
            Self::Jiqizhixin => "Jiqizhixin",
            Self::Other => "Other",
        }
    }
}

/// Topic assigned to an article by the backend classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleCategory {
    Llm,
    Multimodal,
    Agent,
    Cv,
    Nlp,
    Rl,
    Robotics,
    AiSafety,
    Business,
    #[serde(other)]
    Other,
}

impl ArticleCategory {
    /// Every category a user can follow, in display order.
    pub const SELECTABLE: [ArticleCategory; 9] = [
        Self::Llm,
        Self::Multimodal,
        Self::Agent,
        Self::Cv,
        Self::Nlp,
        Self::Rl,
        Self::Robotics,
        Self::AiSafety,
        Self::Business,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Multimodal => "multimodal",
            Self::Agent => "agent",
            Self::Cv => "cv",
            Self::Nlp => "nlp",
            Self::Rl => "rl",
            Self::Robotics => "robotics",
            Self::AiSafety => "ai_safety",
            Self::Business => "business",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Llm => "LLM",
            Self::Multimodal => "Multimodal",
            Self::Agent => "Agent",
            Self::Cv => "Computer Vision",
            Self::Nlp => "NLP",
            Self::Rl => "Reinforcement Learning",
            Self::Robotics => "Robotics",
            Self::AiSafety => "AI Safety",
            Self::Business => "Business",
            Self::Other => "Other",
        }
    }
}

/// How often the backend emails digests to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailFrequency {
    Realtime,
    #[default]
    Daily,
    Weekly,
}

impl EmailFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for EmailFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realtime" => Ok(Self::Realtime),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(format!(
                "unknown email frequency '{other}' (expected realtime, daily or weekly)"
            )),
        }
    }
}

/// Display tier of a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 60.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

// ============================================================================
// Articles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub title_zh: Option<String>,
    pub url: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub summary_zh: Option<String>,
    pub source: ArticleSource,
    pub category: ArticleCategory,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub quality_score: f64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub crawled_at: DateTime<Utc>,
}

impl Article {
    /// Translated title when present, original otherwise.
    pub fn display_title(&self) -> &str {
        non_empty(self.title_zh.as_deref()).unwrap_or(&self.title)
    }

    /// The original title, only when it differs from the displayed one.
    pub fn original_title(&self) -> Option<&str> {
        let shown = self.display_title();
        (shown != self.title).then_some(self.title.as_str())
    }

    pub fn display_summary(&self) -> Option<&str> {
        non_empty(self.summary_zh.as_deref()).or_else(|| non_empty(self.summary.as_deref()))
    }

    /// Publication time, falling back to when the backend crawled it.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.crawled_at)
    }

    pub fn tier(&self) -> QualityTier {
        QualityTier::of(self.quality_score)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// One page of the stable-ordered article collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleListResponse {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<Article>,
}

/// `{value, label}` option for the category/source pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Query parameters for `GET /articles`.
///
/// Unconstrained values (`None`, empty strings, zero) are omitted from the
/// request entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub min_score: Option<u32>,
    pub search: Option<String>,
}

impl ArticleQuery {
    pub fn from_filters(filters: &Filters, page: u32, page_size: u32) -> Self {
        fn text(s: &str) -> Option<String> {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Self {
            page: Some(page),
            page_size: Some(page_size),
            category: text(&filters.category),
            source: text(&filters.source),
            min_score: (filters.min_score > 0).then_some(filters.min_score),
            search: text(&filters.search),
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page.filter(|p| *p > 0) {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size.filter(|s| *s > 0) {
            pairs.push(("page_size", size.to_string()));
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("source", source.to_string()));
        }
        if let Some(score) = self.min_score.filter(|s| *s > 0) {
            pairs.push(("min_score", score.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

/// Parameters for `GET /articles/today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodayQuery {
    pub limit: u32,
    pub min_score: u32,
}

impl Default for TodayQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            min_score: 60,
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
    #[serde(default)]
    pub preferred_sources: Vec<String>,
    #[serde(default = "default_min_quality")]
    pub min_quality_score: u32,
    #[serde(default)]
    pub email_frequency: EmailFrequency,
    #[serde(default = "default_true")]
    pub email_enabled: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_min_quality() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

/// Partial profile update for `PUT /users/me`. `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quality_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_frequency: Option<EmailFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_enabled: Option<bool>,
}

/// Body of `POST /users/register`. No `Debug`: it carries the password.
#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

/// Response of `POST /users/login`.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlStats {
    pub crawled: u64,
    pub new: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrawlAck {
    pub message: String,
    #[serde(default)]
    pub stats: CrawlStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessAck {
    pub message: String,
    #[serde(default)]
    pub processed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdminStats {
    pub total_articles: u64,
    pub processed_articles: u64,
    pub pending_articles: u64,
    pub average_quality_score: f64,
}

// ============================================================================
// Timestamps
// ============================================================================

/// The backend emits RFC 3339 for timezone-aware columns and naive ISO-8601
/// for the rest. Naive values are UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}
