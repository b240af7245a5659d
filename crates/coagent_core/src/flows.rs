use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::contract::ProxyError;

const AGENT_PERSONA: &str = "You are an expert assistant for real estate agents. \
Write accurate, professional, publication-ready material grounded in the details you are given. \
Never invent specific statistics that were not provided.";

const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single JSON object only, with no commentary before or after it.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    ListingDescription,
    BlogPost,
    SocialMedia,
    MarketUpdate,
    ResearchReport,
    NeighborhoodProfile,
    VideoScript,
}

/// Everything needed for one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub flow: FlowKind,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl FlowKind {
    pub const ALL: [Self; 7] = [
        Self::ListingDescription,
        Self::BlogPost,
        Self::SocialMedia,
        Self::MarketUpdate,
        Self::ResearchReport,
        Self::NeighborhoodProfile,
        Self::VideoScript,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flow| flow.as_str() == value.trim())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListingDescription => "listing-description",
            Self::BlogPost => "blog-post",
            Self::SocialMedia => "social-media",
            Self::MarketUpdate => "market-update",
            Self::ResearchReport => "research-report",
            Self::NeighborhoodProfile => "neighborhood-profile",
            Self::VideoScript => "video-script",
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::ListingDescription => &["propertyDetails"],
            Self::BlogPost | Self::SocialMedia | Self::ResearchReport | Self::VideoScript => {
                &["topic"]
            }
            Self::MarketUpdate | Self::NeighborhoodProfile => &["location"],
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Self::SocialMedia => 1_024,
            Self::ListingDescription | Self::MarketUpdate | Self::VideoScript => 2_048,
            Self::BlogPost | Self::NeighborhoodProfile => 4_096,
            Self::ResearchReport => 6_144,
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            Self::ResearchReport | Self::MarketUpdate | Self::NeighborhoodProfile => 0.3,
            Self::ListingDescription | Self::BlogPost => 0.7,
            Self::SocialMedia | Self::VideoScript => 0.8,
        }
    }

    fn task(self) -> &'static str {
        match self {
            Self::ListingDescription => {
                "Write a compelling MLS listing description for the property below. \
Lead with the strongest feature, highlight recent updates and lifestyle benefits, and keep it under 250 words."
            }
            Self::BlogPost => {
                "Write an SEO-optimized blog post (800-1200 words) for the topic below. \
Include a title, a meta description, section headings and a closing call to action."
            }
            Self::SocialMedia => {
                "Write platform-specific social media posts about the topic below \
for LinkedIn, Facebook and Instagram, each with relevant hashtags."
            }
            Self::MarketUpdate => {
                "Write a concise market update for the location below that an agent can send to clients."
            }
            Self::ResearchReport => {
                "Produce a structured research report on the topic below, \
with an executive summary, key findings, recommendations and the sources you relied on."
            }
            Self::NeighborhoodProfile => {
                "Write a neighborhood profile for the location below covering lifestyle, \
amenities, schools, commute and market dynamics."
            }
            Self::VideoScript => {
                "Write a short-form video script about the topic below with a hook, scenes and a call to action."
            }
        }
    }

    fn output_shape(self) -> &'static str {
        match self {
            Self::ListingDescription => r#"{"headline": string, "description": string, "highlights": [string]}"#,
            Self::BlogPost => {
                r#"{"title": string, "metaDescription": string, "content": string, "keywords": [string]}"#
            }
            Self::SocialMedia => {
                r#"{"posts": [{"platform": string, "content": string, "hashtags": [string]}]}"#
            }
            Self::MarketUpdate => r#"{"title": string, "summary": string, "keyPoints": [string]}"#,
            Self::ResearchReport => {
                r#"{"title": string, "summary": string, "findings": [string], "recommendations": [string], "citations": [string]}"#
            }
            Self::NeighborhoodProfile => {
                r#"{"name": string, "overview": string, "amenities": [string], "schools": string, "marketInsights": string}"#
            }
            Self::VideoScript => {
                r#"{"title": string, "hook": string, "scenes": [{"visual": string, "narration": string}], "callToAction": string}"#
            }
        }
    }

    pub fn build_prompt(self, input: &Map<String, Value>) -> Result<PromptSpec, ProxyError> {
        for field in self.required_fields() {
            if !has_content(input.get(*field)) {
                return Err(ProxyError::InvalidInput {
                    flow: self.as_str().to_string(),
                    field: (*field).to_string(),
                });
            }
        }

        let rendered_input = serde_json::to_string_pretty(input)
            .map_err(|error| ProxyError::InvalidRequest(format!("Unserializable input: {error}")))?;

        Ok(PromptSpec {
            flow: self,
            system: AGENT_PERSONA.to_string(),
            user: format!(
                "{}\n\nInput:\n{rendered_input}\n\n{JSON_ONLY_INSTRUCTION}\nShape: {}",
                self.task(),
                self.output_shape()
            ),
            max_tokens: self.max_tokens(),
            temperature: self.temperature(),
        })
    }
}

fn has_content(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
        Some(_) => true,
    }
}
