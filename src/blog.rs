use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::ai::{AiError, OpenAiClient};
use crate::config::PublisherConfig;

pub mod text;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("model returned a draft that is not valid JSON: {0}")]
    MalformedDraft(String),

    #[error("no webhook configured for publishing")]
    PublisherDisabled,

    #[error("webhook publish failed: {0}")]
    Publish(String),
}

const COMPOSE_SYSTEM_PROMPT: &str = "You are the content writer for Cryptorafts, a platform \
connecting crypto founders with investors, exchanges, IDO platforms, agencies and influencers. \
Write accurate, sober articles for founders and investors. Avoid hype, price predictions and \
financial advice. Respond with a single JSON object and nothing else, using exactly these \
fields: {\"title\": string, \"markdown\": string, \"tags\": [string]}. The markdown field \
holds the full article body in GitHub-flavored markdown with ## section headings.";

/// Shape the model must return for a composed article.
#[derive(Debug, Clone, Deserialize)]
struct ComposedDraft {
    title: String,
    markdown: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub title: String,
    pub slug: String,
    pub markdown: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub reading_time_minutes: u32,
}

/// Compose-and-publish pipeline: one model call to draft the article, one
/// webhook POST (with a single retry) to hand it to the publishing flow.
pub struct BlogComposer {
    ai: OpenAiClient,
    http: Client,
    webhook_url: Option<String>,
}

impl BlogComposer {
    pub fn new(ai: OpenAiClient, publisher: &PublisherConfig) -> Self {
        Self {
            ai,
            http: Client::new(),
            webhook_url: publisher.webhook_url.clone(),
        }
    }

    pub async fn compose(&self, topic: &str) -> Result<BlogPost, BlogError> {
        let user_prompt = format!(
            "Write an article on the following topic: {topic}. Aim for 800 to 1200 words."
        );

        let raw = self
            .ai
            .chat_completion(COMPOSE_SYSTEM_PROMPT, &user_prompt)
            .await?;

        let draft: ComposedDraft = serde_json::from_str(raw.trim())
            .map_err(|e| BlogError::MalformedDraft(e.to_string()))?;

        Ok(post_from_draft(draft))
    }

    /// POSTs the article to the configured webhook. Exactly one retry on
    /// failure, then the error propagates.
    pub async fn publish(&self, post: &BlogPost) -> Result<(), BlogError> {
        let webhook = self
            .webhook_url
            .as_deref()
            .ok_or(BlogError::PublisherDisabled)?;

        match self.post_once(webhook, post).await {
            Ok(()) => Ok(()),
            Err(first) => {
                warn!(error = %first, "webhook publish failed, retrying once");
                crate::web::metrics::Metrics::publish_retried();
                self.post_once(webhook, post).await
            }
        }
    }

    async fn post_once(&self, webhook: &str, post: &BlogPost) -> Result<(), BlogError> {
        let response = self
            .http
            .post(webhook)
            .json(post)
            .send()
            .await
            .map_err(|e| BlogError::Publish(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlogError::Publish(format!("{status}: {body}")));
        }

        info!(slug = %post.slug, "blog post published");
        Ok(())
    }
}

fn post_from_draft(draft: ComposedDraft) -> BlogPost {
    let reading_time_minutes = text::reading_time_minutes(&draft.markdown);
    BlogPost {
        slug: text::slugify(&draft.title),
        excerpt: text::excerpt(&draft.markdown, 240),
        reading_time_minutes,
        title: draft.title,
        markdown: draft.markdown,
        tags: draft.tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_parsing_rejects_non_json() {
        let err = serde_json::from_str::<ComposedDraft>("here is your article!").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn draft_parsing_accepts_missing_tags() {
        let draft: ComposedDraft =
            serde_json::from_str(r#"{"title": "T", "markdown": "body"}"#).expect("parses");
        assert!(draft.tags.is_empty());
    }

    #[test]
    fn post_derives_slug_excerpt_and_reading_time() {
        let body = vec!["word"; 400].join(" ");
        let draft = ComposedDraft {
            title: "Why BNB Chain?".to_string(),
            markdown: body,
            tags: vec!["bnb".to_string()],
        };

        let post = post_from_draft(draft);
        assert_eq!(post.slug, "why-bnb-chain");
        assert_eq!(post.reading_time_minutes, 2);
        assert!(post.excerpt.len() <= 241);
    }
}
