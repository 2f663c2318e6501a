//! Turn a blog post draft from the admin form into the record that gets persisted.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plain_text::to_plain_text;
use crate::sanitizer::sanitize;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref EDGE_DASHES: Regex = Regex::new(r"^-+|-+$").unwrap();
    static ref REPEATED_DASHES: Regex = Regex::new(r"-{2,}").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostError {
    #[error("Post title is required")]
    MissingTitle,
    #[error("Post content is empty after sanitizing")]
    EmptyContent,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostDraft {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PreparedPost {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    /// Sanitized markup, safe to render
    pub content: String,
    /// Text of the sanitized content, for search and structured data
    pub plain_text: String,
}

impl PostDraft {
    pub fn prepare(&self) -> Result<PreparedPost, PostError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(PostError::MissingTitle);
        }

        let content = sanitize(&self.content);
        let plain_text = to_plain_text(&content);
        if plain_text.is_empty() {
            return Err(PostError::EmptyContent);
        }

        let slug = match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slugify(slug),
            _ => slugify(title),
        };

        let excerpt = self
            .excerpt
            .as_deref()
            .map(str::trim)
            .filter(|excerpt| !excerpt.is_empty())
            .map(str::to_owned);

        Ok(PreparedPost {
            title: title.to_owned(),
            slug,
            excerpt,
            content,
            plain_text,
        })
    }
}

/// URL-safe lowercase slug, e.g. "Pumps & Valves!" becomes "pumps-and-valves"
pub fn slugify(value: &str) -> String {
    let slug = value.to_lowercase().replace('&', " and ");
    let slug = NON_SLUG_CHARS.replace_all(&slug, "-");
    let slug = EDGE_DASHES.replace_all(&slug, "");
    REPEATED_DASHES.replace_all(&slug, "-").into_owned()
}
