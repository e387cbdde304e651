use crate::error::PortalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A social network the content agent writes for.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    LinkedIn,
    X,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::LinkedIn => "linkedin",
            Platform::X => "x",
        }
    }

    /// Longest post the network accepts, in characters.
    pub fn max_chars(&self) -> usize {
        match self {
            Platform::Facebook => 63_206,
            Platform::Instagram => 2_200,
            Platform::LinkedIn => 3_000,
            Platform::X => 280,
        }
    }

    /// Style guidance handed to the writer.
    pub fn guidance(&self) -> &'static str {
        match self {
            Platform::Facebook => "Conversational, two or three short paragraphs, one call to action.",
            Platform::Instagram => "Visual and warm, short lines, emojis allowed, up to 10 hashtags.",
            Platform::LinkedIn => "Professional and informative, no emojis, up to 3 hashtags.",
            Platform::X => "One punchy sentence plus at most 2 hashtags.",
        }
    }
}

impl FromStr for Platform {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facebook" | "fb" => Ok(Platform::Facebook),
            "instagram" | "ig" => Ok(Platform::Instagram),
            "linkedin" => Ok(Platform::LinkedIn),
            "x" | "twitter" => Ok(Platform::X),
            other => Err(PortalError::ValidationError(format!(
                "Unknown platform '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a scraped page is about, as understood by the analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContentBrief {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub text: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl SocialPost {
    /// Trims the text and rewrites hashtags as `#word`, dropping blanks and
    /// duplicates.
    pub fn normalized(self) -> Self {
        let mut hashtags: Vec<String> = Vec::with_capacity(self.hashtags.len());
        for tag in self.hashtags {
            let word: String = tag
                .trim()
                .trim_start_matches('#')
                .split_whitespace()
                .collect();
            if word.is_empty() {
                continue;
            }
            let tag = format!("#{word}");
            if !hashtags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                hashtags.push(tag);
            }
        }
        Self {
            text: self.text.trim().to_string(),
            hashtags,
        }
    }

    /// Length of the post as published: text plus hashtags on one line.
    pub fn published_len(&self) -> usize {
        let tags: usize = self.hashtags.iter().map(|t| t.chars().count() + 1).sum();
        self.text.chars().count() + tags
    }
}

/// A brief and the posts generated from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub platform: Platform,
    pub brief: ContentBrief,
    pub posts: Vec<SocialPost>,
}
