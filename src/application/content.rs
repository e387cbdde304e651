use crate::domain::content::{Campaign, ContentBrief, Platform, SocialPost};
use crate::domain::ports::{CompletionClientBox, PageFetcherBox};
use crate::error::{CompletionError, PortalError, Result};
use crate::infrastructure::anthropic;
use serde::Deserialize;
use tracing::{info, warn};

/// Longest page excerpt sent to the analysis step.
const MAX_PAGE_CHARS: usize = 30_000;
pub const MAX_POSTS: usize = 10;

const ANALYSIS_SYSTEM: &str = "You are a marketing analyst for a Mexican insurance brokerage. \
Respond with a single JSON object and nothing else.";

const ANALYSIS_PROMPT: &str = r#"Read the web page text below and describe it for a social media writer.

Return JSON with exactly these keys:
{
  "title": string,
  "summary": string (two or three sentences),
  "audience": string,
  "tone": string,
  "key_points": [string]
}

Page text:
"#;

const WRITER_SYSTEM: &str = "You write social media posts in Spanish for a Mexican insurance \
brokerage. Respond with a single JSON object and nothing else.";

#[derive(Debug, Deserialize)]
struct GeneratedPosts {
    #[serde(default)]
    posts: Vec<SocialPost>,
}

/// Turns a web page into ready-to-publish social media posts.
///
/// Three steps per campaign: fetch the page text, ask the completion API for
/// a brief, then ask it again for posts written from that brief. Unlike the
/// policy comparator there is no offline fallback; a failed completion fails
/// the call.
pub struct ContentAgent {
    completion: CompletionClientBox,
    fetcher: PageFetcherBox,
}

impl ContentAgent {
    pub fn new(completion: CompletionClientBox, fetcher: PageFetcherBox) -> Self {
        Self {
            completion,
            fetcher,
        }
    }

    pub async fn campaign(&self, url: &str, platform: Platform, count: usize) -> Result<Campaign> {
        check_count(count)?;
        let brief = self.analyze(url).await?;
        let posts = self.generate(&brief, platform, count).await?;
        Ok(Campaign {
            platform,
            brief,
            posts,
        })
    }

    pub async fn analyze(&self, url: &str) -> Result<ContentBrief> {
        let url = url.trim();
        let text = self.fetcher.fetch(url).await?;
        if text.trim().is_empty() {
            return Err(PortalError::ValidationError(format!(
                "'{url}' has no readable text"
            )));
        }

        let excerpt: String = text.chars().take(MAX_PAGE_CHARS).collect();
        let answer = self
            .completion
            .complete(ANALYSIS_SYSTEM, &format!("{ANALYSIS_PROMPT}{excerpt}"))
            .await?;
        let mut brief: ContentBrief =
            serde_json::from_str(anthropic::extract_json(&answer)).map_err(CompletionError::from)?;
        brief.source_url = url.to_string();

        info!(url, key_points = brief.key_points.len(), "Page analyzed");
        Ok(brief)
    }

    pub async fn generate(
        &self,
        brief: &ContentBrief,
        platform: Platform,
        count: usize,
    ) -> Result<Vec<SocialPost>> {
        check_count(count)?;
        let answer = self
            .completion
            .complete(WRITER_SYSTEM, &writer_prompt(brief, platform, count)?)
            .await?;
        let generated: GeneratedPosts =
            serde_json::from_str(anthropic::extract_json(&answer)).map_err(CompletionError::from)?;

        let posts: Vec<SocialPost> = generated
            .posts
            .into_iter()
            .map(SocialPost::normalized)
            .filter(|post| !post.text.is_empty())
            .take(count)
            .collect();
        if posts.is_empty() {
            return Err(CompletionError::EmptyContent.into());
        }
        for post in &posts {
            if post.published_len() > platform.max_chars() {
                warn!(%platform, chars = post.published_len(), "Generated post exceeds the platform limit");
            }
        }

        info!(%platform, posts = posts.len(), "Posts generated");
        Ok(posts)
    }
}

fn check_count(count: usize) -> Result<()> {
    if count == 0 || count > MAX_POSTS {
        return Err(PortalError::ValidationError(format!(
            "Post count must be between 1 and {MAX_POSTS}"
        )));
    }
    Ok(())
}

fn writer_prompt(brief: &ContentBrief, platform: Platform, count: usize) -> Result<String> {
    let brief_json = serde_json::to_string_pretty(brief)?;
    Ok(format!(
        r#"Write {count} distinct posts for {platform} based on this brief.
Style: {guidance}
Each post, hashtags included, must fit in {max} characters.

Return JSON: {{"posts": [{{"text": string, "hashtags": [string]}}]}}

Brief:
{brief_json}"#,
        guidance = platform.guidance(),
        max = platform.max_chars(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CompletionClient, PageFetcher};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct StaticPage(&'static str);

    #[async_trait]
    impl PageFetcher for StaticPage {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Replies with canned answers in order and records every prompt.
    #[derive(Clone, Default)]
    struct ScriptedCompletion {
        answers: Arc<Mutex<Vec<String>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedCompletion {
        fn new(answers: &[&str]) -> Self {
            let mut answers: Vec<String> = answers.iter().map(|a| a.to_string()).collect();
            answers.reverse();
            Self {
                answers: Arc::new(Mutex::new(answers)),
                prompts: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(
            &self,
            _system: &str,
            prompt: &str,
        ) -> std::result::Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop()
                .ok_or(CompletionError::EmptyContent)
        }
    }

    const BRIEF: &str = r#"```json
{"title":"Seguro de auto","summary":"Cobertura amplia.","audience":"Conductores",
 "tone":"cercano","key_points":["Robo total","Asistencia vial"]}
```"#;

    #[tokio::test]
    async fn test_campaign_runs_both_steps() {
        let completion = ScriptedCompletion::new(&[
            BRIEF,
            r##"{"posts":[{"text":"Maneja tranquilo.","hashtags":["seguros","#Auto"]},
                        {"text":"Asistencia 24/7.","hashtags":[]}]}"##,
        ]);
        let agent = ContentAgent::new(
            Box::new(completion.clone()),
            Box::new(StaticPage("Seguro de Auto\nRobo total")),
        );

        let campaign = agent
            .campaign("https://example.com/autos", Platform::Instagram, 2)
            .await
            .unwrap();

        assert_eq!(campaign.brief.source_url, "https://example.com/autos");
        assert_eq!(campaign.brief.key_points, vec!["Robo total", "Asistencia vial"]);
        assert_eq!(campaign.posts.len(), 2);
        assert_eq!(campaign.posts[0].hashtags, vec!["#seguros", "#Auto"]);

        let prompts = completion.prompts.lock().unwrap();
        assert!(prompts[0].ends_with("Seguro de Auto\nRobo total"));
        assert!(prompts[1].contains("Write 2 distinct posts for instagram"));
        assert!(prompts[1].contains("\"title\": \"Seguro de auto\""));
    }

    #[tokio::test]
    async fn test_extra_and_blank_posts_are_dropped() {
        let completion = ScriptedCompletion::new(&[
            r#"{"posts":[{"text":"  "},{"text":"Uno"},{"text":"Dos"},{"text":"Tres"}]}"#,
        ]);
        let agent = ContentAgent::new(Box::new(completion), Box::new(StaticPage("")));

        let posts = agent
            .generate(&ContentBrief::default(), Platform::X, 2)
            .await
            .unwrap();
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Uno", "Dos"]);
    }

    #[tokio::test]
    async fn test_no_posts_is_an_error() {
        let completion = ScriptedCompletion::new(&[r#"{"posts":[]}"#]);
        let agent = ContentAgent::new(Box::new(completion), Box::new(StaticPage("")));

        let result = agent.generate(&ContentBrief::default(), Platform::X, 1).await;
        assert!(matches!(
            result,
            Err(PortalError::CompletionError(CompletionError::EmptyContent))
        ));
    }

    #[tokio::test]
    async fn test_empty_page_is_rejected_before_completion() {
        let completion = ScriptedCompletion::new(&[BRIEF]);
        let agent = ContentAgent::new(
            Box::new(completion.clone()),
            Box::new(StaticPage("  \n ")),
        );

        let result = agent.analyze("https://example.com").await;
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
        assert!(completion.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_count_is_bounded() {
        let agent = ContentAgent::new(
            Box::new(ScriptedCompletion::default()),
            Box::new(StaticPage("texto")),
        );
        for count in [0, MAX_POSTS + 1] {
            let result = agent.campaign("https://example.com", Platform::LinkedIn, count).await;
            assert!(matches!(result, Err(PortalError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_non_json_brief_is_a_completion_error() {
        let completion = ScriptedCompletion::new(&["Claro, aquí va un resumen."]);
        let agent = ContentAgent::new(Box::new(completion), Box::new(StaticPage("texto")));

        let result = agent.analyze("https://example.com").await;
        assert!(matches!(
            result,
            Err(PortalError::CompletionError(CompletionError::Parse(_)))
        ));
    }
}
