//! Prompt construction for every LLM call the pipeline makes.

use crate::types::{ContentSet, DraftResult, WebSearchResult};

pub const WEB_SEARCH_MARKER: &str = "ADDITIONAL WEB SEARCH INFORMATION";
pub const FEEDBACK_MARKER: &str = "Previous feedback for improvement:";

pub const CRITIC_SYSTEM_PROMPT: &str =
    "You are an expert editor who provides detailed, honest, and constructive criticism.";
pub const REFINER_SYSTEM_PROMPT: &str = "You are a master editor and content creator who can synthesize the best elements of multiple articles while addressing their weaknesses.";
pub const RESEARCH_SYSTEM_PROMPT: &str = "You are a research assistant that provides accurate, up-to-date information. Format your responses as bullet points with key facts.";
pub const VERIFIER_SYSTEM_PROMPT: &str = "You are a quality assurance expert who provides detailed, objective analysis of content quality.";
pub const ENHANCER_SYSTEM_PROMPT: &str = "You are an expert content strategist who helps users create better instructions for AI content generation.";

const STRIP_BRANDING_DIRECTIVE: &str = "IMPORTANT: Remove all branding and references to original source content from the body of the article. Do not mention YouTube, channel names, or any other identifying information from the original videos in the article body.";

const INCLUDE_REFERENCES_DIRECTIVE: &str = "REFERENCES: End the article with a \"References\" section that lists each source YouTube video (title, channel and URL) and each web source used (title and URL).";

const OMIT_REFERENCES_DIRECTIVE: &str = "REFERENCES: Do NOT include a references, sources or bibliography section. The article must not list or link the original videos or web sources.";

/// Number of whitespace separated words in `article`.
pub fn word_count(article: &str) -> usize {
    article.split_whitespace().count()
}

/// One `Title/Channel/Description/Transcript` block per video.
pub fn video_summaries(content: &ContentSet) -> String {
    content
        .iter()
        .map(|video| {
            format!(
                "Title: {}\nChannel: {}\nDescription: {}\nTranscript: {}",
                video.title, video.channel_title, video.description, video.transcript
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn web_search_section(result: &WebSearchResult) -> String {
    let mut section = format!("{WEB_SEARCH_MARKER}:\n{}\n", result.summary.trim());
    if !result.sources.is_empty() {
        section.push_str("\nSources:\n");
        for (i, source) in result.sources.iter().enumerate() {
            section.push_str(&format!("{}. {} - {}\n", i + 1, source.title, source.url));
        }
    }
    section
}

fn references_directive(keep_branding: bool) -> &'static str {
    if keep_branding {
        INCLUDE_REFERENCES_DIRECTIVE
    } else {
        OMIT_REFERENCES_DIRECTIVE
    }
}

/// Prompt shared by the three style generators.
pub fn base_prompt(
    summaries: &str,
    web_search: Option<&WebSearchResult>,
    instruction: &str,
    keep_branding: bool,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are tasked with writing an article based on the following YouTube video content:\n\n{summaries}\n"
    );

    if let Some(result) = web_search {
        prompt.push('\n');
        prompt.push_str(&web_search_section(result));
    }

    prompt.push_str(&format!(
        "\nThe article should follow these instructions:\n{instruction}\n\n{STRIP_BRANDING_DIRECTIVE}\n{}\n",
        references_directive(keep_branding)
    ));

    if let Some(feedback) = feedback.filter(|f| !f.trim().is_empty()) {
        prompt.push_str(&format!("\n{FEEDBACK_MARKER}\n{feedback}\n"));
    }

    prompt
}

pub fn critique_prompt(article: &str, instruction: &str, style_label: &str) -> String {
    format!(
        r#"You are a critical editor reviewing an article. The article was written in a "{style_label}" style.

The article was supposed to follow these instructions:
{instruction}

Here is the article to critique:
{article}

WORD COUNT: {words} words

Provide a detailed critique of this article. Focus on:
1. How well it follows the instructions (especially any word count requirements)
2. Content quality and accuracy
3. Structure and flow
4. Language and style
5. Areas for improvement

Be specific about whether the word count matches any requirements in the instructions. If there was a specific word count requested and this article doesn't match it, emphasize this as an important issue to fix.

Be specific and constructive in your criticism."#,
        words = word_count(article)
    )
}

fn references_listing(content: &ContentSet, web_search: Option<&WebSearchResult>) -> String {
    let mut listing = String::from("YouTube videos:\n");
    for video in content.iter() {
        listing.push_str(&format!(
            "- {} (Channel: {}) - {}\n",
            video.title, video.channel_title, video.url
        ));
    }

    if let Some(result) = web_search.filter(|r| !r.sources.is_empty()) {
        listing.push_str("Web sources:\n");
        for source in &result.sources {
            listing.push_str(&format!("- {} - {}\n", source.title, source.url));
        }
    }
    listing
}

/// Prompt for the final synthesis over all drafts and their critiques.
pub fn refinement_prompt(
    drafts: &[DraftResult; 3],
    instruction: &str,
    summaries: &str,
    content: &ContentSet,
    web_search: Option<&WebSearchResult>,
    keep_branding: bool,
) -> String {
    let mut prompt = format!(
        r#"You are an expert editor tasked with creating the best possible article based on the following materials.

The article should be based on this YouTube video content:
{summaries}

The article must follow these instructions:
{instruction}

You have been provided with three different articles and their criticisms:
"#
    );

    for (i, draft) in drafts.iter().enumerate() {
        let n = i + 1;
        prompt.push_str(&format!(
            "\n--- ARTICLE {n} ({}) ---\nWORD COUNT: {} words\n\n{}\n\n--- CRITICISM OF ARTICLE {n} ---\n{}\n",
            draft.label,
            word_count(&draft.article),
            draft.article,
            draft.criticism
        ));
    }

    prompt.push_str(
        r#"
Your task is to create a new article that:
1. Follows the original instructions PERFECTLY, especially any word count requirements
2. Takes the best elements from each of the three articles
3. Addresses the criticisms raised for each article
4. Creates a coherent, high-quality piece that is better than any of the individual articles
5. IMPORTANT: If the instructions specified a word count, make sure your article meets that exact word count requirement
6. CRITICAL: Remove all branding and references to original source content from the body. Do not mention YouTube, channel names, or any other identifying information from the original videos in the article body.
"#,
    );

    if keep_branding {
        prompt.push_str(&format!(
            "7. {INCLUDE_REFERENCES_DIRECTIVE} Use exactly these entries:\n{}",
            references_listing(content, web_search)
        ));
    } else {
        prompt.push_str(&format!("7. {OMIT_REFERENCES_DIRECTIVE}\n"));
    }

    prompt.push_str(
        "\nBefore submitting your final article, count the words and verify it meets any word count requirements specified in the instructions.\n\nWrite the final article now.\n",
    );
    prompt
}

pub fn web_search_prompt(topic: &str) -> String {
    format!(
        "Research the latest information about: {topic}. Focus on facts, statistics, and recent developments. Format the results as a concise bullet-point list of the most important facts that would be useful for writing an article. Include 3-5 key sources at the end under a \"Sources:\" heading, one per line with its URL."
    )
}

pub fn verification_prompt(article: &str, instruction: &str) -> String {
    format!(
        r#"You are a quality assurance expert tasked with analyzing an article.

The article was supposed to be written according to these instructions:
{instruction}

Here is the article to analyze:
{article}

WORD COUNT: {words} words

Please provide a detailed analysis of this article based on the following criteria:
1. Adherence to instructions (how well does it follow the given instructions, especially any word count requirements?)
2. Content quality (depth, accuracy, and relevance)
3. Structure and organization (logical flow, clarity)
4. Writing style and engagement (readability, tone)
5. Overall impact and value to the reader

For each criterion, provide a score from 1-10 and specific observations.
If the instructions specified a word count requirement, explicitly mention whether this article meets that requirement.
Then, provide an overall assessment with strengths and areas for improvement."#,
        words = word_count(article)
    )
}

pub fn enhancement_prompt(instruction: &str) -> String {
    format!(
        r#"You are an expert content strategist helping a user create better instructions for an AI article generator.

The user is using a tool that converts YouTube videos into blog articles. The user provides:
1. YouTube video URLs (which are processed to extract transcripts and content)
2. Instructions for how they want the article to be written

After the article is generated, it will be evaluated by a verifier that checks quality and adherence to instructions across these criteria:
- Adherence to instructions
- Content quality (depth, accuracy, and relevance)
- Structure and organization (logical flow, clarity)
- Writing style and engagement (readability, tone)
- Overall impact and value to the reader

The user has provided the following instructions:
"{instruction}"

Enhance these instructions into a more detailed, specific, and effective prompt. Consider:
- Specific details about tone, style, and voice
- The target audience
- Structure elements (headings, sections)
- Content priorities (what to emphasize or de-emphasize)
- Measurable quality criteria the verifier can check
- Making every requirement explicit and unambiguous

Keep the user's original intent, including any word count, and reply with the enhanced instructions only."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VideoContent, WebSource};

    fn content() -> ContentSet {
        [VideoContent {
            video_id: "dQw4w9WgXcQ".to_string(),
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            title: "T".to_string(),
            description: "D".to_string(),
            transcript: "X".to_string(),
            channel_title: "Chan".to_string(),
            published_at: "2024-01-01T00:00:00Z".to_string(),
        }]
        .into_iter()
        .collect()
    }

    fn search() -> WebSearchResult {
        WebSearchResult {
            summary: "- fact one".to_string(),
            sources: vec![WebSource {
                title: "Example".to_string(),
                url: "https://example.com".to_string(),
            }],
        }
    }

    fn drafts() -> [DraftResult; 3] {
        ["one two three", "a b", "  spaced   out\n words here  "].map(|article| DraftResult {
            article: article.to_string(),
            criticism: "too short".to_string(),
            label: "Style".to_string(),
        })
    }

    #[test]
    fn counts_whitespace_separated_words() {
        assert_eq!(word_count("  hello   world\nagain\t"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn summaries_embed_every_field() {
        let summaries = video_summaries(&content());
        assert!(summaries.contains("Title: T"));
        assert!(summaries.contains("Channel: Chan"));
        assert!(summaries.contains("Description: D"));
        assert!(summaries.contains("Transcript: X"));
    }

    #[test]
    fn base_prompt_without_search_or_feedback() {
        let prompt = base_prompt("S", None, "Write 200 words", false, None);
        assert!(!prompt.contains(WEB_SEARCH_MARKER));
        assert!(!prompt.contains(FEEDBACK_MARKER));
        assert!(prompt.contains("Write 200 words"));
        assert!(prompt.contains(STRIP_BRANDING_DIRECTIVE));
        assert!(prompt.contains(OMIT_REFERENCES_DIRECTIVE));
    }

    #[test]
    fn base_prompt_with_search_and_feedback() {
        let prompt = base_prompt("S", Some(&search()), "I", true, Some("add examples"));
        assert!(prompt.contains(WEB_SEARCH_MARKER));
        assert!(prompt.contains("1. Example - https://example.com"));
        assert!(prompt.contains(INCLUDE_REFERENCES_DIRECTIVE));
        assert!(prompt.contains("add examples"));
    }

    #[test]
    fn critique_prompt_embeds_word_count() {
        let article = "The quick  brown fox\n\njumps";
        let prompt = critique_prompt(article, "Write 5 words", "Academic Style");
        assert!(prompt.contains(&format!("WORD COUNT: {} words", word_count(article))));
        assert!(prompt.contains("WORD COUNT: 5 words"));
        assert!(prompt.contains("\"Academic Style\""));
    }

    #[test]
    fn refinement_prompt_omits_references_without_branding() {
        let prompt = refinement_prompt(&drafts(), "I", "S", &content(), Some(&search()), false);
        assert!(prompt.contains(OMIT_REFERENCES_DIRECTIVE));
        assert!(!prompt.contains(INCLUDE_REFERENCES_DIRECTIVE));
        assert!(!prompt.contains("Web sources:"));
    }

    #[test]
    fn refinement_prompt_lists_references_with_branding() {
        let prompt = refinement_prompt(&drafts(), "I", "S", &content(), Some(&search()), true);
        assert!(prompt.contains(INCLUDE_REFERENCES_DIRECTIVE));
        assert!(prompt.contains("- T (Channel: Chan) - https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(prompt.contains("- Example - https://example.com"));
    }

    #[test]
    fn refinement_prompt_embeds_each_word_count() {
        let drafts = drafts();
        let prompt = refinement_prompt(&drafts, "I", "S", &content(), None, false);
        for (i, draft) in drafts.iter().enumerate() {
            let header = format!(
                "--- ARTICLE {} ({}) ---\nWORD COUNT: {} words",
                i + 1,
                draft.label,
                word_count(&draft.article)
            );
            assert!(prompt.contains(&header), "missing {header}");
        }
        assert!(prompt.contains("--- CRITICISM OF ARTICLE 3 ---"));
    }
}
