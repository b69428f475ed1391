//! Prompt templates.
//!
//! `{{name}}` is replaced by the variable's value (empty when the variable is
//! known but unset). `{{#if name}}...{{/if}}` keeps its contents only when
//! `name` is non-empty. Placeholders for unknown names are left untouched.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref IF_BLOCK: Regex = Regex::new(r"(?s)\{\{#if\s+(\w+)\s*\}\}(.*?)\{\{/if\}\}").unwrap();
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{(\w+)\}\}").unwrap();
}

/// Fill `template` from `vars`.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let lookup = |name: &str| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);

    let blocks_resolved = IF_BLOCK.replace_all(template, |caps: &Captures| {
        match lookup(&caps[1]) {
            Some(value) if !value.trim().is_empty() => caps[2].to_string(),
            _ => String::new(),
        }
    });

    PLACEHOLDER
        .replace_all(&blocks_resolved, |caps: &Captures| match lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Inputs for the reply prompt.
#[derive(Debug, Clone, Default)]
pub struct ReplyPromptInput<'a> {
    /// Post title and body, see `PostSnapshot::original_post`
    pub original_post: &'a str,
    /// The comment being replied to, if any
    pub reply_content: Option<&'a str>,
    pub subreddit: &'a str,
    pub additional_requirements: &'a str,
}

pub fn reply_prompt(template: &str, input: &ReplyPromptInput<'_>) -> String {
    render(
        template,
        &[
            ("originalPost", input.original_post),
            ("replyContent", input.reply_content.unwrap_or_default()),
            ("subreddit", input.subreddit),
            ("additionalRequirements", input.additional_requirements),
        ],
    )
}

pub fn translation_prompt(template: &str, content: &str) -> String {
    render(template, &[("content", content)])
}
