use pulldown_cmark::{Event, HeadingLevel, MetadataBlockKind, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// One `[[target]]` or `[[target|label]]` occurrence.
///
/// `start` and `end` are character offsets into the source string,
/// `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikilinkMatch {
    pub target: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

fn wikilink_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // Brackets and newlines are not allowed inside a link, so an unterminated
    // `[[` never swallows a later link.
    RE.get_or_init(|| Regex::new(r"\[\[([^\[\]\n]*)\]\]").ok())
        .as_ref()
}

/// Extract every wikilink from `text`, left to right, non-overlapping.
pub fn parse_wikilinks(text: &str) -> Vec<WikilinkMatch> {
    let mut matches = Vec::new();
    let Some(wikilink) = wikilink_regex() else {
        return matches;
    };

    // Running byte -> char offset conversion, captures come in order.
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for caps in wikilink.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        char_cursor += text[byte_cursor..whole.start()].chars().count();
        byte_cursor = whole.start();
        let start = char_cursor;

        char_cursor += whole.as_str().chars().count();
        byte_cursor = whole.end();
        let end = char_cursor;

        let (target_part, label_part) = match inner.as_str().split_once('|') {
            Some((left, right)) => (left, Some(right)),
            None => (inner.as_str(), None),
        };

        let target = target_part.trim();
        if target.is_empty() {
            continue;
        }

        let label = label_part
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(target);

        matches.push(WikilinkMatch {
            target: target.to_string(),
            label: label.to_string(),
            start,
            end,
        });
    }

    matches
}

/// Derive a notebook title from its markdown.
///
/// Frontmatter `title:` wins, then the first level-1 heading, then the first
/// heading of any level.
pub fn derive_title(markdown: &str) -> Option<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);

    let mut in_frontmatter = false;
    let mut frontmatter_content = String::new();

    let mut pending_heading: Option<(HeadingLevel, String)> = None;
    let mut first_heading: Option<String> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::MetadataBlock(MetadataBlockKind::YamlStyle)) => {
                in_frontmatter = true;
            }
            Event::End(TagEnd::MetadataBlock(MetadataBlockKind::YamlStyle)) => {
                in_frontmatter = false;
                if let Ok(json) = serde_yaml::from_str::<serde_json::Value>(&frontmatter_content) {
                    if let Some(title) = json.get("title").and_then(|v| v.as_str()) {
                        let title = title.trim();
                        if !title.is_empty() {
                            return Some(title.to_string());
                        }
                    }
                }
            }
            Event::Start(Tag::Heading { level, .. }) => {
                pending_heading = Some((level, String::new()));
            }
            Event::End(TagEnd::Heading(..)) => {
                if let Some((level, text)) = pending_heading.take() {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        continue;
                    }
                    if level == HeadingLevel::H1 {
                        return Some(text);
                    }
                    first_heading.get_or_insert(text);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if in_frontmatter {
                    frontmatter_content.push_str(&text);
                } else if let Some((_, heading_text)) = pending_heading.as_mut() {
                    heading_text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    first_heading
}

/// Hex sha256 of a piece of text.
pub fn content_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_idempotent() {
        let content = "See [[B]] and [[c-id|Gamma]], then [[unterminated";
        assert_eq!(parse_wikilinks(content), parse_wikilinks(content));
    }

    #[test]
    fn test_label_defaults_to_target() {
        let result = parse_wikilinks("[[Foo]]");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].target, "Foo");
        assert_eq!(result[0].label, "Foo");
        assert_eq!(result[0].start, 0);
        assert_eq!(result[0].end, 7);
    }

    #[test]
    fn test_pipe_splits_target_and_label() {
        let result = parse_wikilinks("[[note-123|Chapter One]]");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].target, "note-123");
        assert_eq!(result[0].label, "Chapter One");
    }

    #[test]
    fn test_only_first_pipe_splits() {
        let result = parse_wikilinks("[[a|b|c]]");
        assert_eq!(result[0].target, "a");
        assert_eq!(result[0].label, "b|c");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let result = parse_wikilinks("[[  My Note  |  shown  ]]");
        assert_eq!(result[0].target, "My Note");
        assert_eq!(result[0].label, "shown");
    }

    #[test]
    fn test_empty_label_falls_back_to_target() {
        let result = parse_wikilinks("[[target| ]]");
        assert_eq!(result[0].label, "target");
    }

    #[test]
    fn test_empty_target_is_skipped() {
        assert!(parse_wikilinks("[[]] [[  ]] [[ |label]]").is_empty());
    }

    #[test]
    fn test_multiple_links_in_order() {
        let content = "# Note 1\n\n[[note2]] and [[note3]]";
        let result = parse_wikilinks(content);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].target, "note2");
        assert_eq!(result[1].target, "note3");
        assert!(result[0].end <= result[1].start);
    }

    #[test]
    fn test_unterminated_link_is_skipped() {
        let result = parse_wikilinks("start [[broken and then [[ok]] end");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].target, "ok");
        assert_eq!(result[0].start, 24);

        assert!(parse_wikilinks("[[never closed").is_empty());
        assert!(parse_wikilinks("[[split\nacross]]").is_empty());
    }

    #[test]
    fn test_offsets_are_characters() {
        let content = "和[[Alias|a.b.c]]类似";
        let result = parse_wikilinks(content);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].start, 1);
        // "[[Alias|a.b.c]]" is 15 characters.
        assert_eq!(result[0].end, 16);

        let slice: String = content
            .chars()
            .skip(result[0].start)
            .take(result[0].end - result[0].start)
            .collect();
        assert_eq!(slice, "[[Alias|a.b.c]]");
    }

    #[test]
    fn test_derive_title_prefers_frontmatter() {
        let content = "---\ntitle: From Frontmatter\n---\n# Heading";
        assert_eq!(derive_title(content), Some("From Frontmatter".to_string()));
    }

    #[test]
    fn test_derive_title_from_first_h1() {
        assert_eq!(
            derive_title("## Sub\n\n# Main `code`\n\n# Second"),
            Some("Main code".to_string())
        );
    }

    #[test]
    fn test_derive_title_falls_back_to_any_heading() {
        assert_eq!(derive_title("text\n\n### Deep"), Some("Deep".to_string()));
        assert_eq!(derive_title("no headings here"), None);
    }

    #[test]
    fn test_content_digest() {
        assert_eq!(content_digest("A"), content_digest("A"));
        assert_ne!(content_digest("A"), content_digest("B"));
        assert_eq!(content_digest("A").len(), 64);
    }
}
