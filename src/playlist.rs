//! M3U / M3U8 playlist tokenizer
//!
//! Turns playlist text into channel drafts. Parsing never fails: lines that
//! cannot be understood are skipped and the rest of the playlist still loads.
//!
//! ```text
//! #EXTM3U
//! #EXTINF:-1 tvg-id="bbc1" tvg-logo="http://x/logo.png" group-title="News",BBC One
//! #EXTGRP:UK
//! http://stream/bbc.ts
//! ```

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{ChannelDraft, UNCATEGORIZED};

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*"([^"]*)""#).expect("attribute pattern is valid")
});

/// Record opened by `#EXTINF` and waiting for its URL line
#[derive(Debug)]
struct PendingEntry {
    name: String,
    tvg_id: Option<String>,
    logo: Option<String>,
    category: Option<String>,
}

impl PendingEntry {
    fn into_draft(self, url: &str) -> ChannelDraft {
        ChannelDraft {
            name: self.name,
            stream_url: url.to_string(),
            logo_url: self.logo,
            category: self.category.unwrap_or_else(|| UNCATEGORIZED.to_string()),
            epg_id: self.tvg_id,
        }
    }
}

/// Check whether content looks like an M3U playlist
///
/// Accepts content with an `#EXTM3U` header or at least one `#EXTINF` entry.
pub fn validate(content: &str) -> bool {
    let upper = content.to_ascii_uppercase();
    upper.contains("#EXTM3U") || upper.contains("#EXTINF")
}

/// Parse playlist text into channel drafts in source order
pub fn parse(content: &str) -> Vec<ChannelDraft> {
    let mut channels = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for (line_num, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = strip_directive(line, "#EXTINF:") {
            if let Some(dropped) = pending.replace(parse_extinf(rest)) {
                debug!(
                    "EXTINF for '{}' has no URL line, dropped at line {}",
                    dropped.name,
                    line_num + 1
                );
            }
        } else if let Some(group) = strip_directive(line, "#EXTGRP:") {
            if let Some(entry) = pending.as_mut() {
                let group = group.trim();
                if !group.is_empty() {
                    entry.category = Some(group.to_string());
                }
            }
        } else if line.starts_with('#') {
            // Other directives (#EXTM3U, #EXTVLCOPT, comments) carry nothing we map
        } else if let Some(entry) = pending.take() {
            channels.push(entry.into_draft(line));
        } else {
            debug!("URL without EXTINF skipped at line {}", line_num + 1);
        }
    }

    if let Some(dropped) = pending {
        debug!("Trailing EXTINF for '{}' has no URL line", dropped.name);
    }

    channels
}

/// Case-insensitive prefix strip for directives
fn strip_directive<'a>(line: &'a str, directive: &str) -> Option<&'a str> {
    let head = line.get(..directive.len())?;
    if head.eq_ignore_ascii_case(directive) {
        line.get(directive.len()..)
    } else {
        None
    }
}

/// Parse the part after `#EXTINF:`, i.e. `<duration> [attrs],<name>`
fn parse_extinf(rest: &str) -> PendingEntry {
    let (attrs_part, title) = match rest.rfind(',') {
        Some(pos) => (&rest[..pos], rest[pos + 1..].trim()),
        None => (rest, ""),
    };

    let attributes = parse_attributes(attrs_part);
    let attr = |key: &str| {
        attributes
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let name = if title.is_empty() {
        attr("tvg-name").unwrap_or_default()
    } else {
        title.to_string()
    };

    PendingEntry {
        name,
        tvg_id: attr("tvg-id"),
        logo: attr("tvg-logo"),
        category: attr("group-title"),
    }
}

/// Collect `key="value"` pairs with lowercased keys
fn parse_attributes(attrs: &str) -> HashMap<String, String> {
    ATTRIBUTE_RE
        .captures_iter(attrs)
        .map(|caps| (caps[1].to_ascii_lowercase(), caps[2].to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_entry_with_attributes() {
        let content = "#EXTM3U\n#EXTINF:-1 tvg-logo=\"http://x/logo.png\" group-title=\"News\",BBC\nhttp://stream/bbc.ts\n";
        let channels = parse(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "BBC");
        assert_eq!(channels[0].logo_url.as_deref(), Some("http://x/logo.png"));
        assert_eq!(channels[0].category, "News");
        assert_eq!(channels[0].stream_url, "http://stream/bbc.ts");
    }

    #[test]
    fn test_parse_name_after_last_comma() {
        let channels = parse("#EXTINF:-1 group-title=\"News, World\",CNN\nhttp://cnn\n");
        assert_eq!(channels[0].name, "CNN");
        assert_eq!(channels[0].category, "News, World");
    }

    #[test]
    fn test_parse_falls_back_to_tvg_name() {
        let channels = parse("#EXTINF:-1 tvg-name=\"Fallback\",\nhttp://a\n");
        assert_eq!(channels[0].name, "Fallback");
    }

    #[test]
    fn test_parse_tolerates_empty_name() {
        let channels = parse("#EXTINF:-1\nhttp://a\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "");
        assert_eq!(channels[0].category, UNCATEGORIZED);
    }

    #[test]
    fn test_parse_attribute_keys_case_insensitive() {
        let channels = parse("#EXTINF:-1 TVG-ID=\"id1\" Group-Title=\"Sport\",ESPN\nhttp://espn\n");
        assert_eq!(channels[0].epg_id.as_deref(), Some("id1"));
        assert_eq!(channels[0].category, "Sport");
    }

    #[test]
    fn test_parse_ignores_unknown_attributes() {
        let channels = parse("#EXTINF:-1 catchup=\"default\" tvg-shift=\"2\",X\nhttp://x\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "X");
    }

    #[test]
    fn test_extgrp_overrides_category() {
        let channels = parse("#EXTINF:-1 group-title=\"A\",One\n#EXTGRP:B\nhttp://one\n");
        assert_eq!(channels[0].category, "B");
    }

    #[test]
    fn test_extgrp_without_pending_is_ignored() {
        let channels = parse("#EXTGRP:B\n#EXTINF:-1,One\nhttp://one\n");
        assert_eq!(channels[0].category, UNCATEGORIZED);
    }

    #[test]
    fn test_orphan_url_dropped() {
        let channels = parse("http://orphan\n#EXTINF:-1,One\nhttp://one\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].stream_url, "http://one");
    }

    #[test]
    fn test_extinf_without_url_dropped() {
        let channels = parse("#EXTINF:-1,Lost\n#EXTINF:-1,Kept\nhttp://kept\n#EXTINF:-1,Tail\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Kept");
    }

    #[test]
    fn test_crlf_and_whitespace() {
        let channels = parse("#EXTM3U\r\n  #EXTINF:-1,Spaced  \r\n  http://spaced  \r\n");
        assert_eq!(channels[0].name, "Spaced");
        assert_eq!(channels[0].stream_url, "http://spaced");
    }

    #[test]
    fn test_comments_between_entries_keep_order() {
        let content = "#EXTM3U\n#EXTINF:-1,A\n# comment\n#EXTVLCOPT:http-user-agent=x\nhttp://a\n#EXTINF:-1,B\nhttp://b\n## trailer\n#EXTINF:-1,C\nhttp://c\n";
        let names: Vec<_> = parse(content).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_validate() {
        assert!(validate("#EXTM3U\n"));
        assert!(validate("#EXTINF:-1,X\nhttp://x"));
        assert!(validate("#extm3u"));
        assert!(!validate("<html>nope</html>"));
        assert!(!validate(""));
    }

    #[test]
    fn test_validate_accepts_anything_parse_accepts() {
        let content = "#extinf:-1,lower\nhttp://lower\n";
        assert_eq!(parse(content).len(), 1);
        assert!(validate(content));
    }
}
