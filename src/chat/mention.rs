//! @-mention extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// `@` followed by one or more ASCII word characters.
static MENTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("mention pattern is valid"));

/// Extract mentioned nicknames from message content.
///
/// Names are returned in order of appearance without the leading `@`.
/// Case and repeats are kept; names are not checked against any roster.
///
/// # Examples
///
/// ```
/// use mqteam::chat::parse_mentions;
///
/// assert_eq!(parse_mentions("hi @bob and @bob"), vec!["bob", "bob"]);
/// ```
pub fn parse_mentions(content: &str) -> Vec<String> {
    MENTION_PATTERN
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}
