//! Value extraction over stored tag strings.
//!
//! Tags are stored per submission as a single string of space-prefixed
//! `tag#value` entries, e.g. `" accept#0 12~mine#0 order#3"`. Tags prefixed
//! with `<contact id>~` belong to one user; tags prefixed with `~~` are
//! chair-only.

use crate::ids::ContactId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    pub tag: String,
    pub value: i64,
}

pub fn parse_tags(tags: &str) -> Vec<TagValue> {
    tags.split_whitespace()
        .filter_map(|entry| {
            let (tag, value) = entry.split_once('#').unwrap_or((entry, "0"));
            if tag.is_empty() {
                return None;
            }
            Some(TagValue {
                tag: tag.to_string(),
                value: value.parse().unwrap_or(0),
            })
        })
        .collect()
}

/// Finds the value of `tag` (case-insensitive) in a stored tag string.
pub fn find_tag_value(tags: &str, tag: &str) -> Option<i64> {
    let haystack = format!(" {}", tags.trim_start()).to_lowercase();
    let needle = format!(" {}#", tag.to_lowercase());
    let start = haystack.find(&needle)? + needle.len();
    let digits: String = haystack[start..]
        .chars()
        .enumerate()
        .take_while(|(index, ch)| ch.is_ascii_digit() || (*index == 0 && *ch == '-'))
        .map(|(_, ch)| ch)
        .collect();
    Some(digits.parse().unwrap_or(0))
}

/// Checks a user-supplied tag name, returning its canonical stored form.
///
/// A leading `~` names the viewer's private tag and is expanded to
/// `<contact id>~tag`. Values (`tag#3`) are rejected.
pub fn canonical_tag(tag: &str, owner: ContactId) -> Option<String> {
    let tag = tag.trim();
    let (private, bare) = match tag.strip_prefix('~') {
        Some(rest) if !rest.starts_with('~') => (true, rest),
        _ => (false, tag),
    };
    let body = bare.trim_start_matches('~');
    let valid = !body.is_empty()
        && body
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':' | '!' | '@'));
    if !valid {
        return None;
    }
    if private {
        Some(format!("{owner}~{body}"))
    } else {
        Some(bare.to_string())
    }
}

/// Tags from `tags` that `viewer` may see, with private tags shown as `~tag`.
pub fn viewable_tags(tags: &str, viewer: ContactId, is_chair: bool) -> Vec<TagValue> {
    let own_prefix = format!("{viewer}~");
    parse_tags(tags)
        .into_iter()
        .filter_map(|entry| {
            if entry.tag.starts_with("~~") {
                return is_chair.then_some(entry);
            }
            match entry.tag.split_once('~') {
                None => Some(entry),
                Some(_) => entry.tag.strip_prefix(&own_prefix).map(|rest| TagValue {
                    tag: format!("~{rest}"),
                    value: entry.value,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGS: &str = " accept#0 12~mine#4 order#-3 ~~secret#0";

    #[test]
    fn finds_values_case_insensitively() {
        assert_eq!(find_tag_value(TAGS, "ACCEPT"), Some(0));
        assert_eq!(find_tag_value(TAGS, "order"), Some(-3));
        assert_eq!(find_tag_value(TAGS, "12~mine"), Some(4));
        assert_eq!(find_tag_value(TAGS, "acc"), None);
    }

    #[test]
    fn canonical_tag_expands_private_tags() {
        assert_eq!(
            canonical_tag("~mine", ContactId(12)).as_deref(),
            Some("12~mine")
        );
        assert_eq!(canonical_tag("urgent", ContactId(12)).as_deref(), Some("urgent"));
        assert_eq!(canonical_tag("bad#3", ContactId(12)), None);
        assert_eq!(canonical_tag("", ContactId(12)), None);
    }

    #[test]
    fn viewable_tags_hide_other_users_and_chair_tags() {
        let tags: Vec<String> = viewable_tags(TAGS, ContactId(12), false)
            .into_iter()
            .map(|t| t.tag)
            .collect();
        assert_eq!(tags, vec!["accept", "~mine", "order"]);

        let chair: Vec<String> = viewable_tags(TAGS, ContactId(1), true)
            .into_iter()
            .map(|t| t.tag)
            .collect();
        assert_eq!(chair, vec!["accept", "order", "~~secret"]);
    }
}
