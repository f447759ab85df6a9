//! Markup helpers shared by several columns.

use chrono::DateTime;
use paperlist_model::{
    Contact, Preference, REVIEW_EXTERNAL, REVIEW_PC, REVIEW_PRIMARY, REVIEW_SECONDARY, ReviewRow,
};

pub(crate) fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

pub(crate) fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Joins names as "A", "A and B" or "A, B, and C".
pub(crate) fn comma_join(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// Wraps markup a conflicted administrator sees only by overriding the conflict.
pub(crate) fn wrap_conflict(html: &str) -> String {
    format!("<span class=\"fx5\">{html}</span>")
}

pub(crate) fn contact_name_html(contact: &Contact) -> String {
    escape(&contact.display_name())
}

/// Label and icon letter for a review type; negative types mark conflicts.
pub(crate) fn review_type_label(review_type: i32) -> Option<(&'static str, &'static str)> {
    match review_type {
        REVIEW_PRIMARY => Some(("Primary", "1")),
        REVIEW_SECONDARY => Some(("Secondary", "2")),
        REVIEW_PC => Some(("Optional", "O")),
        REVIEW_EXTERNAL => Some(("External", "E")),
        t if t < 0 => Some(("Conflict", "C")),
        _ => None,
    }
}

pub(crate) fn review_type_icon(review_type: i32, submitted: bool) -> String {
    let Some((title, letter)) = review_type_label(review_type) else {
        return String::new();
    };
    let class = if review_type < 0 { "rtc".to_string() } else { format!("rt{review_type}") };
    let incomplete = if submitted || review_type < 0 { "" } else { " rtinc" };
    format!(
        "<span class=\"rto {class}{incomplete}\" title=\"{title}\"><span class=\"rti\">{letter}</span></span>"
    )
}

/// Progress of one review assignment.
pub(crate) struct ReviewProgress {
    pub completion: &'static str,
    pub needs_submit: bool,
    pub delegated: bool,
}

impl ReviewProgress {
    pub(crate) fn of(review: &ReviewRow) -> Self {
        let delegated =
            review.review_type == REVIEW_SECONDARY && !review.needs_submit && !review.submitted;
        let completion = if review.submitted {
            "Complete"
        } else if delegated {
            "Delegated"
        } else if review.modified {
            "In progress"
        } else {
            "Not started"
        };
        Self {
            completion,
            needs_submit: !review.submitted && review.needs_submit,
            delegated,
        }
    }
}

fn expertise_letter(expertise: Option<i32>) -> &'static str {
    match expertise {
        Some(2) => "X",
        Some(1) => "Y",
        Some(0) => "Z",
        _ => "",
    }
}

/// Text form of a preference, such as `2X` or `-1`.
pub(crate) fn unparse_preference(preference: Preference) -> String {
    format!("{}{}", preference.value, expertise_letter(preference.expertise))
}

/// Preference and topic score as a compact tagged span; empty when both are
/// neutral.
pub(crate) fn preference_span(preference: Preference, topic_score: Option<i32>) -> String {
    let topic_score = topic_score.filter(|score| *score != 0);
    if preference.is_empty() && topic_score.is_none() {
        return String::new();
    }
    let sign = match preference.value.signum() {
        1 => "p",
        -1 => "n",
        _ => "0",
    };
    let mut text = String::new();
    if !preference.is_empty() {
        text.push('P');
        text.push_str(&unparse_preference(preference));
    }
    if let Some(score) = topic_score {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&format!("T{score}"));
    }
    format!(" <span class=\"asspref{sign}\">{text}</span>")
}

/// Formats a Unix timestamp for display.
pub(crate) fn printable_time(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|time| time.format("%-d %b %Y %H:%M UTC").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_join_uses_serial_comma() {
        let names: Vec<String> = ["A", "B", "C"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(comma_join(&names[..1]), "A");
        assert_eq!(comma_join(&names[..2]), "A and B");
        assert_eq!(comma_join(&names), "A, B, and C");
    }

    #[test]
    fn preference_spans() {
        let preference = Preference {
            value: 2,
            expertise: Some(2),
        };
        assert_eq!(
            preference_span(preference, Some(3)),
            " <span class=\"assprefp\">P2X T3</span>"
        );
        assert_eq!(preference_span(Preference::default(), Some(0)), "");
        assert_eq!(
            preference_span(Preference::default(), Some(-2)),
            " <span class=\"asspref0\">T-2</span>"
        );
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(printable_time(0), "1 Jan 1970 00:00 UTC");
    }
}
