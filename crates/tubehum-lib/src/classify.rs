use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a fetch failed, as far as the extractor's error text tells us.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    AccessDenied,
    NotFound,
    RightsRestricted,
    FormatIncompatible,
    Timeout,
    Unclassified,
}

impl FailureClass {
    pub fn describe(self) -> &'static str {
        match self {
            FailureClass::AccessDenied => "access denied",
            FailureClass::NotFound => "not found",
            FailureClass::RightsRestricted => "rights restricted",
            FailureClass::FormatIncompatible => "format incompatible",
            FailureClass::Timeout => "timed out",
            FailureClass::Unclassified => "failed",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// Checked in order; the first class with a matching needle wins.
const RULES: &[(FailureClass, &[&str])] = &[
    (
        FailureClass::RightsRestricted,
        &[
            "copyright",
            "not available in your country",
            "geo restricted",
            "geo-restricted",
            "blocked it in your country",
        ],
    ),
    (
        FailureClass::AccessDenied,
        &[
            "http error 403",
            "403: forbidden",
            "forbidden",
            "http error 429",
            "too many requests",
            "private video",
            "video is private",
            "sign in to confirm",
            "login required",
            "members-only",
            "not a bot",
        ],
    ),
    (
        FailureClass::FormatIncompatible,
        &[
            "requested format is not available",
            "requested format not available",
            "no video formats found",
            "ffmpeg not found",
            "ffprobe and ffmpeg not found",
            "postprocessing",
            "conversion failed",
        ],
    ),
    (
        FailureClass::Timeout,
        &["timed out", "timeout"],
    ),
    (
        FailureClass::NotFound,
        &[
            "http error 404",
            "video unavailable",
            "this video is unavailable",
            "has been removed",
            "does not exist",
            "unsupported url",
            "unable to download webpage",
        ],
    ),
];

pub fn classify_failure(message: &str) -> FailureClass {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|needle| lower.contains(needle)))
        .map(|(class, _)| *class)
        .unwrap_or(FailureClass::Unclassified)
}

/// Pulls the most relevant line out of the extractor's error output: the
/// last `ERROR:` line with its prefix removed, or a bounded excerpt.
pub fn error_excerpt(message: &str) -> String {
    const MAX_CHARS: usize = 300;

    let last_error_line = message
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.to_lowercase().starts_with("error"));

    let excerpt = match last_error_line {
        Some(line) => line
            .strip_prefix("ERROR: ")
            .or_else(|| line.strip_prefix("ERROR:"))
            .or_else(|| line.strip_prefix("error: "))
            .unwrap_or(line)
            .trim(),
        None => message.trim(),
    };

    excerpt.chars().take(MAX_CHARS).collect()
}

/// Short human-readable reason shown for a failed item.
pub fn failure_reason(class: FailureClass, message: &str) -> String {
    let excerpt = error_excerpt(message);
    if excerpt.is_empty() {
        class.describe().to_string()
    } else {
        format!("{}: {}", class.describe(), excerpt)
    }
}
