//! Scanner for `var name = value;` literals embedded in page scripts.
//!
//! The detail page ships its episode list, watch position and airing info
//! as JavaScript assignments rather than markup. Each helper here locates
//! the assignment by its literal prefix, slices up to the next `;` and
//! interprets the slice. The `;` search is naive: a semicolon inside a
//! string literal ends the value early.

use chrono::NaiveDate;

use crate::error::ScrapeError;

/// Field of `anime_info` holding the next air date.
const ANIME_INFO_DATE_FIELD: usize = 3;

/// Return the trimmed right-hand side of `var {name} = ...;`.
pub fn assignment<'a>(text: &'a str, name: &str) -> Result<&'a str, ScrapeError> {
    let token = format!("var {name}");
    let mut from = 0;

    while let Some(pos) = text[from..].find(&token) {
        let after = from + pos + token.len();
        // `var episodes_list` must not match `var episodes`.
        if let Some(value) = text[after..].trim_start().strip_prefix('=') {
            let end = value
                .find(';')
                .ok_or_else(|| ScrapeError::Unterminated(name.to_string()))?;
            return Ok(value[..end].trim());
        }
        from = after;
    }

    Err(ScrapeError::MissingMarker(name.to_string()))
}

/// Split an array literal into its top-level comma-separated tokens.
///
/// Nested brackets are not tracked: `[[1,2],[3,4]]` yields four tokens.
pub fn array_tokens(literal: &str) -> Vec<&str> {
    let inner = literal
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(',').collect()
}

/// Episode count from `var episodes`.
///
/// Each episode is stored as a `[number, id]` pair, so the count is half
/// the token count.
pub fn episodes_count(text: &str) -> Result<u32, ScrapeError> {
    let literal = assignment(text, "episodes")?;
    let tokens = array_tokens(literal).len();
    u32::try_from(tokens / 2).map_err(|_| ScrapeError::InvalidValue {
        name: "episodes".into(),
        value: format!("{tokens} tokens"),
    })
}

/// Index of the last episode the user marked as seen, from `var last_seen`.
pub fn last_seen(text: &str) -> Result<u32, ScrapeError> {
    let literal = assignment(text, "last_seen")?;
    literal.parse().map_err(|_| ScrapeError::InvalidValue {
        name: "last_seen".into(),
        value: literal.to_string(),
    })
}

/// Next air date from `var anime_info`.
///
/// The literal looks like `["4132","Title","slug","2024-05-12"]`; fields are
/// separated on `,"` and the fourth one is the date. Returns `Ok(None)` when
/// the field is absent or not a `YYYY-MM-DD` date.
pub fn next_air_date(text: &str) -> Result<Option<NaiveDate>, ScrapeError> {
    let literal = assignment(text, "anime_info")?;
    let Some(field) = literal.split(",\"").nth(ANIME_INFO_DATE_FIELD) else {
        return Ok(None);
    };

    let raw = field.trim_matches(|c: char| c == '"' || c == '[' || c == ']' || c.is_whitespace());
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Ok(Some(date)),
        Err(_) => {
            tracing::debug!(value = raw, "anime_info date field is not a date");
            Ok(None)
        }
    }
}
