//! Parsing and validation of submitted forms.
//!
//! Every mutation arrives as flat key/value pairs ([`FormData`]). Each
//! submodule turns those pairs into a typed, validated value or a
//! [`FieldErrors`] map keyed by the form field that failed.

pub mod address;
pub mod customer;
pub mod email;
pub mod invoice;
pub mod payment;
pub mod project;
pub mod services;
pub mod vacation;
pub mod work_log;
pub mod worker;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Validation messages per form field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Absorb another set of errors, prefixing their keys (`address.street`).
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            let key = format!("{prefix}.{field}");
            self.0.entry(key).or_default().extend(messages);
        }
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Submitted form pairs, in submission order.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, trimmed; empty values count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Trimmed value for `key`, or an empty string.
    pub fn text_or_empty(&self, key: &str) -> String {
        self.text(key).unwrap_or_default()
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// A checkbox is checked when its key was submitted at all.
    pub fn checked(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Accepts `YYYY-MM-DD` as well as an RFC 3339 timestamp's date part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = match value.find('T') {
        Some(10) => &value[..10],
        _ => value,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

pub fn parse_uuid(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}

/// Reads a required UUID field, recording `message` when it is absent or malformed.
pub(crate) fn required_id(
    form: &FormData,
    key: &str,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<Uuid> {
    match form.text(key).as_deref().and_then(parse_uuid) {
        Some(id) => Some(id),
        None => {
            errors.add(key, message);
            None
        }
    }
}

/// Reads a required non-empty text field.
pub(crate) fn required_text(
    form: &FormData,
    key: &str,
    message: &str,
    errors: &mut FieldErrors,
) -> String {
    let value = form.text_or_empty(key);
    if value.is_empty() {
        errors.add(key, message);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn text_trims_and_drops_blank_values() {
        let data = form(&[("name", "  Ole  "), ("phone", "   ")]);
        assert_eq!(data.text("name").as_deref(), Some("Ole"));
        assert_eq!(data.text("phone"), None);
        assert_eq!(data.text("missing"), None);
    }

    #[test]
    fn get_all_keeps_submission_order() {
        let data = form(&[("workerIds", "a"), ("name", "x"), ("workerIds", "b")]);
        assert_eq!(data.get_all("workerIds"), vec!["a", "b"]);
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("kunde@firma.dk"));
        assert!(!is_valid_email("kunde@firma"));
        assert!(!is_valid_email("@firma.dk"));
        assert!(!is_valid_email("kunde firma@firma.dk"));
        assert!(!is_valid_email("a@b@c.dk"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 3);
        assert_eq!(parse_date("2024-06-03"), expected);
        assert_eq!(parse_date("2024-06-03T08:00:00.000Z"), expected);
        assert_eq!(parse_date("03-06-2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn numbers_reject_non_finite() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn prefixed_merge_and_display() {
        let mut errors = FieldErrors::single("name", "Name is required.");
        errors.merge_prefixed("address", FieldErrors::single("city", "City is required."));

        assert!(errors.contains("address.city"));
        assert_eq!(
            errors.to_string(),
            "address.city: City is required.; name: Name is required."
        );
    }
}
