use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::{LoggerError, Result};

/// Token that replaces the whole value under a sensitive field name.
pub const MASK_TOKEN: &str = "***";

/// Upper bound on full pattern passes over one string.
const MAX_PATTERN_PASSES: usize = 16;

/// Field names whose values are always masked (exact, case-sensitive).
pub const SENSITIVE_FIELDS: &[&str] = &[
    // Authentication
    "password",
    "token",
    "secret",
    "apiKey",
    "accessToken",
    "refreshToken",
    "sessionToken",
    // Personal data
    "email",
    "phone",
    "phoneNumber",
    "name",
    "surname",
    "fullName",
    // Identifiers
    "userId",
    "uid",
    "sessionId",
    "deviceId",
    // Financial
    "creditCard",
    "cardNumber",
    "cvv",
    "iban",
    // Health
    "patientId",
    "medicalRecord",
    "diagnosis",
    "personalHealthInfo",
];

/// Built-in content patterns as `(name, regex, replacement)`, in application order.
const DEFAULT_PATTERN_TABLE: &[(&str, &str, &str)] = &[
    (
        "email",
        r"\b[A-Za-z0-9._%+-]+@(?P<domain>[A-Za-z0-9.-]+\.[A-Z|a-z]{2,})\b",
        "***@${domain}",
    ),
    (
        "phone_national",
        r"(\+39|0039)?\s?([0-9]{2,3}\s?[0-9]{6,7}|[0-9]{3}\s?[0-9]{7})",
        "[PHONE_REDACTED]",
    ),
    ("phone_international", r"\+[1-9]\d{1,14}", "[PHONE_REDACTED]"),
    (
        "credit_card",
        r"\b(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|3(?:0[0-5]|[68][0-9])[0-9]{11}|6(?:011|5[0-9]{2})[0-9]{12})\b",
        "[CARD_REDACTED]",
    ),
    (
        "tax_id",
        r"[A-Z]{6}[0-9]{2}[ABCDEHLMPRST][0-9]{2}[A-Z][0-9]{3}[A-Z]",
        "[CF_REDACTED]",
    ),
    (
        "iban",
        r"\b[A-Z]{2}[0-9]{2}[A-Z0-9]{4}[0-9]{7}[A-Z0-9]{0,16}\b",
        "[IBAN_REDACTED]",
    ),
    (
        "bearer_token",
        r"eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_.+/=-]*",
        "[TOKEN_REDACTED]",
    ),
];

lazy_static! {
    static ref DEFAULT_PATTERNS: Vec<RedactionPattern> = DEFAULT_PATTERN_TABLE
        .iter()
        .map(|(name, pattern, replacement)| {
            RedactionPattern::new(*name, pattern, *replacement)
                .expect("built-in redaction patterns are valid")
        })
        .collect();
}

/// A named content pattern with its replacement template.
///
/// The template uses `regex` replacement syntax, so named groups can be
/// carried over (`${domain}`).
#[derive(Debug, Clone)]
pub struct RedactionPattern {
    name: String,
    matcher: Regex,
    replacement: String,
}

impl RedactionPattern {
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let matcher = Regex::new(pattern).map_err(|source| LoggerError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            matcher,
            replacement: replacement.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Replaces every non-overlapping match.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.matcher.replace_all(text, self.replacement.as_str())
    }
}

/// Field-name masking plus pattern scrubbing over JSON-shaped payloads.
#[derive(Debug, Clone)]
pub struct Redactor {
    sensitive_fields: HashSet<String>,
    patterns: Vec<RedactionPattern>,
}

impl Redactor {
    pub fn new(
        sensitive_fields: impl IntoIterator<Item = impl Into<String>>,
        patterns: Vec<RedactionPattern>,
    ) -> Self {
        Self {
            sensitive_fields: sensitive_fields.into_iter().map(Into::into).collect(),
            patterns,
        }
    }

    pub fn default_patterns() -> Vec<RedactionPattern> {
        DEFAULT_PATTERNS.clone()
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.sensitive_fields.insert(field.into());
        self
    }

    /// Appends a pattern; it runs after every pattern already registered.
    pub fn with_pattern(mut self, pattern: RedactionPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn is_sensitive_field(&self, field: &str) -> bool {
        self.sensitive_fields.contains(field)
    }

    pub fn patterns(&self) -> &[RedactionPattern] {
        &self.patterns
    }

    /// Runs every pattern in order, each over the previous output, and
    /// repeats the pass until the text stops changing.
    ///
    /// A replacement can open a word boundary that an earlier pattern needs
    /// (`x@a.com12345678` only exposes the email once the digits are gone),
    /// so a single pass is not enough.
    pub fn sanitize_str(&self, text: &str) -> String {
        let mut result = text.to_string();
        for _ in 0..MAX_PATTERN_PASSES {
            match self.pattern_pass(&result) {
                Some(next) if next != result => result = next,
                _ => break,
            }
        }
        result
    }

    /// One ordered pass; `None` when no pattern matched.
    fn pattern_pass(&self, text: &str) -> Option<String> {
        let mut result: Option<String> = None;
        for pattern in &self.patterns {
            let current = result.as_deref().unwrap_or(text);
            let replaced = match pattern.apply(current) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(replaced) => replaced,
            };
            result = Some(replaced);
        }
        result
    }

    pub fn sanitize(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.sanitize_str(text)),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.sanitize(item)).collect()),
            Value::Object(fields) => Value::Object(self.sanitize_map(fields)),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }

    fn sanitize_map(&self, fields: &Map<String, Value>) -> Map<String, Value> {
        fields
            .iter()
            .map(|(key, value)| {
                // Masked wholesale: the subtree is dropped, not descended into.
                let sanitized = if self.is_sensitive_field(key) {
                    Value::String(MASK_TOKEN.to_string())
                } else {
                    self.sanitize(value)
                };
                (key.clone(), sanitized)
            })
            .collect()
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(SENSITIVE_FIELDS.iter().copied(), Self::default_patterns())
    }
}
