//! Lexical checks for primitive values.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

use crate::config::ModelConfig;
use crate::types::{Primitive, PrimitiveKind, PrimitiveValue};

pub const MAX_STRING_LENGTH: usize = 1024 * 1024;

const MAX_ID_LENGTH: usize = 64;

/// Compiled patterns for the regex-described primitive types
struct PrimitivePatterns {
    decimal: Regex,
    date: Regex,
    date_time: Regex,
    instant: Regex,
    time: Regex,
    oid: Regex,
    uuid: Regex,
}

static PATTERNS: OnceCell<PrimitivePatterns> = OnceCell::new();

const YEAR: &str = r"([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)";
const CLOCK: &str = r"([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?";
const ZONE: &str = r"(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00))";
const MONTH: &str = r"(0[1-9]|1[0-2])";
const DAY: &str = r"(0[1-9]|[1-2][0-9]|3[0-1])";

impl PrimitivePatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            decimal: Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$")?,
            date: Regex::new(&format!("^{YEAR}(-{MONTH}(-{DAY})?)?$"))?,
            date_time: Regex::new(&format!(
                "^{YEAR}(-{MONTH}(-{DAY}(T{CLOCK}{ZONE})?)?)?$"
            ))?,
            instant: Regex::new(&format!("^{YEAR}-{MONTH}-{DAY}T{CLOCK}{ZONE}$"))?,
            time: Regex::new(&format!("^{CLOCK}$"))?,
            oid: Regex::new(r"^urn:oid:[0-2](\.(0|[1-9][0-9]*))+$")?,
            uuid: Regex::new(
                r"^urn:uuid:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
            )?,
        })
    }

    fn get() -> Result<&'static Self, regex::Error> {
        PATTERNS.get_or_try_init(Self::compile)
    }
}

/// Check a primitive's lexical form; returns the violation message, if any.
pub fn check_primitive(primitive: &Primitive, config: &ModelConfig) -> Option<String> {
    let kind = primitive.kind();
    match primitive.value() {
        PrimitiveValue::Boolean(_) => None,
        PrimitiveValue::Integer(value) => check_integer(kind, *value),
        PrimitiveValue::Text(text) => check_text(kind, text, config),
    }
}

fn check_integer(kind: PrimitiveKind, value: i64) -> Option<String> {
    let minimum = match kind {
        PrimitiveKind::UnsignedInt => 0,
        PrimitiveKind::PositiveInt => 1,
        _ => i64::from(i32::MIN),
    };
    if value < minimum {
        return Some(format!(
            "Integer value: {value} is less than minimum required value: {minimum}"
        ));
    }
    if value > i64::from(i32::MAX) {
        return Some(format!("Integer value: {value} exceeds the 32-bit range"));
    }
    None
}

fn check_text(kind: PrimitiveKind, text: &str, config: &ModelConfig) -> Option<String> {
    let patterns = match PrimitivePatterns::get() {
        Ok(patterns) => patterns,
        Err(e) => return Some(format!("Primitive pattern unavailable: {e}")),
    };

    match kind {
        PrimitiveKind::String | PrimitiveKind::Markdown => check_string(text, config),
        PrimitiveKind::Code => check_code(text),
        PrimitiveKind::Id => check_id(text),
        PrimitiveKind::Uri | PrimitiveKind::Canonical => check_uri(text),
        PrimitiveKind::Url => check_uri(text).or_else(|| {
            Url::parse(text)
                .err()
                .map(|e| format!("Url value: '{text}' is not an absolute URL: {e}"))
        }),
        PrimitiveKind::Oid => check_pattern(&patterns.oid, text, "oid"),
        PrimitiveKind::Uuid => check_pattern(&patterns.uuid, text, "uuid"),
        PrimitiveKind::Decimal => check_pattern(&patterns.decimal, text, "decimal"),
        PrimitiveKind::Date => {
            check_pattern(&patterns.date, text, "date").or_else(|| check_calendar(text))
        }
        PrimitiveKind::DateTime => {
            check_pattern(&patterns.date_time, text, "dateTime").or_else(|| check_calendar(text))
        }
        PrimitiveKind::Instant => {
            check_pattern(&patterns.instant, text, "instant").or_else(|| check_calendar(text))
        }
        PrimitiveKind::Time => check_pattern(&patterns.time, text, "time"),
        PrimitiveKind::Base64Binary => check_base64(text),
        PrimitiveKind::Boolean
        | PrimitiveKind::Integer
        | PrimitiveKind::UnsignedInt
        | PrimitiveKind::PositiveInt => Some(format!("{kind} value stored as text: '{text}'")),
    }
}

fn check_string(s: &str, config: &ModelConfig) -> Option<String> {
    if s.len() > MAX_STRING_LENGTH {
        return Some(format!(
            "String value length: {} is greater than maximum allowed length: {}",
            s.len(),
            MAX_STRING_LENGTH
        ));
    }

    let mut non_whitespace = 0usize;
    for ch in s.chars() {
        if !ch.is_whitespace() {
            non_whitespace += 1;
            if config.check_control_characters && is_unsupported_control(ch) {
                return Some(format!(
                    "String value contains unsupported control character: U+{:04X}",
                    ch as u32
                ));
            }
        } else if !matches!(ch, ' ' | '\t' | '\r' | '\n') {
            return Some(format!(
                "String value contains illegal whitespace character: U+{:04X}",
                ch as u32
            ));
        }
    }

    if non_whitespace == 0 {
        return Some("String value must contain at least one non-whitespace character".into());
    }
    None
}

/// Control characters below U+0020 other than tab, LF and CR.
fn is_unsupported_control(ch: char) -> bool {
    (ch as u32) < 0x20 && !matches!(ch, '\t' | '\n' | '\r')
}

fn check_code(s: &str) -> Option<String> {
    let Some(first) = s.chars().next() else {
        return Some("Code value must not be empty".into());
    };
    if first.is_whitespace() {
        return Some(format!(
            "Code value: '{s}' must begin with a non-whitespace character"
        ));
    }
    if s.chars().last().is_some_and(char::is_whitespace) {
        return Some(format!(
            "Code value: '{s}' must end with a non-whitespace character"
        ));
    }

    let mut previous_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if ch != ' ' {
                return Some(format!(
                    "Code value: '{s}' must not contain whitespace other than a single space"
                ));
            }
            if previous_space {
                return Some(format!("Code value: '{s}' must not contain consecutive spaces"));
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
    }
    None
}

fn check_id(s: &str) -> Option<String> {
    if s.is_empty() {
        return Some("Id value must not be empty".into());
    }
    if s.len() > MAX_ID_LENGTH {
        return Some(format!(
            "Id value length: {} is greater than maximum allowed length: {}",
            s.len(),
            MAX_ID_LENGTH
        ));
    }
    s.chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
        .map(|c| format!("Id value: '{s}' contains invalid character '{c}'"))
}

fn check_uri(s: &str) -> Option<String> {
    if s.len() > MAX_STRING_LENGTH {
        return Some(format!(
            "Uri value length: {} is greater than maximum allowed length: {}",
            s.len(),
            MAX_STRING_LENGTH
        ));
    }
    if s.chars().any(char::is_whitespace) {
        return Some(format!("Uri value: '{s}' must not contain whitespace"));
    }
    None
}

fn check_pattern(pattern: &Regex, s: &str, type_name: &str) -> Option<String> {
    if pattern.is_match(s) {
        None
    } else {
        Some(format!("Invalid {type_name} value: '{s}'"))
    }
}

/// Full dates (`YYYY-MM-DD` prefix) must exist in the calendar.
fn check_calendar(s: &str) -> Option<String> {
    let prefix = s.get(..10)?;
    if prefix.as_bytes().get(7) != Some(&b'-') {
        return None;
    }
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .err()
        .map(|_| format!("Date value: '{s}' is not a valid calendar date"))
}

fn check_base64(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    if bytes.len() % 4 != 0 {
        return Some(format!("Invalid base64 string length: {}", bytes.len()));
    }

    let padding = bytes.iter().rev().take_while(|&&b| b == b'=').count();
    if padding > 2 {
        return Some("Invalid base64 padding".into());
    }

    let body = &bytes[..bytes.len() - padding];
    if let Some(&b) = body.iter().find(|&&b| base64_index(b).is_none()) {
        return Some(format!("Invalid base64 character: '{}'", b as char));
    }

    // Bits past the last full byte must be zero
    if let Some(&last) = body.last() {
        let index = base64_index(last).unwrap_or(0);
        let unused_mask = match padding {
            1 => 0b0000_0011,
            2 => 0b0000_1111,
            _ => 0,
        };
        if index & unused_mask != 0 {
            return Some("Invalid base64 padding bits".into());
        }
    }
    None
}

fn base64_index(b: u8) -> Option<u8> {
    match b {
        b'A'..=b'Z' => Some(b - b'A'),
        b'a'..=b'z' => Some(b - b'a' + 26),
        b'0'..=b'9' => Some(b - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(kind: PrimitiveKind, text: &str) -> Option<String> {
        check_primitive(&Primitive::text(kind, text).unwrap(), &ModelConfig::default())
    }

    #[test]
    fn test_string_rules() {
        assert!(check(PrimitiveKind::String, "hello world").is_none());
        assert!(check(PrimitiveKind::String, "   ").is_some());
        assert!(check(PrimitiveKind::String, "bell\u{7}").is_some());
        assert!(check(PrimitiveKind::String, "nbsp\u{a0}here").is_some());

        let relaxed = ModelConfig::default().with_control_character_checks(false);
        let bell = Primitive::string("bell\u{7}");
        assert!(check_primitive(&bell, &relaxed).is_none());
    }

    #[test]
    fn test_code_rules() {
        assert!(check(PrimitiveKind::Code, "entered-in-error").is_none());
        assert!(check(PrimitiveKind::Code, "two words").is_none());
        assert!(check(PrimitiveKind::Code, " leading").is_some());
        assert!(check(PrimitiveKind::Code, "double  space").is_some());
        assert!(check(PrimitiveKind::Code, "tab\there").is_some());
    }

    #[test]
    fn test_id_and_uri() {
        assert!(check(PrimitiveKind::Id, "abc-123.x").is_none());
        assert!(check(PrimitiveKind::Id, "bad_id").is_some());
        assert!(check(PrimitiveKind::Id, &"a".repeat(65)).is_some());
        assert!(check(PrimitiveKind::Uri, "http://x/codes").is_none());
        assert!(check(PrimitiveKind::Uri, "http://x/ codes").is_some());
        assert!(check(PrimitiveKind::Url, "relative/path").is_some());
        assert!(check(PrimitiveKind::Oid, "urn:oid:1.2.3").is_none());
        assert!(check(PrimitiveKind::Uuid, "urn:uuid:not-a-uuid").is_some());
    }

    #[test]
    fn test_temporal_rules() {
        assert!(check(PrimitiveKind::Date, "2024").is_none());
        assert!(check(PrimitiveKind::Date, "2024-02").is_none());
        assert!(check(PrimitiveKind::Date, "2024-02-29").is_none());
        assert!(check(PrimitiveKind::Date, "2023-02-29").is_some());
        assert!(check(PrimitiveKind::DateTime, "2024-01-01T10:00:00Z").is_none());
        assert!(check(PrimitiveKind::DateTime, "2024-01-01T10:00:00").is_some());
        assert!(check(PrimitiveKind::Instant, "2024-01-01").is_some());
        assert!(check(PrimitiveKind::Time, "23:59:60").is_none());
        assert!(check(PrimitiveKind::Time, "24:00:00").is_some());
    }

    #[test]
    fn test_numeric_rules() {
        assert!(check(PrimitiveKind::Decimal, "1.50").is_none());
        assert!(check(PrimitiveKind::Decimal, "01.5").is_some());
        let config = ModelConfig::default();
        assert!(check_primitive(&Primitive::positive_int(0), &config).is_some());
        assert!(check_primitive(&Primitive::unsigned_int(0), &config).is_none());
        assert!(check_primitive(&Primitive::integer(i64::from(i32::MAX) + 1), &config).is_some());
    }

    #[test]
    fn test_base64_rules() {
        assert!(check(PrimitiveKind::Base64Binary, "aGVsbG8=").is_none());
        assert!(check(PrimitiveKind::Base64Binary, "aGVsbG8").is_some());
        assert!(check(PrimitiveKind::Base64Binary, "aGVsbG9=").is_some());
        assert!(check(PrimitiveKind::Base64Binary, "a*==").is_some());
    }
}
