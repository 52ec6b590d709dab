//! Conversions from CMS field values to metaobject field strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// Text form of a pass-through value: strings verbatim, `null` as empty,
/// numbers and booleans as displayed, composites as JSON.
pub(crate) fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Blank values carry no content: `null`, scalars other than non-empty
/// strings, and empty strings, arrays and objects.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Falsy values are `null`, `false`, zero and the empty string.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `["id1","id2"]`: the list form used for nested metaobject references.
pub(crate) fn quoted_id_list<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = ids
        .into_iter()
        .map(|id| format!("\"{}\"", id.as_ref()))
        .collect();
    format!("[{}]", quoted.join(","))
}

/// `[a,b]`: the list form used for asset ids and dates.
pub(crate) fn bracket_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    format!("[{}]", items.join(","))
}

/// Normalizes a date value to a UTC timestamp with millisecond precision
/// (`2024-05-01T10:00:00.000Z`).
///
/// Accepts RFC 3339 strings, naive date-times and plain dates (read as
/// UTC), and epoch milliseconds.
pub(crate) fn to_iso_timestamp(value: &Value) -> Option<String> {
    let parsed: DateTime<Utc> = match value {
        Value::String(s) => parse_date_str(s.trim())?,
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?)?,
        _ => return None,
    };
    Some(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// The `(_content_type_uid, uid)` of a reference pointer; missing members
/// read as empty.
pub(crate) fn reference_pointer(value: &Value) -> (&str, &str) {
    let text = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or_default();
    (text("_content_type_uid"), text("uid"))
}

/// A storefront link value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct LinkValue<'a> {
    pub text: &'a str,
    pub url: &'a str,
}

/// A CMS `{title, href}` pair with both members non-empty.
pub(crate) fn link_value(value: &Value) -> Option<LinkValue<'_>> {
    let text = value.get("title").and_then(Value::as_str).filter(|s| !s.is_empty())?;
    let url = value.get("href").and_then(Value::as_str).filter(|s| !s.is_empty())?;
    Some(LinkValue { text, url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_string_forms() {
        assert_eq!(coerce_string(&json!(null)), "");
        assert_eq!(coerce_string(&json!("T")), "T");
        assert_eq!(coerce_string(&json!(42)), "42");
        assert_eq!(coerce_string(&json!(4.0)), "4");
        assert_eq!(coerce_string(&json!(4.5)), "4.5");
        assert_eq!(coerce_string(&json!(true)), "true");
        assert_eq!(coerce_string(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn blank_and_truthy() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(is_blank(&json!(5)));
        assert!(!is_blank(&json!("2024-01-01")));
        assert!(!is_blank(&json!([{"uid": "x"}])));

        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({"uid": "a"})));
    }

    #[test]
    fn id_lists() {
        assert_eq!(quoted_id_list(["a", "b"]), r#"["a","b"]"#);
        assert_eq!(quoted_id_list(Vec::<String>::new()), "[]");
        assert_eq!(bracket_list(["g1", "g2"]), "[g1,g2]");
    }

    #[test]
    fn iso_timestamps() {
        assert_eq!(
            to_iso_timestamp(&json!("2024-05-01T10:00:00+02:00")).as_deref(),
            Some("2024-05-01T08:00:00.000Z")
        );
        assert_eq!(
            to_iso_timestamp(&json!("2024-05-01T10:00:00.5Z")).as_deref(),
            Some("2024-05-01T10:00:00.500Z")
        );
        assert_eq!(
            to_iso_timestamp(&json!("2024-05-01")).as_deref(),
            Some("2024-05-01T00:00:00.000Z")
        );
        assert_eq!(
            to_iso_timestamp(&json!(0)).as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
        assert_eq!(to_iso_timestamp(&json!("not a date")), None);
        assert_eq!(to_iso_timestamp(&json!({})), None);
    }

    #[test]
    fn link_requires_title_and_href() {
        assert_eq!(
            link_value(&json!({"title": "Shop", "href": "/shop"})),
            Some(LinkValue { text: "Shop", url: "/shop" })
        );
        assert_eq!(link_value(&json!({"title": "", "href": "/shop"})), None);
        assert_eq!(link_value(&json!({"title": "Shop"})), None);
    }
}
