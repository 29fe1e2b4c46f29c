//! Cookie jar plumbing shared by the relay endpoints.
//!
//! The jar is the only session state in the system and it never lives
//! server-side: the client submits it with every request and gets the
//! (possibly updated) jar back in every response. Canonical wire form is a
//! JSON name→value object; a raw `"a=1; b=2"` header string is accepted on
//! input for older frontend revisions and converted at the boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A transient name→value cookie mapping.
///
/// Duplicate names resolve last-write-wins, both when parsing a raw header
/// string and when absorbing `Set-Cookie` values. Values are split from
/// names on the first `=` only, so base64-like values keep their padding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar(BTreeMap<String, String>);

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Absorb another jar, overwriting on name collision.
    pub fn merge(&mut self, other: CookieJar) {
        self.0.extend(other.0);
    }

    /// Format the jar for an outbound `Cookie` header:
    /// `name1=value1; name2=value2`. An empty jar yields an empty string.
    pub fn to_header_value(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Parse a semicolon-delimited `Cookie` header string.
    ///
    /// Each pair splits on its first `=`; entries without a `=` are
    /// dropped. Later duplicates overwrite earlier ones.
    pub fn from_header_str(raw: &str) -> Self {
        let mut jar = Self::new();
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    jar.insert(name, value.trim());
                }
            }
        }
        jar
    }

    /// Build a jar from raw `Set-Cookie` header values, keeping only the
    /// `name=value` pair before the first attribute delimiter (`Path`,
    /// `HttpOnly`, `Expires` and friends are ignored). Later headers
    /// overwrite earlier ones.
    pub fn from_set_cookie_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = Self::new();
        for raw in values {
            let pair = raw.split(';').next().unwrap_or("");
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    jar.insert(name, value.trim());
                }
            }
        }
        jar
    }

    /// Best-effort session-id lookup.
    ///
    /// Evaluates [`SESSION_ID_RULES`] in priority order against every cookie
    /// name. May return nothing; callers must treat the result as optional
    /// metadata, never as a required value.
    pub fn session_id(&self) -> Option<&str> {
        for rule in SESSION_ID_RULES {
            for (name, value) in self.iter() {
                if rule.matches(name) {
                    return Some(value);
                }
            }
        }
        None
    }
}

impl FromIterator<(String, String)> for CookieJar {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single session-id match rule, all case-insensitive.
#[derive(Debug, Clone, Copy)]
pub enum MatchRule {
    /// Cookie name equals this string
    Exact(&'static str),
    /// Cookie name starts with this string
    Prefix(&'static str),
    /// Cookie name contains this substring
    Contains(&'static str),
}

impl MatchRule {
    fn matches(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        match self {
            Self::Exact(target) => name == target.to_ascii_lowercase(),
            Self::Prefix(target) => name.starts_with(&target.to_ascii_lowercase()),
            Self::Contains(target) => name.contains(&target.to_ascii_lowercase()),
        }
    }
}

/// Session-id match rules, evaluated in priority order: well-known framework
/// session cookies first, the site-specific id, then any `SESS*` cookie,
/// and finally anything that merely mentions "session".
pub const SESSION_ID_RULES: &[MatchRule] = &[
    MatchRule::Exact("PHPSESSID"),
    MatchRule::Exact("JSESSIONID"),
    MatchRule::Exact("HCSERVICES_SESSID"),
    MatchRule::Prefix("SESS"),
    MatchRule::Contains("session"),
];

/// Inbound cookie form: either the canonical JSON object or a raw
/// `"a=1; b=2"` header string from older frontend revisions.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CookieJarInput {
    Map(BTreeMap<String, String>),
    Raw(String),
}

impl From<CookieJarInput> for CookieJar {
    fn from(input: CookieJarInput) -> Self {
        match input {
            CookieJarInput::Map(map) => CookieJar(map),
            CookieJarInput::Raw(raw) => CookieJar::from_header_str(&raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_then_parse_round_trips() {
        let mut jar = CookieJar::new();
        jar.insert("PHPSESSID", "abc123");
        jar.insert("token", "dG9rZW49PQ==");
        jar.insert("lang", "en");

        let formatted = jar.to_header_value();
        assert_eq!(CookieJar::from_header_str(&formatted), jar);
    }

    #[test]
    fn test_value_splits_on_first_equals_only() {
        let jar = CookieJar::from_header_str("token=a=b=c");
        assert_eq!(jar.get("token"), Some("a=b=c"));
    }

    #[test]
    fn test_duplicate_name_last_write_wins() {
        let jar = CookieJar::from_header_str("a=1; a=2");
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("a"), Some("2"));
    }

    #[test]
    fn test_empty_jar_formats_to_empty_string() {
        assert_eq!(CookieJar::new().to_header_value(), "");
        assert!(CookieJar::from_header_str("").is_empty());
    }

    #[test]
    fn test_entries_without_equals_are_dropped() {
        let jar = CookieJar::from_header_str("a=1; garbage; b=2");
        assert_eq!(jar.len(), 2);
        assert_eq!(jar.get("b"), Some("2"));
    }

    #[test]
    fn test_set_cookie_attributes_are_ignored() {
        let jar = CookieJar::from_set_cookie_values([
            "JSESSIONID=abc; Path=/; HttpOnly",
            "lang=en; Expires=Wed, 21 Oct 2026 07:28:00 GMT",
        ]);
        assert_eq!(jar.get("JSESSIONID"), Some("abc"));
        assert_eq!(jar.get("lang"), Some("en"));
        assert_eq!(jar.session_id(), Some("abc"));
    }

    #[test]
    fn test_later_set_cookie_header_overwrites_earlier() {
        let jar = CookieJar::from_set_cookie_values(["sid=old; Path=/", "sid=new; Path=/"]);
        assert_eq!(jar.get("sid"), Some("new"));
    }

    #[test]
    fn test_session_id_prefers_exact_rules_over_fallback() {
        let mut jar = CookieJar::new();
        jar.insert("app_session_token", "fallback");
        jar.insert("phpsessid", "primary");
        assert_eq!(jar.session_id(), Some("primary"));
    }

    #[test]
    fn test_session_id_contains_fallback() {
        let mut jar = CookieJar::new();
        jar.insert("wordpress_session_1a2b", "w");
        assert_eq!(jar.session_id(), Some("w"));
    }

    #[test]
    fn test_session_id_absent_when_nothing_matches() {
        let mut jar = CookieJar::new();
        jar.insert("theme", "dark");
        assert_eq!(jar.session_id(), None);
    }

    #[test]
    fn test_raw_input_form_converts_to_map() {
        let input: CookieJarInput = serde_json::from_str(r#""a=1; b=2""#).unwrap();
        let jar = CookieJar::from(input);
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("2"));
    }

    #[test]
    fn test_map_input_form_is_canonical() {
        let input: CookieJarInput = serde_json::from_str(r#"{"PHPSESSID":"x"}"#).unwrap();
        let jar = CookieJar::from(input);
        assert_eq!(jar.get("PHPSESSID"), Some("x"));
    }

    #[test]
    fn test_merge_overwrites_on_collision() {
        let mut jar = CookieJar::from_header_str("a=1; b=2");
        jar.merge(CookieJar::from_header_str("b=3; c=4"));
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("3"));
        assert_eq!(jar.get("c"), Some("4"));
    }

    #[test]
    fn test_merge_with_empty_jar_is_identity() {
        let mut jar = CookieJar::from_header_str("PHPSESSID=abc; lang=en");
        let before = jar.clone();
        jar.merge(CookieJar::new());
        assert_eq!(jar, before);
    }
}
