//! Cookie storage.
//!
//! [`CookieBackend`] speaks the `document.cookie` protocol: reads see one
//! `name=value; name2=value2` string, writes apply a single `Set-Cookie`
//! style assignment. [`CookieDocument`] is that protocol; [`MemoryCookieJar`]
//! implements it in memory with browser semantics for expiry.
//!
//! Names and values are percent-encoded with the `encodeURIComponent` set
//! on write and decoded on read. Each pair is split at its first `=`, so
//! values containing `=` (base64 padding, for instance) survive.

use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// Expiry timestamp layout used in cookie assignments.
pub const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Expiry attribute written by a removal.
pub const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// The cookie document a [`CookieBackend`] reads and writes.
pub trait CookieDocument: Send + Sync {
    /// All live cookies as `name=value; name2=value2`.
    fn cookie_string(&self) -> String;

    /// Apply one assignment such as `name=value; path=/; secure`.
    fn write_cookie(&self, assignment: &str);
}

impl<D: CookieDocument + ?Sized> CookieDocument for Arc<D> {
    fn cookie_string(&self) -> String {
        (**self).cookie_string()
    }

    fn write_cookie(&self, assignment: &str) {
        (**self).write_cookie(assignment);
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Only sent on same-site requests.
    Strict,
    /// Sent on same-site requests and top-level navigations.
    Lax,
    /// Always sent. Browsers require `secure` with it.
    None,
}

impl SameSite {
    /// Attribute value as written in an assignment.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SameSite {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(StorageError::Internal(format!(
                "unknown same-site policy: {other}"
            ))),
        }
    }
}

/// When a cookie expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expires {
    /// At a fixed instant.
    At(DateTime<Utc>),
    /// This many days after the write.
    Days(i64),
}

/// Attributes applied to a cookie write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// Expiry. `None` makes a session cookie.
    pub expires: Option<Expires>,
    /// Lifetime in seconds.
    pub max_age: Option<i64>,
    /// Domain scope.
    pub domain: Option<String>,
    /// Path scope.
    pub path: Option<String>,
    /// Only send over HTTPS.
    pub secure: bool,
    /// Cross-site policy.
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// Options with no attributes (a session cookie).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire after `days` days.
    #[must_use]
    pub fn expires_in_days(mut self, days: i64) -> Self {
        self.expires = Some(Expires::Days(days));
        self
    }

    /// Expire at `at`.
    #[must_use]
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(Expires::At(at));
        self
    }

    /// Set `max-age` in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Scope to `domain`.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Scope to `path`.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Mark the cookie `secure`.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `SameSite` policy.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Percent-encode everything outside the `encodeURIComponent` unreserved set.
#[must_use]
pub fn encode_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric()
            || matches!(
                byte,
                b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
            )
        {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

/// Reverse [`encode_component`]. `None` on a malformed escape or invalid UTF-8.
#[must_use]
pub fn decode_component(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b == b'%' {
            let hex = s.get(i.checked_add(1)?..i.checked_add(3)?)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i = i.checked_add(3)?;
        } else {
            out.push(b);
            i = i.checked_add(1)?;
        }
    }
    String::from_utf8(out).ok()
}

/// Split a `name=value; ...` cookie string into raw pairs.
///
/// Each pair splits at its first `=`. A fragment without `=` is a cookie
/// with an empty name.
fn split_pairs(cookie_string: &str) -> impl Iterator<Item = (&str, &str)> {
    cookie_string
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.split_once('=').unwrap_or(("", part)))
}

fn format_expiry(at: DateTime<Utc>) -> String {
    at.format(EXPIRES_FORMAT).to_string()
}

fn parse_expiry(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), EXPIRES_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Build a `Set-Cookie` style assignment.
///
/// Attributes are written in the order expires, max-age, domain, path,
/// secure, samesite.
///
/// # Errors
///
/// Returns [`StorageError::Internal`] if a relative expiry overflows the
/// calendar.
pub fn build_assignment(name: &str, value: &str, options: &CookieOptions) -> StorageResult<String> {
    let mut out = format!("{}={}", encode_component(name), encode_component(value));

    if let Some(expires) = options.expires {
        let at = match expires {
            Expires::At(at) => at,
            Expires::Days(days) => TimeDelta::try_days(days)
                .and_then(|delta| Utc::now().checked_add_signed(delta))
                .ok_or_else(|| {
                    StorageError::Internal(format!("cookie expiry of {days} days out of range"))
                })?,
        };
        let _ = write!(out, "; expires={}", format_expiry(at));
    }
    if let Some(max_age) = options.max_age {
        let _ = write!(out, "; max-age={max_age}");
    }
    if let Some(domain) = &options.domain {
        let _ = write!(out, "; domain={domain}");
    }
    if let Some(path) = &options.path {
        let _ = write!(out, "; path={path}");
    }
    if options.secure {
        out.push_str("; secure");
    }
    if let Some(same_site) = options.same_site {
        let _ = write!(out, "; samesite={same_site}");
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// In-memory document
// ---------------------------------------------------------------------------

/// A cookie held by a [`MemoryCookieJar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    /// Name as written (encoded).
    pub name: String,
    /// Value as written (encoded).
    pub value: String,
    /// Absolute expiry, from `expires` or `max-age`.
    pub expires: Option<DateTime<Utc>>,
    /// Every attribute of the last assignment, verbatim and in order.
    pub attributes: Vec<String>,
}

impl StoredCookie {
    /// Value of attribute `name` (case-insensitive). Flags yield `""`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find_map(|attr| {
            let (key, value) = attr.split_once('=').unwrap_or((attr.as_str(), ""));
            key.trim().eq_ignore_ascii_case(name).then_some(value.trim())
        })
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}

/// In-memory cookie document with browser expiry semantics.
///
/// An assignment whose `expires` lies in the past or whose `max-age` is
/// zero or negative deletes the cookie. Cookies keep their creation order.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: RwLock<Vec<StoredCookie>>,
}

impl MemoryCookieJar {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The live cookie stored under the encoded `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<StoredCookie> {
        let now = Utc::now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.name == name && !c.is_expired(now))
            .cloned()
    }

    /// Number of live cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| !c.is_expired(now))
            .count()
    }

    /// Whether the jar holds no live cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieDocument for MemoryCookieJar {
    fn cookie_string(&self) -> String {
        let now = Utc::now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write_cookie(&self, assignment: &str) {
        let mut parts = assignment.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            warn!(assignment, "ignoring cookie assignment without '='");
            return;
        };
        let name = name.trim().to_owned();
        let value = value.trim().to_owned();
        let attributes: Vec<String> = parts
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();

        let now = Utc::now();
        let mut cookie = StoredCookie {
            name,
            value,
            expires: None,
            attributes,
        };
        // max-age wins over expires.
        let max_age = cookie
            .attribute("max-age")
            .and_then(|v| v.parse::<i64>().ok());
        cookie.expires = match max_age {
            Some(seconds) => Some(
                TimeDelta::try_seconds(seconds)
                    .and_then(|delta| now.checked_add_signed(delta))
                    .unwrap_or(if seconds > 0 {
                        DateTime::<Utc>::MAX_UTC
                    } else {
                        DateTime::<Utc>::MIN_UTC
                    }),
            ),
            None => cookie.attribute("expires").and_then(parse_expiry),
        };

        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        let existing = cookies.iter().position(|c| c.name == cookie.name);
        if cookie.is_expired(now) {
            if let Some(index) = existing {
                cookies.remove(index);
                trace!(name = %cookie.name, "cookie expired by assignment");
            }
            return;
        }
        match existing {
            Some(index) => {
                if let Some(slot) = cookies.get_mut(index) {
                    *slot = cookie;
                }
            },
            None => cookies.push(cookie),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Cookie-backed storage over a [`CookieDocument`].
#[derive(Debug, Clone)]
pub struct CookieBackend<D> {
    document: D,
    defaults: CookieOptions,
}

impl<D: CookieDocument> CookieBackend<D> {
    /// Wrap `document`, applying `defaults` to every plain `set_item`.
    pub fn new(document: D, defaults: CookieOptions) -> Self {
        Self { document, defaults }
    }

    /// The underlying document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Attributes used by `set_item`.
    pub fn defaults(&self) -> &CookieOptions {
        &self.defaults
    }

    /// Store `value` under `key` with explicit attributes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the expiry is out of range.
    pub fn set_with(&self, key: &str, value: &str, options: &CookieOptions) -> StorageResult<()> {
        let assignment = build_assignment(key, value, options)?;
        debug!(key, "writing cookie");
        self.document.write_cookie(&assignment);
        Ok(())
    }

    /// Every cookie in the document, decoded, in document order.
    ///
    /// Fragments that do not decode are passed through raw.
    pub fn entries(&self) -> Vec<(String, String)> {
        let cookie_string = self.document.cookie_string();
        split_pairs(&cookie_string)
            .map(|(name, value)| (decode_or_raw(name), decode_or_raw(value)))
            .collect()
    }

    /// Write an already-expired assignment for the cookie stored under
    /// `raw_name`, exactly as it appears in the cookie string.
    fn expire(&self, raw_name: &str) {
        let path = self.defaults.path.as_deref().unwrap_or("/");
        let mut assignment = format!("{raw_name}=; expires={EXPIRED}; path={path}");
        if let Some(domain) = &self.defaults.domain {
            let _ = write!(assignment, "; domain={domain}");
        }
        debug!(name = raw_name, "expiring cookie");
        self.document.write_cookie(&assignment);
    }
}

fn decode_or_raw(s: &str) -> String {
    decode_component(s).unwrap_or_else(|| {
        warn!(fragment = s, "cookie fragment is not valid percent-encoding");
        s.to_owned()
    })
}

impl<D: CookieDocument> StorageBackend for CookieBackend<D> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let cookie_string = self.document.cookie_string();
        let found = split_pairs(&cookie_string)
            .find(|(name, _)| decode_or_raw(name) == key)
            .map(|(_, value)| decode_or_raw(value));
        trace!(key, found = found.is_some(), "cookie read");
        Ok(found)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.set_with(key, value, &self.defaults)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let cookie_string = self.document.cookie_string();
        let encoded = encode_component(key);
        // Expire under the name the cookie is stored as, which another
        // writer may not have percent-encoded.
        let mut raw_names: Vec<&str> = split_pairs(&cookie_string)
            .map(|(name, _)| name)
            .filter(|name| decode_or_raw(name) == key)
            .collect();
        if raw_names.is_empty() {
            raw_names.push(&encoded);
        }
        for name in raw_names {
            self.expire(name);
        }
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let cookie_string = self.document.cookie_string();
        for (name, _) in split_pairs(&cookie_string) {
            self.expire(name);
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries().into_iter().map(|(name, _)| name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> CookieBackend<Arc<MemoryCookieJar>> {
        CookieBackend::new(Arc::new(MemoryCookieJar::new()), CookieOptions::new().path("/"))
    }

    #[test]
    fn test_encode_component_matches_uri_component_set() {
        assert_eq!(encode_component("abc-_.!~*'()"), "abc-_.!~*'()");
        assert_eq!(encode_component("a b=c;d"), "a%20b%3Dc%3Bd");
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("a%20b%3Dc").as_deref(), Some("a b=c"));
        assert_eq!(decode_component("%C3%A9").as_deref(), Some("é"));
        assert_eq!(decode_component("plain=value").as_deref(), Some("plain=value"));
        assert!(decode_component("%zz").is_none());
        assert!(decode_component("%4").is_none());
        assert!(decode_component("%FF").is_none());
    }

    #[test]
    fn test_split_pairs_uses_first_equals() {
        let pairs: Vec<_> = split_pairs("token=YWJj==; theme=dark").collect();
        assert_eq!(pairs, vec![("token", "YWJj=="), ("theme", "dark")]);
    }

    #[test]
    fn test_build_assignment_attribute_order() {
        let at = DateTime::parse_from_rfc3339("2030-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let options = CookieOptions::new()
            .same_site(SameSite::Strict)
            .secure(true)
            .path("/app")
            .domain("example.com")
            .max_age(60)
            .expires_at(at);
        assert_eq!(
            build_assignment("k", "v", &options).unwrap(),
            "k=v; expires=Wed, 02 Jan 2030 03:04:05 GMT; max-age=60; domain=example.com; \
             path=/app; secure; samesite=Strict"
        );
    }

    #[test]
    fn test_build_assignment_rejects_absurd_expiry() {
        let options = CookieOptions::new().expires_in_days(i64::MAX);
        assert!(build_assignment("k", "v", &options).is_err());
    }

    #[test]
    fn test_same_site_from_str() {
        assert_eq!("LAX".parse::<SameSite>().unwrap(), SameSite::Lax);
        assert_eq!("none".parse::<SameSite>().unwrap(), SameSite::None);
        assert!("sometimes".parse::<SameSite>().is_err());
    }

    #[test]
    fn test_jar_keeps_attributes() {
        let jar = MemoryCookieJar::new();
        jar.write_cookie("theme=dark; path=/; secure; samesite=Lax");
        let cookie = jar.get("theme").unwrap();
        assert_eq!(cookie.value, "dark");
        assert_eq!(cookie.attribute("path"), Some("/"));
        assert_eq!(cookie.attribute("secure"), Some(""));
        assert_eq!(cookie.attribute("SameSite"), Some("Lax"));
        assert!(cookie.attribute("domain").is_none());
    }

    #[test]
    fn test_jar_past_expiry_deletes() {
        let jar = MemoryCookieJar::new();
        jar.write_cookie("a=1");
        jar.write_cookie("b=2");
        jar.write_cookie(&format!("a=; expires={EXPIRED}; path=/"));
        assert_eq!(jar.cookie_string(), "b=2");
    }

    #[test]
    fn test_jar_non_positive_max_age_deletes() {
        let jar = MemoryCookieJar::new();
        jar.write_cookie("a=1");
        jar.write_cookie("a=1; max-age=0");
        assert!(jar.is_empty());
        jar.write_cookie("a=1; max-age=-5");
        assert!(jar.is_empty());
    }

    #[test]
    fn test_jar_overwrite_keeps_position() {
        let jar = MemoryCookieJar::new();
        jar.write_cookie("a=1");
        jar.write_cookie("b=2");
        jar.write_cookie("a=3");
        assert_eq!(jar.cookie_string(), "a=3; b=2");
    }

    #[test]
    fn test_backend_round_trip_with_equals() {
        let store = backend();
        store.set_item("token", "YWJjZA==").unwrap();
        assert_eq!(
            store.get_item("token").unwrap().as_deref(),
            Some("YWJjZA==")
        );
        assert_eq!(store.document().get("token").unwrap().value, "YWJjZA%3D%3D");
    }

    #[test]
    fn test_backend_encodes_names_and_values() {
        let store = backend();
        store.set_item("my key", "a; b").unwrap();
        assert_eq!(store.get_item("my key").unwrap().as_deref(), Some("a; b"));
        assert_eq!(store.keys().unwrap(), vec!["my key"]);
    }

    #[test]
    fn test_backend_reads_unencoded_cookie() {
        let store = backend();
        store.document().write_cookie("legacy=100%");
        assert_eq!(store.get_item("legacy").unwrap().as_deref(), Some("100%"));
    }

    #[test]
    fn test_backend_remove_and_clear() {
        let store = backend();
        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        store.remove_item("a").unwrap();
        assert!(!store.has("a").unwrap());
        assert!(store.has("b").unwrap());

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
        assert!(store.document().is_empty());
    }

    #[test]
    fn test_backend_removes_foreign_token_names() {
        let store = backend();
        store.document().write_cookie("app|theme=dark; path=/");
        store.document().write_cookie("a$b=1; path=/");
        store.document().write_cookie("x+y=2; path=/");
        assert_eq!(store.keys().unwrap(), vec!["app|theme", "a$b", "x+y"]);

        store.remove_item("app|theme").unwrap();
        assert!(!store.has("app|theme").unwrap());
        assert!(store.document().get("app|theme").is_none());

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(store.document().cookie_string(), "");
    }

    #[test]
    fn test_backend_defaults_applied() {
        let jar = Arc::new(MemoryCookieJar::new());
        let store = CookieBackend::new(
            Arc::clone(&jar),
            CookieOptions::new()
                .expires_in_days(7)
                .path("/")
                .same_site(SameSite::Lax),
        );
        store.set_item("theme", "dark").unwrap();
        let cookie = jar.get("theme").unwrap();
        assert!(cookie.expires.unwrap() > Utc::now());
        assert_eq!(cookie.attribute("samesite"), Some("Lax"));
    }

    #[test]
    fn test_backend_set_with_overrides_defaults() {
        let store = backend();
        store
            .set_with("session", "abc", &CookieOptions::new().secure(true))
            .unwrap();
        let cookie = store.document().get("session").unwrap();
        assert_eq!(cookie.attribute("secure"), Some(""));
        assert!(cookie.attribute("path").is_none());
        assert!(cookie.expires.is_none());
    }

    #[test]
    fn test_backend_entries_decoded() {
        let store = backend();
        store.set_item("x", "1 2").unwrap();
        store.set_item("y", "{\"a\":1}").unwrap();
        assert_eq!(
            store.entries(),
            vec![
                ("x".to_owned(), "1 2".to_owned()),
                ("y".to_owned(), "{\"a\":1}".to_owned()),
            ]
        );
    }
}
