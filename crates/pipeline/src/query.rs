//! Mirroring of the filter/sort selection to and from a URL query string.
//!
//! Filters are written as repeated `<filter id>=<value>` pairs, the sort as
//! `sort=<param>` and `direction=asc|desc`. Keys the registry does not know
//! are left for other consumers (tabs, durations) and ignored here.

use meshlens_core::ListItem;
use tracing::debug;

use crate::descriptor::{Registry, SortDescriptor};
use crate::filter::ActiveFilter;

pub const SORT_KEY: &str = "sort";
pub const DIRECTION_KEY: &str = "direction";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<ActiveFilter>,
    /// URL param code of the sort field.
    pub sort: Option<String>,
    pub ascending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self { filters: Vec::new(), sort: None, ascending: true }
    }
}

impl ListQuery {
    pub fn parse<T: ListItem>(query: &str, registry: &Registry<T>) -> Self {
        let mut out = ListQuery::default();
        for (key, value) in pairs(query) {
            match key.as_str() {
                SORT_KEY => match registry.sort(&value) {
                    Some(field) => out.sort = Some(field.param.to_string()),
                    None => debug!(sort = %value, kind = %registry.kind, "query: unknown sort ignored"),
                },
                DIRECTION_KEY => out.ascending = !value.eq_ignore_ascii_case("desc"),
                _ if registry.filter(&key).is_some() => out.filters.push(ActiveFilter::new(key.clone(), value)),
                _ => {}
            }
        }
        out
    }

    /// Selected sort field, falling back to the registry default.
    pub fn sort_field<T: 'static>(&self, registry: &Registry<T>) -> &'static SortDescriptor<T> {
        self.sort.as_deref().and_then(|p| registry.sort(p)).unwrap_or_else(|| registry.default_sort())
    }

    /// Serialize back; filters are written in registry order.
    pub fn to_query_string<T: 'static>(&self, registry: &Registry<T>) -> String {
        let mut parts: Vec<String> = Vec::new();
        for desc in registry.filters.iter() {
            for af in self.filters.iter().filter(|af| af.category == desc.id) {
                parts.push(format!("{}={}", encode(desc.id), encode(&af.value)));
            }
        }
        if let Some(sort) = &self.sort {
            parts.push(format!("{}={}", SORT_KEY, encode(sort)));
        }
        parts.push(format!("{}={}", DIRECTION_KEY, if self.ascending { "asc" } else { "desc" }));
        parts.join("&")
    }
}

/// Decoded `key=value` pairs of a query string (leading `?` optional).
pub fn pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(p), String::new()),
        })
}

/// First value of `key` in `query`.
pub fn param(query: &str, key: &str) -> Option<String> {
    pairs(query).find(|(k, _)| k == key).map(|(_, v)| v)
}

fn hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Percent-decoding with `+` as space; malformed escapes are kept verbatim.
pub fn decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                    (Some(h), Some(l)) => {
                        out.push(h << 4 | l);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
