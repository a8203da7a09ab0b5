//! Shareable URL form of a [`FilterSpec`].
//!
//! Keys: `q` (query), `cat`, `mat`, `price` (comma-joined ids), `page` and
//! `per`. Only values that differ from the defaults are written, so the
//! default filter encodes to an empty string.

use std::collections::BTreeSet;

use url::form_urlencoded;

use crate::filter::{FilterSpec, DEFAULT_PAGE_SIZE};

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

fn split(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl FilterSpec {
    /// Encode as an `application/x-www-form-urlencoded` query (no leading `?`).
    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.query.is_empty() {
            out.append_pair("q", &self.query);
        }
        if !self.categories.is_empty() {
            out.append_pair("cat", &join(&self.categories));
        }
        if !self.materials.is_empty() {
            out.append_pair("mat", &join(&self.materials));
        }
        if !self.price_ranges.is_empty() {
            out.append_pair("price", &join(&self.price_ranges));
        }
        if self.page != 1 {
            out.append_pair("page", &self.page.to_string());
        }
        if self.page_size != DEFAULT_PAGE_SIZE {
            out.append_pair("per", &self.page_size.to_string());
        }
        out.finish()
    }

    /// Decode a query string, with or without a leading `?`. Unknown keys and
    /// unparseable numbers fall back to defaults.
    pub fn from_query(raw: &str) -> Self {
        let mut spec = FilterSpec::default();
        let raw = raw.strip_prefix('?').unwrap_or(raw);

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "q" => spec.query = value.into_owned(),
                "cat" => spec.categories = split(&value),
                "mat" => spec.materials = split(&value),
                "price" => spec.price_ranges = split(&value),
                "page" => {
                    if let Ok(page) = value.trim().parse::<usize>() {
                        spec.page = page.max(1);
                    }
                }
                "per" => {
                    if let Some(size) = value.trim().parse::<usize>().ok().filter(|n| *n > 0) {
                        spec.page_size = size;
                    }
                }
                _ => {}
            }
        }
        spec
    }
}

/// Keeps a [`FilterSpec`] and the address bar in step without ping-pong.
///
/// Remembers the last query string that both sides agreed on. URL edits are
/// applied only when they decode to a different spec, and local changes ask
/// for a URL rewrite only when their encoding is new.
#[derive(Debug, Clone, Default)]
pub struct UrlSync {
    synced: String,
}

impl UrlSync {
    pub fn new(current: &FilterSpec) -> Self {
        Self {
            synced: current.to_query(),
        }
    }

    /// The URL changed from outside. Returns the filter to adopt, or `None`
    /// when it already matches `current`.
    pub fn on_url_change(&mut self, raw: &str, current: &FilterSpec) -> Option<FilterSpec> {
        let incoming = FilterSpec::from_query(raw);
        self.synced = incoming.to_query();
        (incoming != *current).then_some(incoming)
    }

    /// Local state changed. Returns the query string to write to the URL, or
    /// `None` when the URL already reflects `current`.
    pub fn on_state_change(&mut self, current: &FilterSpec) -> Option<String> {
        let encoded = current.to_query();
        if encoded == self.synced {
            return None;
        }
        self.synced = encoded.clone();
        Some(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_spec() -> FilterSpec {
        let mut spec = FilterSpec::default();
        spec.set_query("anillo de plata & oro");
        spec.toggle_category("Anillos");
        spec.toggle_category("Collares");
        spec.toggle_material("Oro");
        spec.toggle_price_range("r1");
        spec.toggle_price_range("r3");
        spec.page = 2;
        spec.page_size = 12;
        spec
    }

    #[test]
    fn test_default_spec_encodes_to_nothing() {
        assert_eq!(FilterSpec::default().to_query(), "");
        assert_eq!(FilterSpec::from_query(""), FilterSpec::default());
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let spec = busy_spec();
        let encoded = spec.to_query();
        assert_eq!(FilterSpec::from_query(&encoded), spec);
        assert_eq!(FilterSpec::from_query(&format!("?{encoded}")), spec);
    }

    #[test]
    fn test_encoding_is_readable() {
        let mut spec = FilterSpec::default();
        spec.toggle_category("Anillos");
        spec.toggle_price_range("r2");
        spec.page = 3;
        assert_eq!(spec.to_query(), "cat=Anillos&price=r2&page=3");
    }

    #[test]
    fn test_junk_values_fall_back_to_defaults() {
        let spec = FilterSpec::from_query("page=abc&per=0&cat=,,&utm_source=x");
        assert_eq!(spec, FilterSpec::default());

        assert_eq!(FilterSpec::from_query("page=0").page, 1);
    }

    #[test]
    fn test_url_echo_does_not_loop() {
        let mut local = FilterSpec::default();
        let mut sync = UrlSync::new(&local);

        local.toggle_category("Anillos");
        let written = sync.on_state_change(&local).unwrap();

        // The router reports the URL we just wrote.
        assert_eq!(sync.on_url_change(&written, &local), None);
        assert_eq!(sync.on_state_change(&local), None);
    }

    #[test]
    fn test_external_edit_is_adopted_once() {
        let mut local = FilterSpec::default();
        let mut sync = UrlSync::new(&local);

        let adopted = sync.on_url_change("?mat=Oro&page=2", &local).unwrap();
        assert_eq!(adopted.page, 2);
        assert!(adopted.materials.contains("Oro"));
        local = adopted;

        // Applying it locally must not trigger a rewrite.
        assert_eq!(sync.on_state_change(&local), None);
    }
}
