use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use thiserror::Error;
use url::form_urlencoded;

/// A query component that does not decode to UTF-8.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Query parameter is not valid UTF-8: {0}")]
pub struct InvalidEncoding(pub String);

/// Ordered query-parameter multimap.
///
/// Keys keep the position of their first appearance; each key owns its own
/// value list, so a clone shares nothing with the original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// Components that do not decode to UTF-8 are refused rather than
    /// replaced lossily.
    pub fn parse(raw: Option<&str>) -> Result<Self, InvalidEncoding> {
        let mut params = Self::new();
        for pair in raw.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.append(decode(key, pair)?, decode(value, pair)?);
        }
        Ok(params)
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replaces every value stored under `key` with a single `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn values_mut(&mut self, key: &str) -> Option<&mut Vec<String>> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Flattened `(key, value)` pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}

fn decode(component: &str, pair: &str) -> Result<String, InvalidEncoding> {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| InvalidEncoding(pair.to_string()))
}

/// Deep copy of the inbound parameters for a single forwarded request.
pub fn copy_parameters(inbound: &QueryParams) -> QueryParams {
    QueryParams {
        entries: inbound
            .entries
            .iter()
            .map(|(key, values)| (key.clone(), values.to_vec()))
            .collect(),
    }
}
