//! Query-string encoding for list requests.

use std::fmt::{Display, Formatter};

/// Ordered query parameters. Keys with empty values are never stored, so they
/// are omitted from the wire rather than sent as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value` unless `value` is empty.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.0.push((key.into(), value));
        }
        self
    }

    /// Adds `key=value` only when `keep` holds.
    pub fn param_if(self, keep: bool, key: impl Into<String>, value: impl ToString) -> Self {
        if keep { self.param(key, value) } else { self }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Percent-encoded `?k=v&k2=v2`, or an empty string when there are no
    /// parameters.
    pub fn to_query_string(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let joined = self
            .0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{joined}")
    }
}

impl Display for QueryParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_render_nothing() {
        assert_eq!(QueryParams::new().to_query_string(), "");
    }

    #[test]
    fn empty_values_are_omitted() {
        let params = QueryParams::new().param("count", 20).param("query", "");
        assert_eq!(params.to_query_string(), "?count=20");
        assert_eq!(params.get("query"), None);
    }

    #[test]
    fn keys_and_values_are_percent_encoded() {
        let params = QueryParams::new()
            .param("count", 20)
            .param("query", "chili & beans");
        assert_eq!(params.to_query_string(), "?count=20&query=chili%20%26%20beans");
    }

    #[test]
    fn conditional_params() {
        let params = QueryParams::new()
            .param_if(false, "skip", 0)
            .param_if(true, "count", 5);
        assert_eq!(params.get("skip"), None);
        assert_eq!(params.to_query_string(), "?count=5");
    }
}
