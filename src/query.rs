//! Query-string construction for the portal endpoints.
//!
//! Parameters keep insertion order. Absent values and empty strings are
//! dropped instead of being sent as `key=`.

use url::form_urlencoded;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Number(i64),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::Text(value.clone())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Number(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Number(i64::from(value))
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(&'static str, Option<QueryValue>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &'static str, value: impl Into<QueryValue>) -> Self {
        self.pairs.push((key, Some(value.into())));
        self
    }

    pub fn set_opt<V: Into<QueryValue>>(mut self, key: &'static str, value: Option<V>) -> Self {
        self.pairs.push((key, value.map(Into::into)));
        self
    }

    /// Parameters that will actually be sent, in order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        self.pairs
            .iter()
            .filter_map(|(key, value)| match value {
                Some(QueryValue::Text(s)) if s.is_empty() => None,
                Some(QueryValue::Text(s)) => Some((*key, s.clone())),
                Some(QueryValue::Number(n)) => Some((*key, n.to_string())),
                None => None,
            })
            .collect()
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omits_empty_and_absent() {
        let qs = QueryParams::new()
            .set("q", "currency")
            .set("product", "")
            .set_opt::<&str>("version", None)
            .set("to", 19i64)
            .to_query_string();
        assert_eq!(qs, "q=currency&to=19");
    }

    #[test]
    fn test_escapes_values() {
        let qs = QueryParams::new()
            .set("q", "a&b = c/d")
            .to_query_string();
        assert_eq!(qs, "q=a%26b+%3D+c%2Fd");
    }

    #[test]
    fn test_empty_params() {
        assert_eq!(QueryParams::new().to_query_string(), "");
    }

    #[test]
    fn test_deterministic_order() {
        let build = || {
            QueryParams::new()
                .set("b", "2")
                .set("a", "1")
                .to_query_string()
        };
        assert_eq!(build(), "b=2&a=1");
        assert_eq!(build(), build());
    }
}
