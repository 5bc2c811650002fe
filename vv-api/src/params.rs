//! Query-string conventions
//!
//! Most endpoints accept a value either by name (`?channelnum=3`) or as
//! the bare first parameter (`?3`). File-name parameters fall back to the
//! whole decoded query string so paths with `:` and `\` survive.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde_json::{Map, Value};
use vv_common::index::TranslatedIndex;

use crate::error::{ApiError, ApiResult};

/// Decoded query pairs in request order
#[derive(Debug, Clone, Default)]
pub struct QueryParams(pub Vec<(String, String)>);

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::InvalidParameter(format!("Invalid query string: {}", e)))?;
        Ok(Self(pairs))
    }
}

impl QueryParams {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Key of the first parameter (`?3` → `"3"`)
    pub fn first_key(&self) -> Option<&str> {
        self.0.first().map(|(key, _)| key.as_str())
    }

    /// Key of the second parameter (`?1&true` → `"true"`)
    pub fn second_key(&self) -> Option<&str> {
        self.0.get(1).map(|(key, _)| key.as_str())
    }

    /// Decoded query string, reassembled from its pairs
    pub fn whole(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let joined = self
            .0
            .iter()
            .map(|(key, value)| {
                if value.is_empty() {
                    key.clone()
                } else {
                    format!("{}={}", key, value)
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        Some(joined)
    }

    /// `name=` when present (even if empty), else the whole query string.
    ///
    /// Empty results come back as `None`.
    pub fn named_or_whole(&self, name: &str) -> Option<String> {
        let value = match self.get(name) {
            Some(value) => Some(value.to_string()),
            None => self.whole(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// `name=` when present and non-empty, else the first key.
    pub fn named_or_first_key(&self, name: &str) -> Option<String> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .or_else(|| self.first_key())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Required 1-based index given by name or as the first parameter
    pub fn required_index(&self, name: &str) -> ApiResult<TranslatedIndex> {
        let raw = self.named_or_first_key(name).ok_or_else(|| {
            ApiError::MissingParameter(format!("Missing required query parameter: {}", name))
        })?;
        Ok(TranslatedIndex::parse(name, &raw)?)
    }

    /// Optional 1-based index, `default` when the query string is empty
    pub fn index_or(&self, name: &str, default: i64) -> ApiResult<TranslatedIndex> {
        match self.named_or_first_key(name) {
            Some(raw) => Ok(TranslatedIndex::parse(name, &raw)?),
            None => Ok(TranslatedIndex::parse(name, &default.to_string())?),
        }
    }

    /// Required integer given by name or as the first parameter
    pub fn required_integer(&self, name: &str) -> ApiResult<i64> {
        let raw = self.named_or_first_key(name).ok_or_else(|| {
            ApiError::MissingParameter(format!("Missing required query parameter: {}", name))
        })?;
        raw.trim()
            .parse()
            .map_err(|_| ApiError::InvalidParameter(format!("{} must be an integer", name)))
    }
}

/// Optional JSON object body; anything unparsable counts as absent
pub fn json_object(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// String field from a JSON body, then the query string; empty counts as absent
pub fn body_or_query(body: Option<&Map<String, Value>>, params: &QueryParams, name: &str) -> Option<String> {
    body.and_then(|b| b.get(name))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| params.get(name).filter(|s| !s.is_empty()).map(str::to_string))
}
