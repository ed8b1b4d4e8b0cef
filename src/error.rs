use std::collections::BTreeMap;

use iron::status::{self, Status};
use rustc_serialize::json::{Json, ToJson};
use thiserror::Error;

/// Everything a store operation can reject.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid or missing post data")]
    Validation,

    #[error("Post with id:{0} not found.")]
    NotFound(u64),

    #[error("invalid sort field: {0}")]
    InvalidField(String),

    #[error("invalid sort direction: {0}")]
    InvalidDirection(String),
}

impl StoreError {
    pub fn status(&self) -> Status {
        match *self {
            StoreError::NotFound(_) => status::NotFound,
            _ => status::BadRequest,
        }
    }
}

/// The body clients see. Not-found uses a `message` key, everything else `error`.
impl ToJson for StoreError {
    fn to_json(&self) -> Json {
        let (key, text) = match *self {
            StoreError::Validation => ("error", self.to_string()),
            StoreError::NotFound(_) => ("message", self.to_string()),
            StoreError::InvalidField(_) => ("error", "Invalid sort field".to_string()),
            StoreError::InvalidDirection(_) => ("error", "Invalid sort direction".to_string()),
        };
        let mut object = BTreeMap::new();
        object.insert(key.to_string(), Json::String(text));
        Json::Object(object)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_the_id() {
        let err = StoreError::NotFound(9);
        assert_eq!(err.status(), status::NotFound);
        assert_eq!(err.to_json().to_string(), r#"{"message":"Post with id:9 not found."}"#);
    }

    #[test]
    fn sort_errors_are_bad_requests() {
        let err = StoreError::InvalidDirection("sideways".to_string());
        assert_eq!(err.status(), status::BadRequest);
        assert_eq!(err.to_json().to_string(), r#"{"error":"Invalid sort direction"}"#);
    }
}
