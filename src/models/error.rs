use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Exception = 1,
}

/// Error payload returned with 401 and 500 responses. Never carries the
/// underlying error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
    pub source: String,
    pub creation_date: DateTime<Utc>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            source: source.into(),
            creation_date: Utc::now(),
        }
    }

    pub fn internal(source: impl Into<String>) -> Self {
        Self::new(ErrorCode::Exception, "Internal server error: Exception", source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_body_is_an_exception_without_details() {
        let body = serde_json::to_value(ErrorBody::internal("visit")).unwrap();

        assert_eq!(body["code"], 1);
        assert_eq!(body["message"], "Internal server error: Exception");
        assert_eq!(body["source"], "visit");
        assert!(body["creationDate"].is_string());
    }
}
