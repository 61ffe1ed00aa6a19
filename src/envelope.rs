// src/envelope.rs
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

/// The wrapper every endpoint answers with. `error` is set exactly when
/// `success` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            success: true,
            error: None,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            data: T::default(),
            success: false,
            error: Some(message.into()),
            timestamp: None,
        }
    }

    /// Splits into the payload or the reported error message.
    pub fn into_result(self) -> Result<T, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.error.unwrap_or_else(|| "Request failed".to_string()))
        }
    }
}

/// Turns a handler outcome into the enveloped reply with its status code.
pub fn reply<T>(result: Result<T, ApiError>) -> WithStatus<Json>
where
    T: Serialize + Default,
{
    match result {
        Ok(data) => warp::reply::with_status(
            warp::reply::json(&ApiResponse::ok(data)),
            StatusCode::OK,
        ),
        Err(e) => warp::reply::with_status(
            warp::reply::json(&ApiResponse::<T>::failure(e.to_string())),
            e.status(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_twice_differs_only_in_timestamp() {
        let data = vec![1.5, 2.5];
        let first = ApiResponse::ok(data.clone());
        let second = ApiResponse::ok(data);
        assert_eq!(first.data, second.data);
        assert_eq!(first.success, second.success);
        assert!(first.timestamp.is_some() && second.timestamp.is_some());
    }

    #[test]
    fn failure_carries_error_and_empty_data() {
        let env: ApiResponse<Vec<u32>> = ApiResponse::failure("boom");
        assert!(!env.success);
        assert!(env.data.is_empty());
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["error"], "boom");
        assert!(json.get("timestamp").is_none());
        assert_eq!(env.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn success_omits_error_field() {
        let json = serde_json::to_value(ApiResponse::ok(3)).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["success"], true);
    }

    #[test]
    fn reply_maps_error_kinds_to_status() {
        use warp::Reply;
        let bad = reply::<Vec<u8>>(Err(ApiError::Validation("nope".into())));
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);
        let broken = reply::<Vec<u8>>(Err(ApiError::Internal("nope".into())));
        assert_eq!(
            broken.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let fine = reply(Ok(vec![1u8]));
        assert_eq!(fine.into_response().status(), StatusCode::OK);
    }
}
