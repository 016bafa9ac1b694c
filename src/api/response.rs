//! Success response envelope.
//!
//! Every success payload is wrapped as `{message, data}`, the contract
//! the platform's frontend consumes.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope with a message and no payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let json = serde_json::to_value(ApiResponse::new("Success", vec![1, 2])).unwrap();
        assert_eq!(json["message"], "Success");
        assert_eq!(json["data"][1], 2);
    }

    #[test]
    fn message_only_envelope_has_null_data() {
        let json = serde_json::to_value(ApiResponse::message("Notification sent")).unwrap();
        assert!(json["data"].is_null());
    }
}
