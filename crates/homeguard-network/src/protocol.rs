//! Remote channel messages.
//!
//! One JSON object per line in each direction:
//!
//! ```text
//! -> {"device":"Fan","param":"Speed","value":3}
//! <- {"ok":true,"value":3}
//! -> {"device":"Fan","param":"Speed","value":9}
//! <- {"ok":false,"error":"Invalid fan speed: 9 (expected 0-5)"}
//! ```

use homeguard_core::ParamValue;
use serde::{Deserialize, Serialize};

/// A parameter write from the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub device: String,
    pub param: String,
    pub value: ParamValue,
}

/// Acknowledgement of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteResponse {
    pub fn ack(value: ParamValue) -> Self {
        Self {
            ok: true,
            value: Some(value),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            value: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_value_types() {
        let req: RemoteRequest =
            serde_json::from_str(r#"{"device":"Light","param":"Power","value":true}"#).unwrap();
        assert_eq!(req.value, ParamValue::Bool(true));

        let req: RemoteRequest =
            serde_json::from_str(r#"{"device":"Fan","param":"Speed","value":3}"#).unwrap();
        assert_eq!(req.value, ParamValue::Int(3));

        let req: RemoteRequest = serde_json::from_str(
            r#"{"device":"Security","param":"Set Password","value":"1234"}"#,
        )
        .unwrap();
        assert_eq!(req.value, ParamValue::from("1234"));
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let ack = serde_json::to_string(&RemoteResponse::ack(ParamValue::Int(3))).unwrap();
        assert_eq!(ack, r#"{"ok":true,"value":3}"#);

        let err = serde_json::to_string(&RemoteResponse::error("nope")).unwrap();
        assert_eq!(err, r#"{"ok":false,"error":"nope"}"#);
    }
}
