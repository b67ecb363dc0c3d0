//! Success/error envelope shared by every endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const STATUS_ERROR: &str = "error";
const STATUS_SUCCESS: &str = "success";

/// A decoded backend reply: either the endpoint's payload or a rejection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply<T> {
    Success(T),
    Error { reason: String },
}

#[derive(Deserialize)]
struct Marker {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Split a raw JSON reply into payload or rejection.
///
/// Only an explicit `"status": "error"` counts as a rejection; a reply with no
/// status marker is decoded as a payload.
pub fn decode_reply<T: DeserializeOwned>(value: Value) -> Result<Reply<T>, serde_json::Error> {
    let marker = Marker::deserialize(&value)?;
    if marker.status.as_deref() == Some(STATUS_ERROR) {
        return Ok(Reply::Error {
            reason: marker.reason.unwrap_or_else(|| "unknown error".to_string()),
        });
    }
    Ok(Reply::Success(serde_json::from_value(value)?))
}

impl<T: Serialize> Reply<T> {
    /// Encode the reply the way the backend sends it.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            Reply::Success(payload) => {
                let mut object = match serde_json::to_value(payload)? {
                    Value::Object(object) => object,
                    Value::Null => Map::new(),
                    other => {
                        let mut object = Map::new();
                        object.insert("value".into(), other);
                        object
                    }
                };
                object.insert("status".into(), Value::String(STATUS_SUCCESS.into()));
                Ok(Value::Object(object))
            }
            Reply::Error { reason } => Ok(serde_json::json!({
                "status": STATUS_ERROR,
                "reason": reason,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CreateTokenResponse, VoteResponse};
    use serde_json::json;

    #[test]
    fn error_marker_becomes_rejection() {
        let reply: Reply<CreateTokenResponse> = decode_reply(json!({
            "status": "error",
            "reason": "affiliation_token not matched",
            "token": null
        }))
        .unwrap();
        assert_eq!(
            reply,
            Reply::Error {
                reason: "affiliation_token not matched".into()
            }
        );
    }

    #[test]
    fn error_without_reason_gets_placeholder() {
        let reply: Reply<VoteResponse> = decode_reply(json!({ "status": "error" })).unwrap();
        assert_eq!(
            reply,
            Reply::Error {
                reason: "unknown error".into()
            }
        );
    }

    #[test]
    fn success_payload_ignores_envelope_fields() {
        let reply: Reply<CreateTokenResponse> = decode_reply(json!({
            "status": "success",
            "reason": null,
            "token": "abc"
        }))
        .unwrap();
        assert_eq!(
            reply,
            Reply::Success(CreateTokenResponse {
                token: "abc".into()
            })
        );
    }

    #[test]
    fn success_payload_missing_fields_is_a_decode_error() {
        let result: Result<Reply<CreateTokenResponse>, _> =
            decode_reply(json!({ "status": "success" }));
        assert!(result.is_err());
    }

    #[test]
    fn encoded_success_carries_status_marker() {
        let value = Reply::Success(VoteResponse {}).to_json().unwrap();
        assert_eq!(value, json!({ "status": "success" }));
    }
}
