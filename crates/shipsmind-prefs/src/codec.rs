//! JSON envelopes used by the preferences endpoint.
//!
//! Every response body is one of two shapes:
//!
//! ```text
//! { "success": true, "data": { ...preferences... } }
//! { "error": "Unauthorized", "details": [ ... ] }
//! ```
//!
//! Decoding turns the second shape (or any non-2xx status) into a
//! [`Failure`] so the retry layer can classify it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shipsmind_retry::Failure;

use crate::RawResponse;

/// Serializes a request body.
pub fn encode_body<T: Serialize>(value: &T) -> Result<String, Failure> {
    serde_json::to_string(value).map_err(|e| Failure::Other(format!("failed to encode request: {e}")))
}

/// Decodes a response into the `data` of a success envelope.
///
/// - non-2xx status → [`Failure::Http`] carrying the envelope's `error`
/// - 2xx with an `error` field and no `data` → [`Failure::Other`]
/// - a body that isn't an envelope → [`Failure::Other`]
pub fn decode_response<T: DeserializeOwned>(response: &RawResponse) -> Result<T, Failure> {
    let body: Option<Value> = serde_json::from_str(&response.body).ok();

    if !response.is_success() {
        let message = body.as_ref().and_then(error_message);
        return Err(Failure::Http {
            status: response.status,
            message,
        });
    }

    let Some(mut body) = body else {
        return Err(Failure::Other("response body is not valid JSON".into()));
    };

    match body.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => serde_json::from_value(data)
            .map_err(|e| Failure::Other(format!("unexpected response data: {e}"))),
        _ => Err(Failure::Other(
            error_message(&body).unwrap_or_else(|| "response has no data".into()),
        )),
    }
}

fn error_message(body: &Value) -> Option<String> {
    body.get("error").and_then(Value::as_str).map(str::to_string)
}
