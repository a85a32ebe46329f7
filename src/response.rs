//! Typed hub replies and their decoders.
//!
//! Every reply goes through [`decode_with`]: the raw string is parsed, the
//! conventional base fields are read, and an extension closure adds whatever
//! the operation requires on top of them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Error code of the internal-bridge-error response.
pub const INTERNAL_BRIDGE_ERROR_CODE: i64 = -1;

/// Error message of the internal-bridge-error response.
pub const INTERNAL_BRIDGE_ERROR_MESSAGE: &str =
    "Internal bridge error, the call did not complete. See the bridge log for details.";

/// Fields every hub reply carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse {
    /// `0` on success.
    pub error_code: i64,
    pub error_message: String,
    pub message: String,
    /// Operation specific payload, passed through as decoded.
    pub data: Value,
}

impl BaseResponse {
    /// The response returned when any phase of a call fails.
    pub fn internal_bridge_error() -> Self {
        Self {
            error_code: INTERNAL_BRIDGE_ERROR_CODE,
            error_message: INTERNAL_BRIDGE_ERROR_MESSAGE.to_string(),
            message: String::new(),
            data: Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_code != 0
    }

    pub fn is_internal_bridge_error(&self) -> bool {
        self.error_code == INTERNAL_BRIDGE_ERROR_CODE
    }
}

/// Reply of an operation that inserts a record on the hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsertionResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    /// Hub-side id of the inserted record. `0` only on the internal-bridge-error
    /// response.
    pub id: i64,
}

impl InsertionResponse {
    pub fn internal_bridge_error() -> Self {
        Self {
            base: BaseResponse::internal_bridge_error(),
            id: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.base.is_error()
    }

    pub fn is_internal_bridge_error(&self) -> bool {
        self.base.is_internal_bridge_error()
    }
}

pub type InsertDiscordMessageResponse = InsertionResponse;
pub type InsertMailResponse = InsertionResponse;
pub type DirectSendMailResponse = InsertionResponse;
pub type GetMailStatusResponse = BaseResponse;

// Absent and null base fields both fall back to defaults.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBaseFields {
    error_code: Option<i64>,
    error_message: Option<String>,
    message: Option<String>,
    data: Option<Value>,
}

/// Parse a raw reply, decode its base fields, then hand both to `extend`.
///
/// # Errors
/// [`Error::MalformedJson`] if `raw` is not JSON, [`Error::MalformedResponse`]
/// if it is not an object or a base field has the wrong type, plus whatever
/// `extend` returns.
pub fn decode_with<T>(
    raw: &str,
    extend: impl FnOnce(BaseResponse, &Map<String, Value>) -> Result<T>,
) -> Result<T> {
    let value: Value = serde_json::from_str(raw).map_err(Error::MalformedJson)?;

    let fields = value.as_object().ok_or_else(|| {
        Error::MalformedResponse(format!("expected a JSON object, got {}", json_kind(&value)))
    })?;

    let raw_base = RawBaseFields::deserialize(&value)
        .map_err(|e| Error::MalformedResponse(format!("invalid base fields: {e}")))?;

    let base = BaseResponse {
        error_code: raw_base.error_code.unwrap_or_default(),
        error_message: raw_base.error_message.unwrap_or_default(),
        message: raw_base.message.unwrap_or_default(),
        data: raw_base.data.unwrap_or_default(),
    };

    extend(base, fields)
}

/// Decode a reply that only carries the base fields.
pub fn decode_base(raw: &str) -> Result<BaseResponse> {
    decode_with(raw, |base, _| Ok(base))
}

/// Decode a reply that must also carry the non-empty id of the inserted
/// record. `entity` names the record in the error message.
pub fn decode_insertion(raw: &str, entity: &str) -> Result<InsertionResponse> {
    decode_with(raw, |base, fields| {
        let id = parse_id(fields.get("id"), entity)?;
        Ok(InsertionResponse { base, id })
    })
}

// Absent, null, empty and zero ids are missing. Integers, integral floats and
// numeric strings are accepted, anything else is invalid.
fn parse_id(value: Option<&Value>, entity: &str) -> Result<i64> {
    let missing =
        || Error::MalformedResponse(format!("Inserted {entity} id is missing in response"));

    let value = match value {
        None | Some(Value::Null) => return Err(missing()),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(missing()),
        Some(value) => value,
    };

    let id = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        Error::MalformedResponse(format!("Inserted {entity} id is not a valid integer: {value}"))
    })?;

    if id == 0 { Err(missing()) } else { Ok(id) }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
