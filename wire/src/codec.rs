//! Protobuf codec for [`Frame`](crate::Frame).
//!
//! JSON text frames are the primary encoding; this codec exists for binary
//! transports that want compact frames. Payloads stay flexible
//! (`serde_json::Value`) and map onto `prost_types::Value` on the wire.

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;

use prost::Message;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Frame, Status};

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf frame.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `status` integer on the wire does not map to a known [`Status`].
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
    /// An id field on the wire is not a valid UUID string.
    #[error("invalid frame id: {0}")]
    InvalidId(#[from] uuid::Error),
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = WireFrame {
        id: frame.id.to_string(),
        parent_id: frame.parent_id.map(|id| id.to_string()),
        ts: frame.ts,
        session_id: frame.session_id.clone(),
        from: frame.from.clone(),
        event: frame.event.clone(),
        status: status_to_i32(frame.status),
        data: Some(json_to_proto(&frame.data)),
    };

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot fail.
    wire.encode(&mut out).unwrap_or_default();
    out
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes,
/// [`CodecError::InvalidStatus`] for out-of-range status values, and
/// [`CodecError::InvalidId`] for non-UUID id fields.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    Ok(Frame {
        id: wire.id.parse::<Uuid>()?,
        parent_id: wire.parent_id.as_deref().map(str::parse).transpose()?,
        ts: wire.ts,
        session_id: wire.session_id,
        from: wire.from,
        event: wire.event,
        status: status_from_i32(wire.status)?,
        data: wire
            .data
            .map_or(Value::Object(Map::new()), |v| proto_to_json(&v)),
    })
}

fn status_to_i32(status: Status) -> i32 {
    let wire = match status {
        Status::Request => WireStatus::Request,
        Status::Item => WireStatus::Item,
        Status::Done => WireStatus::Done,
        Status::Error => WireStatus::Error,
        Status::Cancel => WireStatus::Cancel,
    };
    wire as i32
}

fn status_from_i32(value: i32) -> Result<Status, CodecError> {
    match WireStatus::try_from(value) {
        Ok(WireStatus::Request) => Ok(Status::Request),
        Ok(WireStatus::Item) => Ok(Status::Item),
        Ok(WireStatus::Done) => Ok(Status::Done),
        Ok(WireStatus::Error) => Ok(Status::Error),
        Ok(WireStatus::Cancel) => Ok(Status::Cancel),
        Err(_) => Err(CodecError::InvalidStatus(value)),
    }
}

fn json_to_proto(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => {
            prost_types::value::Kind::NullValue(prost_types::NullValue::NullValue as i32)
        }
        Value::Bool(v) => prost_types::value::Kind::BoolValue(*v),
        Value::Number(v) => prost_types::value::Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => prost_types::value::Kind::StringValue(v.clone()),
        Value::Array(v) => prost_types::value::Kind::ListValue(prost_types::ListValue {
            values: v.iter().map(json_to_proto).collect(),
        }),
        Value::Object(v) => prost_types::value::Kind::StructValue(prost_types::Struct {
            fields: v.iter().map(|(k, v)| (k.clone(), json_to_proto(v))).collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn proto_to_json(value: &prost_types::Value) -> Value {
    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        prost_types::value::Kind::NullValue(_) => Value::Null,
        prost_types::value::Kind::NumberValue(v) => {
            serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number)
        }
        prost_types::value::Kind::StringValue(v) => Value::String(v.clone()),
        prost_types::value::Kind::BoolValue(v) => Value::Bool(*v),
        prost_types::value::Kind::StructValue(v) => Value::Object(
            v.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json(v)))
                .collect(),
        ),
        prost_types::value::Kind::ListValue(v) => {
            Value::Array(v.values.iter().map(proto_to_json).collect())
        }
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, optional, tag = "4")]
    session_id: Option<String>,
    #[prost(string, optional, tag = "5")]
    from: Option<String>,
    #[prost(string, tag = "6")]
    event: String,
    #[prost(enumeration = "WireStatus", tag = "7")]
    status: i32,
    #[prost(message, optional, tag = "8")]
    data: Option<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireStatus {
    Request = 0,
    Done = 1,
    Error = 2,
    Cancel = 3,
    Item = 4,
}
