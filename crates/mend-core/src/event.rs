//! Inbound notification envelope.
//!
//! A batch is a JSON object with a `Records` array. Each record carries
//! the alarm as a JSON-encoded string under `Sns.Message`:
//!
//! ```text
//! {"Records": [{"Sns": {"Message": "{\"AlarmName\": \"...\", \"NewStateValue\": \"ALARM\"}"}}]}
//! ```

use serde_json::Value;

use crate::error::{InputError, InputResult};
use crate::types::{AlarmEvent, AlarmState};

/// Parse a raw notification batch into alarm events.
///
/// A missing `Records` key is an empty batch. A missing `AlarmName`
/// defaults to the empty string (it then classifies as no action). A
/// missing or unknown `NewStateValue` yields `AlarmState::Unrecognized`.
pub fn parse_batch(raw: &[u8]) -> InputResult<Vec<AlarmEvent>> {
    let doc: Value = serde_json::from_slice(raw)?;
    let obj = doc.as_object().ok_or(InputError::NotAnObject)?;

    let records = match obj.get("Records") {
        None => return Ok(Vec::new()),
        Some(Value::Array(records)) => records,
        Some(_) => return Err(InputError::RecordsNotArray),
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect()
}

fn parse_record(index: usize, record: &Value) -> InputResult<AlarmEvent> {
    let message = record
        .get("Sns")
        .and_then(|sns| sns.get("Message"))
        .and_then(Value::as_str)
        .ok_or(InputError::MissingMessage { index })?;

    let payload = match serde_json::from_str::<Value>(message) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(InputError::BadMessage {
                index,
                reason: format!("expected object, got {}", json_kind(&other)),
            });
        }
        Err(e) => {
            return Err(InputError::BadMessage {
                index,
                reason: e.to_string(),
            });
        }
    };

    // An absent or unexpected state is carried through so the record is
    // skipped rather than failing the batch.
    let state = AlarmState::from_wire(
        payload
            .get("NewStateValue")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );

    let name = payload
        .get("AlarmName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(AlarmEvent {
        name,
        state,
        payload,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
