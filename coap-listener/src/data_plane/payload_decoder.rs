/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! CBOR request-body decoding into [`ReadingBatch`] values.
//!
//! The body is read into the full CBOR data model first and then rendered as
//! JSON values:
//!
//! - byte strings become lowercase hex text,
//! - integers outside the 64-bit range and non-finite floats become text,
//! - tags are dropped and their content is kept,
//! - map keys that are not text use their rendered form (`1` becomes `"1"`).

use crate::reading_batch::{ReadingBatch, Readings};
use ciborium::value::Value as CborValue;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::fmt::{Display, Formatter, Write};

pub(crate) const ASSET_FIELD: &str = "asset";
pub(crate) const TIMESTAMP_FIELD: &str = "timestamp";
pub(crate) const KEY_FIELD: &str = "key";

/// Accepted names of the readings container, consulted in order.
pub(crate) const READINGS_FIELDS: [&str; 2] = ["readings", "sensor_values"];

/// The request body is not a well-formed CBOR map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Malformed(String),
    NotADocument,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Malformed(detail) => write!(f, "malformed CBOR payload: {detail}"),
            DecodeError::NotADocument => write!(f, "payload must be a CBOR map"),
        }
    }
}

impl Error for DecodeError {}

/// The readings container is present but is not a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub field: &'static str,
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "readings must be a dictionary")
    }
}

impl Error for FormatError {}

/// Failures for [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    Decode(DecodeError),
    Format(FormatError),
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Decode(err) => write!(f, "{err}"),
            PayloadError::Format(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PayloadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PayloadError::Decode(err) => Some(err),
            PayloadError::Format(err) => Some(err),
        }
    }
}

impl From<DecodeError> for PayloadError {
    fn from(err: DecodeError) -> Self {
        PayloadError::Decode(err)
    }
}

impl From<FormatError> for PayloadError {
    fn from(err: FormatError) -> Self {
        PayloadError::Format(err)
    }
}

/// Decodes an untrusted CBOR body into a [`ReadingBatch`].
///
/// `asset`, `timestamp` and `key` may be missing. The readings container is taken
/// from the first of [`READINGS_FIELDS`] present in the document and must be a
/// map; when none is present the batch carries no readings.
///
/// ```
/// use coap_listener::decode;
///
/// // {"asset": "sensor1", "readings": {"velocity": "500"}}
/// let mut body = Vec::new();
/// ciborium::ser::into_writer(
///     &serde_json::json!({"asset": "sensor1", "readings": {"velocity": "500"}}),
///     &mut body,
/// )
/// .unwrap();
///
/// let batch = decode(&body).unwrap();
/// assert_eq!(batch.asset.as_deref(), Some("sensor1"));
/// assert_eq!(batch.readings["velocity"], "500");
/// ```
pub fn decode(raw: &[u8]) -> Result<ReadingBatch, PayloadError> {
    let document: CborValue = ciborium::de::from_reader(raw)
        .map_err(|err| DecodeError::Malformed(format!("{err:?}")))?;

    let Value::Object(mut document) = to_json(document) else {
        return Err(DecodeError::NotADocument.into());
    };

    let asset = take_scalar(&mut document, ASSET_FIELD);
    let timestamp = take_scalar(&mut document, TIMESTAMP_FIELD);
    let key = take_scalar(&mut document, KEY_FIELD);
    let readings = take_readings(&mut document)?;

    Ok(ReadingBatch {
        asset,
        timestamp,
        key,
        readings,
    })
}

fn take_scalar(document: &mut Map<String, Value>, field: &str) -> Option<String> {
    match document.remove(field)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn take_readings(document: &mut Map<String, Value>) -> Result<Readings, FormatError> {
    let found = READINGS_FIELDS
        .iter()
        .find_map(|field| document.remove(*field).map(|value| (*field, value)));

    match found {
        None => Ok(Readings::new()),
        Some((_, Value::Object(readings))) => Ok(readings),
        Some((field, _)) => Err(FormatError { field }),
    }
}

fn to_json(value: CborValue) -> Value {
    match value {
        CborValue::Null => Value::Null,
        CborValue::Bool(flag) => Value::Bool(flag),
        CborValue::Text(text) => Value::String(text),
        CborValue::Integer(integer) => {
            let integer = i128::from(integer);
            if let Ok(signed) = i64::try_from(integer) {
                Value::from(signed)
            } else if let Ok(unsigned) = u64::try_from(integer) {
                Value::from(unsigned)
            } else {
                Value::String(integer.to_string())
            }
        }
        CborValue::Float(float) => Number::from_f64(float)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(float.to_string())),
        CborValue::Bytes(bytes) => Value::String(hex(&bytes)),
        CborValue::Tag(_, content) => to_json(*content),
        CborValue::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        CborValue::Map(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key_text(key), to_json(value)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn key_text(key: CborValue) -> String {
    match to_json(key) {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut text, byte| {
            let _ = write!(text, "{byte:02x}");
            text
        })
}

#[cfg(test)]
mod tests {
    use super::{decode, DecodeError, FormatError, PayloadError};
    use ciborium::value::Value as CborValue;
    use serde_json::{json, Value};

    fn encode(document: &Value) -> Vec<u8> {
        let mut body = Vec::new();
        ciborium::ser::into_writer(document, &mut body).expect("document should encode");
        body
    }

    fn encode_cbor(document: &CborValue) -> Vec<u8> {
        let mut body = Vec::new();
        ciborium::ser::into_writer(document, &mut body).expect("document should encode");
        body
    }

    fn text(value: &str) -> CborValue {
        CborValue::Text(value.to_string())
    }

    fn sensor_document(readings_field: &str, readings: Value) -> Value {
        json!({
            "timestamp": "2017-01-02T01:02:03.23232Z-05:00",
            "asset": "sensor1",
            "key": "80a43623-ebe5-40d6-8d80-3f892da9b3b4",
            readings_field: readings,
        })
    }

    #[test]
    fn decode_extracts_all_fields_from_primary_readings() {
        let body = encode(&sensor_document(
            "readings",
            json!({"velocity": "500", "temperature": {"value": "32", "unit": "kelvin"}}),
        ));

        let batch = decode(&body).expect("well-formed document should decode");

        assert_eq!(batch.asset.as_deref(), Some("sensor1"));
        assert_eq!(
            batch.timestamp.as_deref(),
            Some("2017-01-02T01:02:03.23232Z-05:00")
        );
        assert_eq!(
            batch.key.as_deref(),
            Some("80a43623-ebe5-40d6-8d80-3f892da9b3b4")
        );
        assert_eq!(batch.readings["velocity"], json!("500"));
        assert_eq!(
            batch.readings["temperature"],
            json!({"value": "32", "unit": "kelvin"})
        );
    }

    #[test]
    fn decode_falls_back_to_legacy_sensor_values_field() {
        let body = encode(&sensor_document("sensor_values", json!({"velocity": "500"})));

        let batch = decode(&body).expect("legacy field name should decode");

        assert_eq!(batch.readings.len(), 1);
        assert_eq!(batch.readings["velocity"], json!("500"));
    }

    #[test]
    fn decode_prefers_primary_field_when_both_present() {
        let body = encode(&json!({
            "readings": {"primary": 1},
            "sensor_values": "ignored",
        }));

        let batch = decode(&body).expect("primary field should win");

        assert!(batch.readings.contains_key("primary"));
    }

    #[test]
    fn decode_rejects_scalar_readings_with_format_error() {
        let body = encode(&sensor_document("readings", json!("500")));

        let err = decode(&body).expect_err("scalar readings must be rejected");

        assert_eq!(
            err,
            PayloadError::Format(FormatError { field: "readings" })
        );
        assert_eq!(err.to_string(), "readings must be a dictionary");
    }

    #[test]
    fn decode_rejects_null_and_list_readings() {
        for readings in [Value::Null, json!(["500"])] {
            let body = encode(&sensor_document("sensor_values", readings));
            assert!(matches!(decode(&body), Err(PayloadError::Format(_))));
        }
    }

    #[test]
    fn decode_tolerates_partial_documents() {
        let body = encode(&json!({"asset": "sensor1"}));

        let batch = decode(&body).expect("partial document should decode");

        assert_eq!(batch.asset.as_deref(), Some("sensor1"));
        assert_eq!(batch.timestamp, None);
        assert_eq!(batch.key, None);
        assert!(batch.readings.is_empty());
    }

    #[test]
    fn decode_renders_non_string_scalars_as_text() {
        let body = encode(&json!({"asset": 42, "key": null, "readings": {}}));

        let batch = decode(&body).expect("numeric asset should decode");

        assert_eq!(batch.asset.as_deref(), Some("42"));
        assert_eq!(batch.key, None);
    }

    #[test]
    fn decode_rejects_malformed_cbor() {
        // map header announcing one pair, followed by a truncated text string
        let err = decode(&[0xa1, 0x65, b'a', b's']).expect_err("truncated input must fail");

        assert!(matches!(err, PayloadError::Decode(DecodeError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_empty_body() {
        assert!(matches!(
            decode(&[]),
            Err(PayloadError::Decode(DecodeError::Malformed(_)))
        ));
    }

    #[test]
    fn decode_rejects_non_map_documents() {
        let body = encode(&json!(["asset", "sensor1"]));

        assert_eq!(
            decode(&body),
            Err(PayloadError::Decode(DecodeError::NotADocument))
        );
    }

    #[test]
    fn decode_renders_byte_string_readings_as_hex() {
        let body = encode_cbor(&CborValue::Map(vec![
            (text("asset"), text("camera")),
            (
                text("readings"),
                CborValue::Map(vec![(text("frame"), CborValue::Bytes(vec![0xde, 0xad, 0x00]))]),
            ),
        ]));

        let batch = decode(&body).expect("byte string reading should decode");

        assert_eq!(batch.readings["frame"], json!("dead00"));
    }

    #[test]
    fn decode_accepts_integer_sensor_keys() {
        let body = encode_cbor(&CborValue::Map(vec![(
            text("readings"),
            CborValue::Map(vec![
                (CborValue::Integer(1.into()), text("500")),
                (CborValue::Integer((-2).into()), CborValue::Integer(7.into())),
            ]),
        )]));

        let batch = decode(&body).expect("integer sensor keys should decode");

        assert_eq!(batch.readings["1"], json!("500"));
        assert_eq!(batch.readings["-2"], json!(7));
    }

    #[test]
    fn decode_ignores_integer_top_level_keys() {
        let body = encode_cbor(&CborValue::Map(vec![
            (CborValue::Integer(0.into()), text("profile-a")),
            (text("asset"), text("sensor1")),
            (
                text("readings"),
                CborValue::Map(vec![(text("velocity"), text("500"))]),
            ),
        ]));

        let batch = decode(&body).expect("integer top-level key should not reject the body");

        assert_eq!(batch.asset.as_deref(), Some("sensor1"));
        assert_eq!(batch.readings["velocity"], json!("500"));
    }

    #[test]
    fn decode_unwraps_tagged_values() {
        // tag 0 is an RFC 3339 date string, tag 1 an epoch time
        let body = encode_cbor(&CborValue::Map(vec![
            (
                text("timestamp"),
                CborValue::Tag(0, Box::new(text("2017-01-02T01:02:03Z"))),
            ),
            (
                text("readings"),
                CborValue::Map(vec![(
                    text("sampled_at"),
                    CborValue::Tag(1, Box::new(CborValue::Integer(1_483_318_923.into()))),
                )]),
            ),
        ]));

        let batch = decode(&body).expect("tagged values should decode");

        assert_eq!(batch.timestamp.as_deref(), Some("2017-01-02T01:02:03Z"));
        assert_eq!(batch.readings["sampled_at"], json!(1_483_318_923));
    }

    #[test]
    fn decode_keeps_non_finite_floats_as_text() {
        let body = encode_cbor(&CborValue::Map(vec![(
            text("readings"),
            CborValue::Map(vec![(text("ratio"), CborValue::Float(f64::NAN))]),
        )]));

        let batch = decode(&body).expect("NaN reading should decode");

        assert_eq!(batch.readings["ratio"], json!("NaN"));
    }
}
