//! Binary encoding of spilled batches.
//!
//! An artifact body is the 4-byte marker `SPL1` followed by the batch encoded
//! with bincode's standard configuration. Every `Value` is written with its
//! variant tag, so records decode to exactly the runtime types they were
//! spilled with, whatever field set each record has.

use crate::error_handling::StorageError;

use super::{Batch, Record};

/// Format marker at the start of every artifact.
pub const MAGIC: &[u8; 4] = b"SPL1";

/// Encodes a batch into an artifact body.
pub fn serialize(batch: &[Record]) -> Result<Vec<u8>, StorageError> {
    let body = bincode::serde::encode_to_vec(batch, bincode::config::standard())?;
    let mut bytes = Vec::with_capacity(MAGIC.len() + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decodes an artifact body produced by [`serialize`].
pub fn deserialize(bytes: &[u8]) -> Result<Batch, StorageError> {
    let body = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or(StorageError::BadMagic)?;
    let (batch, read): (Batch, usize) =
        bincode::serde::decode_from_slice(body, bincode::config::standard())?;
    if read != body.len() {
        return Err(StorageError::TrailingBytes(body.len() - read));
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record::Value;
    use chrono::TimeZone;

    #[test]
    fn test_round_trip_preserves_types_and_field_sets() {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        let batch: Batch = vec![
            Record::from([
                ("id".to_string(), Value::Int(-42)),
                ("name".to_string(), Value::Text("héllo".to_string())),
                ("ratio".to_string(), Value::Float(0.125)),
                ("ok".to_string(), Value::Bool(true)),
            ]),
            Record::from([
                ("blob".to_string(), Value::Bytes(vec![0, 255, 7])),
                ("missing".to_string(), Value::Null),
                ("at".to_string(), Value::Timestamp(ts)),
            ]),
        ];

        let bytes = serialize(&batch).unwrap();
        assert!(bytes.starts_with(MAGIC));
        assert_eq!(deserialize(&bytes).unwrap(), batch);
    }

    #[test]
    fn test_int_and_float_stay_distinct() {
        let batch = vec![Record::from([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Float(1.0)),
        ])];
        let decoded = deserialize(&serialize(&batch).unwrap()).unwrap();
        assert_eq!(decoded[0]["a"], Value::Int(1));
        assert_eq!(decoded[0]["b"], Value::Float(1.0));
    }

    #[test]
    fn test_rejects_foreign_bytes() {
        assert!(matches!(
            deserialize(b"not an artifact"),
            Err(StorageError::BadMagic)
        ));
    }

    #[test]
    fn test_rejects_truncated_body() {
        let batch = vec![Record::from([(
            "text".to_string(),
            Value::Text("a fairly long value".to_string()),
        )])];
        let bytes = serialize(&batch).unwrap();
        let truncated = &bytes[..bytes.len() - 5];
        assert!(matches!(
            deserialize(truncated),
            Err(StorageError::Decode(_))
        ));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = serialize(&[Record::from([("a".to_string(), Value::Int(1))])]).unwrap();
        bytes.extend_from_slice(&[0, 0]);
        assert!(matches!(
            deserialize(&bytes),
            Err(StorageError::TrailingBytes(2))
        ));
    }
}
