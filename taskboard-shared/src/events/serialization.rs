/// Wire format for board events on Redis Streams
///
/// Each stream entry is a flat field map:
///
/// | Field | Value |
/// |---|---|
/// | `type` | `BoardDeleted` |
/// | `board_id` | UUID string |
///
/// Unknown extra fields are ignored so producers can add fields without
/// breaking older consumers.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use super::{BoardDeleted, BOARD_DELETED_TOPIC};

/// Stream entry `type` value for [`BoardDeleted`]
pub const BOARD_DELETED_TYPE: &str = "BoardDeleted";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid field value
    #[error("Invalid field value for {field}: {error}")]
    InvalidValue { field: String, error: String },
}

/// Redis Stream key for a topic
pub fn topic_stream_key(topic: &str) -> String {
    format!("events:{}", topic)
}

/// Stream key for the board deletion topic
pub fn board_deleted_stream_key() -> String {
    topic_stream_key(BOARD_DELETED_TOPIC)
}

/// Encodes an event as stream fields
pub fn serialize_event(event: &BoardDeleted) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    fields.insert("type".to_string(), BOARD_DELETED_TYPE.to_string());
    fields.insert("board_id".to_string(), event.board_id.to_string());
    fields
}

/// Decodes stream fields into an event
///
/// # Errors
///
/// - `MissingField` when `type` or `board_id` is absent
/// - `InvalidValue` when `type` is not `BoardDeleted` or `board_id` is not a UUID
pub fn deserialize_event(fields: &HashMap<String, String>) -> Result<BoardDeleted, SerializationError> {
    let kind = fields
        .get("type")
        .ok_or_else(|| SerializationError::MissingField("type".to_string()))?;
    if kind != BOARD_DELETED_TYPE {
        return Err(SerializationError::InvalidValue {
            field: "type".to_string(),
            error: format!("unexpected event type '{}'", kind),
        });
    }

    let raw_id = fields
        .get("board_id")
        .ok_or_else(|| SerializationError::MissingField("board_id".to_string()))?;
    let board_id = Uuid::parse_str(raw_id).map_err(|e| SerializationError::InvalidValue {
        field: "board_id".to_string(),
        error: e.to_string(),
    })?;

    Ok(BoardDeleted { board_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_key() {
        assert_eq!(board_deleted_stream_key(), "events:board-deleted");
    }

    #[test]
    fn test_fields_carry_type_and_board_id() {
        let board_id = Uuid::new_v4();
        let fields = serialize_event(&BoardDeleted::new(board_id));

        assert_eq!(fields["type"], "BoardDeleted");
        assert_eq!(fields["board_id"], board_id.to_string());
        assert_eq!(deserialize_event(&fields), Ok(BoardDeleted::new(board_id)));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let board_id = Uuid::new_v4();
        let mut fields = serialize_event(&BoardDeleted::new(board_id));
        fields.insert("trace_id".to_string(), "abc".to_string());

        assert!(deserialize_event(&fields).is_ok());
    }

    #[test]
    fn test_missing_board_id() {
        let mut fields = HashMap::new();
        fields.insert("type".to_string(), BOARD_DELETED_TYPE.to_string());

        assert_eq!(
            deserialize_event(&fields),
            Err(SerializationError::MissingField("board_id".to_string()))
        );
    }

    #[test]
    fn test_invalid_board_id_and_type() {
        let mut fields = HashMap::new();
        fields.insert("type".to_string(), BOARD_DELETED_TYPE.to_string());
        fields.insert("board_id".to_string(), "not-a-uuid".to_string());
        assert!(matches!(
            deserialize_event(&fields),
            Err(SerializationError::InvalidValue { .. })
        ));

        fields.insert("type".to_string(), "TaskDeleted".to_string());
        assert!(matches!(
            deserialize_event(&fields),
            Err(SerializationError::InvalidValue { .. })
        ));
    }
}
