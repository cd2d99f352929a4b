//! Serializer for checkpoint payloads (value <-> bytes).
//!
//! Used by persistent Checkpointer implementations. `MemorySaver` keeps
//! `Checkpoint` values directly and does not use a Serializer.

use crate::memory::checkpointer::CheckpointError;

/// Serializes and deserializes one kind of checkpoint payload.
///
/// `SqliteSaver` uses one for the state record and one for the pending interrupt.
/// The format must round-trip strings, numbers, booleans and string lists losslessly.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, CheckpointError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<T, CheckpointError>;
}

/// JSON-based serializer. Requires T: Serialize + serde::de::DeserializeOwned.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<T> Serializer<T> for JsonSerializer
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(value).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateRecord;
    use serde_json::json;

    /// **Scenario**: Every primitive field type survives serialize then deserialize.
    #[test]
    fn json_serializer_roundtrip_primitives() {
        let ser = JsonSerializer;
        let state = StateRecord::new()
            .with("name", "pikachu")
            .with("level", 50)
            .with("ratio", 0.87)
            .with("alive", true)
            .with("detected", json!(["person", "fallen_person"]));
        let bytes = ser.serialize(&state).unwrap();
        let restored: StateRecord = ser.deserialize(&bytes).unwrap();
        assert_eq!(state, restored);
        assert_eq!(restored.get_i64("level"), Some(50));
        assert_eq!(restored.get_f64("ratio"), Some(0.87));
    }

    /// **Scenario**: Floats whose shortest decimal form is hard to parse come back bit-for-bit.
    #[test]
    fn json_serializer_roundtrip_floats_exactly() {
        let ser = JsonSerializer;
        let values = [
            1.0715660391465826e-75,
            -1.81996730402717e-179,
            -1.603964615428183e143,
            f64::MIN_POSITIVE,
            f64::MAX,
            5e-324,
            0.1 + 0.2,
        ];
        for v in values {
            let state = StateRecord::new().with("x", v);
            let bytes = ser.serialize(&state).unwrap();
            let restored: StateRecord = ser.deserialize(&bytes).unwrap();
            let got = restored.get_f64("x").unwrap();
            assert_eq!(got.to_bits(), v.to_bits(), "{:e} came back as {:e}", v, got);
        }
    }

    /// **Scenario**: Invalid JSON on deserialize returns CheckpointError::Serialization.
    #[test]
    fn json_serializer_invalid_json_deserialize_returns_checkpoint_error() {
        let ser = JsonSerializer;
        let invalid = b"{ not valid json ]";
        let result: Result<StateRecord, _> = ser.deserialize(invalid);
        match result {
            Err(CheckpointError::Serialization(s)) => assert!(!s.is_empty()),
            other => panic!("expected Serialization variant: {:?}", other),
        }
    }
}
