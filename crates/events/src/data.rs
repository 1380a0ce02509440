//! Command payloads and their marshaling to the stored byte format.

use serde::Serialize;
use serde::de::IgnoredAny;

use crate::EventError;

/// A structure that can be marshaled into an event payload.
///
/// Implemented for every `Serialize` type; exists so commands can hand out
/// `&dyn Payload` without knowing the concrete payload type.
pub trait Payload: core::fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T> Payload for T
where
    T: Serialize + core::fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Payload of a command, before marshaling.
#[derive(Debug, Clone, Copy)]
pub enum EventData<'a> {
    /// No business payload (e.g. `org.deactivated`).
    Empty,
    /// Already serialized JSON.
    Raw(&'a [u8]),
    /// A structure marshaled at push time.
    Structured(&'a dyn Payload),
}

impl<'a> EventData<'a> {
    pub fn structured<T: Payload>(payload: &'a T) -> Self {
        Self::Structured(payload)
    }

    /// Produce the bytes to store.
    ///
    /// Runs at persistence time, so an unserializable payload fails the push
    /// and not the construction of the command. `None` means "no payload";
    /// a structure serializing to JSON `null` is stored as no payload too.
    pub fn marshal(&self) -> Result<Option<Vec<u8>>, EventError> {
        match self {
            EventData::Empty => Ok(None),
            EventData::Raw([]) => Ok(None),
            EventData::Raw(bytes) => {
                serde_json::from_slice::<IgnoredAny>(bytes)
                    .map_err(|e| EventError::serialization("EVENT-dA7rq", e))?;
                Ok(Some(bytes.to_vec()))
            }
            EventData::Structured(payload) => {
                let bytes = payload
                    .to_json()
                    .map_err(|e| EventError::serialization("EVENT-Kq3vt", e))?;
                if bytes == b"null" {
                    return Ok(None);
                }
                Ok(Some(bytes))
            }
        }
    }
}
