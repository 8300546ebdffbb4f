//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The rest of the server doesn't care HOW messages are serialized: it
//! just needs something that implements [`Codec`]. Today that is
//! [`JsonCodec`], because the clients speak JSON.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// The output never contains a raw newline, which is what lets the
/// transport use `\n` as its frame delimiter.
///
/// ## Example
///
/// ```rust
/// use pongrelay_protocol::{Codec, Handshake, JsonCodec, Side};
///
/// let codec = JsonCodec;
/// let hs = Handshake::new(Side::Left, 480, 640);
///
/// let bytes = codec.encode(&hs).unwrap();
/// assert_eq!(bytes, br#"{"side":"left","height":480,"width":640}"#);
///
/// let decoded: Handshake = codec.decode(&bytes).unwrap();
/// assert_eq!(hs, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
