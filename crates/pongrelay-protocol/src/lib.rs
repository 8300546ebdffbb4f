//! Wire protocol for pongrelay.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`Handshake`], [`ClientUpdate`], [`StateSnapshot`], plus the
//!   [`Vector2`], [`Score`], [`Side`], [`MatchId`] and [`PlayerName`]
//!   building blocks): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (frames) and the match
//! layer (shared state). It knows nothing about connections or matches.
//!
//! ```text
//! Transport (frames) → Protocol (typed messages) → Match (shared state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientUpdate, Handshake, MatchId, PlayerName, Score, Side, StateSnapshot,
    Vector2,
};
