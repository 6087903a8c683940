//! Wire codecs for both sides of the bridge.
//!
//! [`bedrock`] is the downstream protocol spoken to clients, [`java`] the
//! upstream protocol spoken to the server. Both share the VarInt family in
//! [`varint`] and the compression helpers.

pub mod batch;
pub mod bedrock;
pub mod codec;
pub mod compression;
pub mod error;
pub mod java;
pub mod jwt;
pub mod types;
pub mod varint;

pub use codec::{ProtoDecode, ProtoEncode};
pub use error::ProtoError;
