//! Downstream datagram transport: RakNet as spoken by Bedrock Edition clients.
//!
//! The [`listener::Listener`] owns the UDP socket and every connected peer.
//! Admission and rate limiting happen before a peer is allocated, so a
//! rejected address never costs more than the reply datagram.

pub mod admission;
pub mod constants;
pub mod error;
pub mod fragmentation;
pub mod listener;
pub mod ordering;
pub mod packet;
pub mod peer;
pub mod pong;
pub mod rate_limit;
pub mod reliability;
pub mod wire;

pub use admission::{AdmissionPolicy, AllowAll, CidrRange};
pub use error::RakNetError;
pub use listener::{Listener, ListenerConfig, ListenerEvent, ListenerHandle};
pub use packet::frame::Reliability;
pub use peer::PeerState;
pub use pong::{PongInfo, PongProvider};
pub use rate_limit::{RateDecision, RateLimiter};
