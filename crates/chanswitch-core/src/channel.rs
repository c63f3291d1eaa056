//! Channel identifiers.
//!
//! A channel is a named logical sub-stream multiplexed within one data flow.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a named channel.
///
/// Compared by content and totally ordered, so it can key a sorted map.
/// Cloning is cheap: the bytes are reference-counted.
///
/// The empty channel is the default channel. On the input side of a switch it
/// means "no explicit channel"; on the output side it is an ordinary channel.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ChannelId(Bytes);

impl ChannelId {
    /// The default (empty) channel.
    pub const DEFAULT: Self = Self(Bytes::new());

    /// Create a channel id from any byte sequence.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Create a channel id from a static byte string without allocating.
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether this is the default (empty) channel.
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the name in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the name is empty. Same as [`ChannelId::is_default`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(name) => write!(f, "ChannelId({:?})", name),
            Err(_) => write!(f, "ChannelId(0x{})", hex::encode(&self.0)),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str("<default>");
        }
        match std::str::from_utf8(&self.0) {
            Ok(name) => f.write_str(name),
            Err(_) => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

impl AsRef<[u8]> for ChannelId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(name: &str) -> Self {
        Self(Bytes::copy_from_slice(name.as_bytes()))
    }
}

impl From<String> for ChannelId {
    fn from(name: String) -> Self {
        Self(Bytes::from(name))
    }
}

impl From<&[u8]> for ChannelId {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for ChannelId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<Bytes> for ChannelId {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<&ChannelId> for ChannelId {
    fn from(channel: &ChannelId) -> Self {
        channel.clone()
    }
}
