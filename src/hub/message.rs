//! Message payloads
//!
//! A `Message` is an opaque, immutable text payload. It has no identity and
//! lives only between a publish and the deliveries that follow it. The text
//! is held in an `Arc<str>` so fanning it out to every subscriber clones a
//! pointer, not the payload.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    payload: Arc<str>,
}

impl Message {
    pub fn new(payload: impl Into<Arc<str>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.payload
    }
}

impl From<String> for Message {
    fn from(payload: String) -> Self {
        Self::new(payload)
    }
}

impl From<&str> for Message {
    fn from(payload: &str) -> Self {
        Self::new(payload)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}
