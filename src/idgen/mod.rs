//! Resource-typed identifiers.
//!
//! # Format
//! ```text
//! cnv_01J9ZK3V8Q7W2N4X5Y6Z7A8B9C
//! └─┬┘└────────────┬───────────┘
//! prefix       ULID (time-ordered, Crockford base32)
//! ```
//!
//! # Design Decisions
//! - The prefix comes from the resource type, never from the value
//! - Parsing rejects an ID minted for a different resource
//! - IDs sort lexicographically by creation time

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use ulid::Ulid;

/// A logical resource that owns a family of identifiers.
pub trait Resource: 'static {
    /// Raw prefix. Normalised to at most four lowercase characters followed by `_`.
    const PREFIX: &'static str;

    /// Resource name used in error messages.
    const NAME: &'static str;
}

/// Inbound requests (`req_`).
#[derive(Debug)]
pub enum Request {}

impl Resource for Request {
    const PREFIX: &'static str = "req";
    const NAME: &'static str = "request";
}

/// Canvases (`cnv_`).
#[derive(Debug)]
pub enum Canvas {}

impl Resource for Canvas {
    const PREFIX: &'static str = "cnv";
    const NAME: &'static str = "canvas";
}

/// Error returned when parsing an [`Id`].
#[derive(Debug, Error)]
pub enum IdError {
    #[error("{resource} id must have prefix {expected:?}")]
    PrefixMismatch {
        resource: &'static str,
        expected: String,
    },

    #[error("parse uid value: {0}")]
    Invalid(#[from] ulid::DecodeError),
}

/// A unique identifier for a resource of type `T`.
pub struct Id<T: Resource> {
    uid: Ulid,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> Id<T> {
    /// Mint a new identifier.
    pub fn new() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn from_ulid(uid: Ulid) -> Self {
        Self {
            uid,
            _resource: PhantomData,
        }
    }

    pub fn ulid(&self) -> Ulid {
        self.uid
    }

    /// Milliseconds since the Unix epoch at which this ID was minted.
    pub fn timestamp_ms(&self) -> u64 {
        self.uid.timestamp_ms()
    }

    /// The normalised prefix for `T`, including the trailing `_`.
    pub fn prefix() -> String {
        normalized_prefix(T::PREFIX)
    }

    /// Parse an ID previously produced by `to_string`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let prefix = Self::prefix();
        let Some(raw) = s.strip_prefix(prefix.as_str()) else {
            return Err(IdError::PrefixMismatch {
                resource: T::NAME,
                expected: prefix,
            });
        };

        Ok(Self::from_ulid(Ulid::from_string(raw)?))
    }
}

fn normalized_prefix(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('_');
    let mut prefix: String = trimmed.chars().take(4).collect::<String>().to_lowercase();
    prefix.push('_');
    prefix
}

impl<T: Resource> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Resource> Copy for Id<T> {}

impl<T: Resource> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl<T: Resource> Eq for Id<T> {}

impl<T: Resource> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Resource> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uid.cmp(&other.uid)
    }
}

impl<T: Resource> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

impl<T: Resource> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::prefix(), self.uid)
    }
}

impl<T: Resource> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl<T: Resource> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: Resource> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de, T: Resource> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
