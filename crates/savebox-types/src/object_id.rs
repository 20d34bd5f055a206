use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::ids::{Identifier, id_to_string};

/// Store-native record identifier.
///
/// 12 bytes: 4-byte big-endian Unix seconds, 5 random bytes fixed for the
/// lifetime of the process, 3-byte big-endian counter. The canonical text
/// form is 24 lowercase hex characters, which is also how it serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

#[derive(Debug, Error, PartialEq)]
pub enum ParseObjectIdError {
    #[error("object id must be 24 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("object id is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

const COUNTER_MASK: u32 = 0x00ff_ffff;

fn process_unique() -> &'static [u8; 5] {
    static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    PROCESS_UNIQUE.get_or_init(rand::random)
}

fn next_counter() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER
        .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
        .fetch_add(1, Ordering::Relaxed)
        & COUNTER_MASK
}

impl ObjectId {
    pub fn new() -> Self {
        let secs = chrono::Utc::now().timestamp() as u32;
        let counter = next_counter();

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    pub fn parse_str(s: &str) -> Result<Self, ParseObjectIdError> {
        if s.len() != 24 {
            return Err(ParseObjectIdError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time embedded in the first four bytes.
    pub fn timestamp(&self) -> chrono::DateTime<chrono::Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        chrono::DateTime::from_timestamp(secs as i64, 0).unwrap_or_default()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id_to_string(&Identifier::Object(*self)))
    }
}

/// Accepts the plain hex string and the extended-JSON `{"$oid": "..."}` form.
impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match Identifier::from(&value) {
            Identifier::Object(oid) => Ok(oid),
            Identifier::Text(s) => Self::parse_str(&s).map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "expected an object id, got {}",
                id_to_string(&other)
            ))),
        }
    }
}
