use compact_str::{CompactString, ToCompactString};
use serde::{Deserialize, Deserializer};

/// Numeric change number as reported by Gerrit, kept in its string form
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ChangeId {
    value: CompactString,
}

impl ChangeId {
    pub fn new<S: Into<CompactString>>(id: S) -> Self {
        Self { value: id.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<&str> for ChangeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for ChangeId {
    fn from(value: u64) -> Self {
        Self::new(value.to_compact_string())
    }
}

impl<'de> Deserialize<'de> for ChangeId {
    fn deserialize<D>(deserializer: D) -> Result<ChangeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct ChangeIdVisitor;

        impl<'de> Visitor<'de> for ChangeIdVisitor {
            type Value = ChangeId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a change number")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ChangeId::new(value))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ChangeId::new(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ChangeId::from(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ChangeId::new(value.to_compact_string()))
            }
        }

        deserializer.deserialize_any(ChangeIdVisitor)
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
