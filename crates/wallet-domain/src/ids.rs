//! Strongly typed identifiers and account references.

use std::{fmt, str::FromStr};

use serde::{de::Deserializer, Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Stable identifier of an asset or liability account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim()).map(Self)
    }
}

/// Stable identifier of a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Account pointer carried by a transaction.
///
/// Upstream layers hand references over as free text. Anything that does not
/// parse as an [`AccountId`] is kept verbatim as `Malformed` so it can be
/// reported instead of being silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountRef {
    Known(AccountId),
    Malformed(String),
}

impl AccountRef {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<AccountId>() {
            Ok(id) => AccountRef::Known(id),
            Err(_) => AccountRef::Malformed(raw.to_string()),
        }
    }

    /// Returns the identifier when the reference is well formed.
    pub fn id(&self) -> Option<AccountId> {
        match self {
            AccountRef::Known(id) => Some(*id),
            AccountRef::Malformed(_) => None,
        }
    }

    pub fn points_to(&self, account: AccountId) -> bool {
        self.id() == Some(account)
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        AccountRef::Known(id)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Known(id) => id.fmt(f),
            AccountRef::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for AccountRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(AccountRef::parse(&raw))
    }
}
