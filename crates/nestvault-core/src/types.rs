// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifier newtypes and keyset pagination types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::VaultError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// The wrapped UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = VaultError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    VaultError::InvalidInput(format!(
                        "invalid {}: {e}",
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

uuid_id!(
    /// Identifier of a vault owner, issued by the identity collaborator.
    UserId
);

uuid_id!(
    /// Identifier of a credential category owned by one user.
    CategoryId
);

uuid_id!(
    /// Identifier of one stored credential.
    PasswordId
);

impl CategoryId {
    /// Allocate a fresh, time-ordered category id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl PasswordId {
    /// Allocate a fresh, time-ordered credential id.
    ///
    /// Time ordering keeps keyset pages stable: new credentials sort after
    /// every id that already exists.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

/// Length of a key fingerprint in bytes.
pub const KEY_ID_LEN: usize = 16;

/// Fingerprint of the key that sealed a credential.
///
/// Stored beside every ciphertext so records can be matched to a key without
/// trial decryption. Reveals nothing about the key itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(pub [u8; KEY_ID_LEN]);

impl KeyId {
    /// Build a fingerprint from a stored column, rejecting wrong lengths.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        let arr: [u8; KEY_ID_LEN] = bytes.try_into().map_err(|_| {
            VaultError::Integrity(format!(
                "key id must be {KEY_ID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({self})")
    }
}

/// Page size used when the caller asks for "no limit": the largest integer
/// the relational store can represent.
pub const MAX_PAGE_SIZE: i64 = i64::MAX;

/// Position in a keyset-paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Start from the lowest id.
    #[default]
    Start,
    /// Continue strictly after the given id (the previous page's last id).
    After(Uuid),
}

impl Cursor {
    /// The value compared against with `id > ?`. The start sentinel is the nil
    /// UUID, which sorts before every generated id.
    pub fn lower_bound(&self) -> Uuid {
        match self {
            Cursor::Start => Uuid::nil(),
            Cursor::After(id) => *id,
        }
    }
}

impl From<PasswordId> for Cursor {
    fn from(id: PasswordId) -> Self {
        Cursor::After(id.0)
    }
}

impl From<CategoryId> for Cursor {
    fn from(id: CategoryId) -> Self {
        Cursor::After(id.0)
    }
}

/// A keyset page request: cursor plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Cursor,
    pub limit: i64,
}

impl PageRequest {
    /// First page of at most `limit` items.
    pub fn first(limit: i64) -> Self {
        Self {
            cursor: Cursor::Start,
            limit,
        }
    }

    /// Page of at most `limit` items following `cursor`.
    pub fn after(cursor: impl Into<Cursor>, limit: i64) -> Self {
        Self {
            cursor: cursor.into(),
            limit,
        }
    }

    /// Everything from the start, no page size limit.
    pub fn unbounded() -> Self {
        Self::first(MAX_PAGE_SIZE)
    }

    /// Reject page sizes the store cannot honor.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.limit <= 0 {
            return Err(VaultError::InvalidInput(format!(
                "page limit must be positive, got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// How a category is addressed: by id, or by its per-user unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryKey {
    Id(CategoryId),
    Name(String),
}

impl CategoryKey {
    /// Interpret a lookup key: a parseable UUID is an id, anything else a name.
    pub fn parse(key: &str) -> Self {
        match Uuid::parse_str(key) {
            Ok(id) => CategoryKey::Id(CategoryId(id)),
            Err(_) => CategoryKey::Name(key.to_string()),
        }
    }
}
