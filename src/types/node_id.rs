// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `NodeId`.

use std::{cmp::Ordering, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::types::{
    byte_string::ByteString,
    guid::Guid,
    ids::{DataTypeId, ObjectId, ObjectTypeId, ReferenceTypeId, VariableId, VariableTypeId},
};

/// The kind of identifier, numeric, string, guid or byte
#[derive(Eq, PartialEq, Clone, Debug, Hash)]
pub enum Identifier {
    /// Numeric node ID identifier. i=123
    Numeric(u32),
    /// String node ID identifier, s=...
    String(String),
    /// GUID node ID identifier, g=...
    Guid(Guid),
    /// Opaque node ID identifier, b=...
    ByteString(ByteString),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={}", *v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={}", v),
            Identifier::ByteString(v) => write!(f, "b={}", v.as_base64()),
        }
    }
}

impl FromStr for Identifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A two-character kind tag, then the payload.
        let Some(payload) = s.get(2..) else {
            return Err(());
        };
        match &s[..2] {
            "i=" => payload
                .parse::<u32>()
                .map(Identifier::Numeric)
                .map_err(|_| ()),
            "s=" => Ok(Identifier::String(payload.to_owned())),
            "g=" => Guid::from_str(payload).map(Identifier::Guid).map_err(|_| ()),
            "b=" => ByteString::from_base64(payload)
                .map(Identifier::ByteString)
                .ok_or(()),
            _ => Err(()),
        }
    }
}

impl Identifier {
    // Ranking used for the lexicographic node id ordering. The payload is
    // compared only between identifiers of the same kind.
    fn kind_rank(&self) -> u8 {
        match self {
            Identifier::Numeric(_) => 0,
            Identifier::String(_) => 1,
            Identifier::Guid(_) => 2,
            Identifier::ByteString(_) => 3,
        }
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::String(a), Identifier::String(b)) => a.cmp(b),
            (Identifier::Guid(a), Identifier::Guid(b)) => a.cmp(b),
            (Identifier::ByteString(a), Identifier::ByteString(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl<'a> From<&'a str> for Identifier {
    fn from(v: &'a str) -> Self {
        Identifier::String(v.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::String(v)
    }
}

impl From<Guid> for Identifier {
    fn from(v: Guid) -> Self {
        Identifier::Guid(v)
    }
}

impl From<ByteString> for Identifier {
    fn from(v: ByteString) -> Self {
        Identifier::ByteString(v)
    }
}

#[derive(Debug)]
/// Error returned from parsing a node ID from its textual form.
pub struct NodeIdError;

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIdError")
    }
}

impl std::error::Error for NodeIdError {}

/// An identifier for a node in the address space of an OPC UA Server.
#[derive(PartialEq, Eq, Clone, Debug, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// The index for a namespace
    pub namespace: u16,
    /// The identifier for the node in the address space
    pub identifier: Identifier,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    // Accepts the Part 6 text form: an optional `ns=<index>;` prefix
    // followed by a single identifier clause (`i=`, `s=`, `g=` or `b=`).
    // A missing prefix means the base namespace, mirroring how `Display`
    // omits `ns=0;` on output.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static NODE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^(ns=(?P<namespace>[0-9]+);)?(?P<identifier>[isgb]=.+)$").unwrap()
        });

        let parts = NODE_ID_PATTERN.captures(s).ok_or(NodeIdError)?;
        let namespace = match parts.name("namespace") {
            Some(index) => index.as_str().parse::<u16>().map_err(|_| NodeIdError)?,
            None => 0,
        };
        let identifier = parts.name("identifier").ok_or(NodeIdError)?;
        let identifier = Identifier::from_str(identifier.as_str()).map_err(|_| NodeIdError)?;
        Ok(NodeId::new(namespace, identifier))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

// Cheap comparisons intended for use when comparing node IDs to well-known
// ns=0 identifiers.
impl PartialEq<(u16, u32)> for NodeId {
    fn eq(&self, other: &(u16, u32)) -> bool {
        self.namespace == other.0
            && match &self.identifier {
                Identifier::Numeric(s) => s == &other.1,
                _ => false,
            }
    }
}

impl PartialEq<ObjectId> for NodeId {
    fn eq(&self, other: &ObjectId) -> bool {
        *self == (0u16, *other as u32)
    }
}

impl PartialEq<ObjectTypeId> for NodeId {
    fn eq(&self, other: &ObjectTypeId) -> bool {
        *self == (0u16, *other as u32)
    }
}

impl PartialEq<ReferenceTypeId> for NodeId {
    fn eq(&self, other: &ReferenceTypeId) -> bool {
        *self == (0u16, *other as u32)
    }
}

impl PartialEq<VariableId> for NodeId {
    fn eq(&self, other: &VariableId) -> bool {
        *self == (0u16, *other as u32)
    }
}

impl PartialEq<VariableTypeId> for NodeId {
    fn eq(&self, other: &VariableTypeId) -> bool {
        *self == (0u16, *other as u32)
    }
}

impl PartialEq<DataTypeId> for NodeId {
    fn eq(&self, other: &DataTypeId) -> bool {
        *self == (0u16, *other as u32)
    }
}

impl NodeId {
    /// Constructs a new NodeId from anything that can be turned into Identifier
    /// u32, Guid, ByteString or String
    pub fn new<T>(namespace: u16, value: T) -> NodeId
    where
        T: Into<Identifier>,
    {
        NodeId {
            namespace,
            identifier: value.into(),
        }
    }

    /// Returns a null node id
    pub fn null() -> NodeId {
        NodeId::new(0, 0u32)
    }

    /// Test if the node id is null, i.e. 0 namespace and 0 identifier
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    /// Test if the node id is a string
    pub fn is_string(&self) -> bool {
        matches!(self.identifier, Identifier::String(_))
    }

    /// Get the numeric value of this node ID if it is numeric.
    pub fn as_u32(&self) -> Option<u32> {
        match &self.identifier {
            Identifier::Numeric(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the string value of this node ID if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match &self.identifier {
            Identifier::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert this to a well-known reference type ID.
    pub fn as_reference_type_id(&self) -> Result<ReferenceTypeId, NodeIdError> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => {
                ReferenceTypeId::try_from(id).map_err(|_| NodeIdError)
            }
            _ => Err(NodeIdError),
        }
    }

    /// Try to convert this to a well-known data type ID.
    pub fn as_data_type_id(&self) -> Result<DataTypeId, NodeIdError> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => {
                DataTypeId::try_from(id).map_err(|_| NodeIdError)
            }
            _ => Err(NodeIdError),
        }
    }
}
