// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Attribute Service read records.

use crate::types::{
    attribute::AttributeId, node_id::NodeId, status_code::StatusCode, variant::Variant,
};

/// One entry of a Read request, a node paired with the attribute to read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadValueId {
    /// Node to read.
    pub node_id: NodeId,
    /// Attribute to read.
    pub attribute_id: AttributeId,
}

impl ReadValueId {
    /// Creates a read entry.
    pub fn new(node_id: NodeId, attribute_id: AttributeId) -> ReadValueId {
        ReadValueId {
            node_id,
            attribute_id,
        }
    }
}

/// One result of a Read request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The attribute value, absent when the read failed.
    pub value: Option<Variant>,
    /// Per-entry status, absent means Good.
    pub status: Option<StatusCode>,
}

impl DataValue {
    /// A value with Good status.
    pub fn new(value: impl Into<Variant>) -> DataValue {
        DataValue {
            value: Some(value.into()),
            status: None,
        }
    }

    /// A result with a status and no value.
    pub fn status_only(status: StatusCode) -> DataValue {
        DataValue {
            value: None,
            status: Some(status),
        }
    }

    /// The effective status of the result.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::GOOD)
    }
}
