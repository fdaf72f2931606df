// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! View Service browse records.

use crate::types::{
    byte_string::ByteString, node_id::NodeId, reference_description::ReferenceDescription,
    status_code::StatusCode,
};

/// Result mask requesting every reference description field.
pub const BROWSE_RESULT_MASK_ALL: u32 = 0x3f;

/// The direction of references to follow in a browse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum BrowseDirection {
    /// Follow forward references only.
    #[default]
    Forward = 0,
    /// Follow inverse references only.
    Inverse = 1,
    /// Follow references in both directions.
    Both = 2,
}

/// One entry of a Browse request.
///
/// See OPC UA Part 4 - Services 5.9.2.2.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseDescription {
    /// Node to browse.
    pub node_id: NodeId,
    /// Direction of references to follow.
    pub browse_direction: BrowseDirection,
    /// Reference type to follow, the `References` base to follow all.
    pub reference_type_id: NodeId,
    /// Whether subtypes of the reference type are followed too.
    pub include_subtypes: bool,
    /// Mask of node classes to return, 0 for all.
    pub node_class_mask: u32,
    /// Mask of reference description fields to return.
    pub result_mask: u32,
}

/// One result of a Browse or BrowseNext request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseResult {
    /// Per-entry status.
    pub status_code: StatusCode,
    /// Paging cursor, null when the result is complete.
    pub continuation_point: ByteString,
    /// The references found.
    pub references: Vec<ReferenceDescription>,
}
