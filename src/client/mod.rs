// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The seam between the exporter and the OPC UA client library, and the
//! request-batching facade built on top of it.

mod adapter;
mod browse;

pub use adapter::SessionAdapter;
pub use browse::collect_child_node_ids;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    types::{
        AttributeId, BrowseDescription, BrowseResult, ByteString, DataValue, ExpandedNodeId,
        NodeClass, ReadValueId, ReferenceDescription, StatusCode,
    },
    values::AttributeValue,
};

/// The View and Attribute Service surface the exporter consumes from an
/// OPC UA client session.
///
/// Implementations must preserve the OPC UA request-response order
/// contract: the result vector of every call is aligned with the request
/// vector by position (Part 4, 5.10.2.2). The exporter relies on this
/// absolutely and never correlates results by node id.
#[async_trait]
pub trait UaServices {
    /// Discover the references of the given nodes, one [`BrowseResult`]
    /// per browse description. A result may carry a continuation point for
    /// use with [`browse_next`](Self::browse_next).
    async fn browse(
        &self,
        nodes_to_browse: &[BrowseDescription],
        max_references_per_node: u32,
    ) -> Result<Vec<BrowseResult>, StatusCode>;

    /// Continue paging browse results through the given continuation
    /// points.
    async fn browse_next(
        &self,
        release_continuation_points: bool,
        continuation_points: &[ByteString],
    ) -> Result<Vec<BrowseResult>, StatusCode>;

    /// Read one attribute per entry, one [`DataValue`] per read id.
    async fn read(&self, nodes_to_read: &[ReadValueId]) -> Result<Vec<DataValue>, StatusCode>;
}

/// Server-advertised operation limits honored when batching requests.
/// A value of 0 means the server advertises no limit.
#[derive(Debug, Copy, Clone, Default)]
pub struct OperationLimits {
    /// Max request entries in one Browse call.
    pub max_nodes_per_browse: u32,
    /// Max concurrently open browse continuation points.
    pub max_browse_continuation_points: u16,
    /// Hint for the per-entry reference cap of a Browse call.
    pub requested_max_references_per_node: u32,
    /// Max (node, attribute) pairs in one Read call.
    pub max_nodes_per_read: u32,
}

/// Request-response record of a node class read.
#[derive(Debug, Clone)]
pub struct NodeClassRequestResponse {
    /// The queried node.
    pub node_id: ExpandedNodeId,
    /// Response: the node's class, `Unspecified` when the read failed.
    pub node_class: NodeClass,
    /// Response: the per-entry status.
    pub status: StatusCode,
}

/// Request-response record of a node references read.
#[derive(Debug, Clone)]
pub struct NodeReferencesRequestResponse {
    /// The browsed node.
    pub node_id: ExpandedNodeId,
    /// Response: every reference of the node, both directions.
    pub references: Vec<ReferenceDescription>,
}

impl NodeReferencesRequestResponse {
    /// Creates an empty record for a node.
    pub fn new(node_id: ExpandedNodeId) -> Self {
        Self {
            node_id,
            references: Vec::new(),
        }
    }
}

/// Request-response record of a node attributes read. The key set of
/// `attrs` is the request; the values are filled in by the adapter.
#[derive(Debug, Clone)]
pub struct NodeAttributesRequestResponse {
    /// The queried node.
    pub node_id: ExpandedNodeId,
    /// Requested attributes, and after the call their values. Absent and
    /// bad-status attributes hold `None`.
    pub attrs: BTreeMap<AttributeId, Option<AttributeValue>>,
}

impl NodeAttributesRequestResponse {
    /// Creates a record requesting the given attributes.
    pub fn new(
        node_id: ExpandedNodeId,
        attributes: impl IntoIterator<Item = AttributeId>,
    ) -> Self {
        Self {
            node_id,
            attrs: attributes.into_iter().map(|id| (id, None)).collect(),
        }
    }
}
