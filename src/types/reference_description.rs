// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The `ReferenceDescription` returned for each reference found by a browse.

use crate::types::{
    expanded_node_id::ExpandedNodeId, localized_text::LocalizedText, node_class::NodeClass,
    node_id::NodeId, qualified_name::QualifiedName,
};

/// Description of one reference of a browsed node.
///
/// See OPC UA Part 4 - Services 5.9.2.3.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceDescription {
    /// Type of the reference.
    pub reference_type_id: NodeId,
    /// Direction of the reference as seen from the browsed node.
    pub is_forward: bool,
    /// The target node.
    pub node_id: ExpandedNodeId,
    /// Browse name of the target node.
    pub browse_name: QualifiedName,
    /// Display name of the target node.
    pub display_name: LocalizedText,
    /// Node class of the target node.
    pub node_class: NodeClass,
    /// Type definition of the target node, for Object and Variable targets.
    pub type_definition: ExpandedNodeId,
}
