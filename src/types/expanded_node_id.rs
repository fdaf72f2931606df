// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `ExpandedNodeId`.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::types::node_id::{NodeId, NodeIdError};

/// A NodeId that allows the namespace to be specified as a URI instead of
/// an index, and the node to live on another server.
#[derive(PartialEq, Eq, Clone, Debug, Hash, PartialOrd, Ord)]
pub struct ExpandedNodeId {
    /// The inner node ID.
    pub node_id: NodeId,
    /// Full namespace URI, overrides the namespace index when set.
    pub namespace_uri: Option<String>,
    /// Index of the server the node belongs to, 0 for the local server.
    pub server_index: u32,
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        ExpandedNodeId {
            node_id,
            namespace_uri: None,
            server_index: 0,
        }
    }
}

impl From<&NodeId> for ExpandedNodeId {
    fn from(node_id: &NodeId) -> Self {
        node_id.clone().into()
    }
}

impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Formatted depending on the value of the namespace uri and server
        // index fields, per Part 6 5.3.1.11.
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        if let Some(ref namespace_uri) = self.namespace_uri {
            write!(f, "nsu={};{}", namespace_uri, self.node_id.identifier)
        } else {
            write!(f, "{}", self.node_id)
        }
    }
}

impl FromStr for ExpandedNodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^(svr=(?P<svr>[0-9]+);)?(nsu=(?P<nsu>[^;]+);)?(?P<rest>.+)$").unwrap()
        });

        let captures = RE.captures(s).ok_or(NodeIdError)?;
        let server_index = if let Some(svr) = captures.name("svr") {
            svr.as_str().parse::<u32>().map_err(|_| NodeIdError)?
        } else {
            0
        };
        let namespace_uri = captures.name("nsu").map(|m| m.as_str().to_owned());
        let rest = captures.name("rest").unwrap().as_str();
        let node_id = NodeId::from_str(rest)?;
        Ok(ExpandedNodeId {
            node_id,
            namespace_uri,
            server_index,
        })
    }
}

impl Default for ExpandedNodeId {
    fn default() -> Self {
        ExpandedNodeId::null()
    }
}

impl ExpandedNodeId {
    /// Creates an expanded node id from a node id.
    pub fn new(node_id: impl Into<NodeId>) -> ExpandedNodeId {
        ExpandedNodeId {
            node_id: node_id.into(),
            namespace_uri: None,
            server_index: 0,
        }
    }

    /// Returns the null expanded node id.
    pub fn null() -> ExpandedNodeId {
        Self::new(NodeId::null())
    }

    /// Tests if the inner node id is null.
    pub fn is_null(&self) -> bool {
        self.node_id.is_null()
    }
}
