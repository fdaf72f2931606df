// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Collecting an export node list by walking the hierarchy below a start
//! node.

use hashbrown::HashSet;
use log::debug;

use crate::{
    client::UaServices,
    error::ServiceError,
    types::{
        BrowseDescription, BrowseDirection, ExpandedNodeId, ReferenceTypeId,
        BROWSE_RESULT_MASK_ALL,
    },
};

/// Walks forward hierarchical references below `start_node_id` wave by
/// wave and returns the start node followed by every reachable descendant
/// in discovery order. The result is the canonical node list input for
/// [`export_nodeset`](crate::export_nodeset).
pub async fn collect_child_node_ids<T: UaServices>(
    services: &T,
    start_node_id: &ExpandedNodeId,
) -> Result<Vec<ExpandedNodeId>, ServiceError> {
    let mut out = vec![start_node_id.clone()];
    let mut seen: HashSet<ExpandedNodeId> = out.iter().cloned().collect();
    let mut wave_start = 0;

    while wave_start < out.len() {
        let descriptions: Vec<BrowseDescription> = out[wave_start..]
            .iter()
            .map(|node| BrowseDescription {
                node_id: node.node_id.clone(),
                browse_direction: BrowseDirection::Forward,
                reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
                include_subtypes: true,
                node_class_mask: 0,
                result_mask: BROWSE_RESULT_MASK_ALL,
            })
            .collect();
        wave_start = out.len();

        let results = services
            .browse(&descriptions, 0)
            .await
            .map_err(ServiceError::Status)?;
        if results.len() != descriptions.len() {
            return Err(ServiceError::ResponseLength {
                expected: descriptions.len(),
                actual: results.len(),
            });
        }
        for result in results {
            if result.status_code.is_bad() {
                return Err(ServiceError::Status(result.status_code));
            }
            for reference in result.references {
                if reference.is_forward && seen.insert(reference.node_id.clone()) {
                    out.push(reference.node_id);
                }
            }
        }
        debug!("Hierarchy walk found {} nodes so far", out.len());
    }
    Ok(out)
}
