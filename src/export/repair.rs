// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The reference repair stages.
//!
//! Each stage fixes one known way server reference graphs violate the
//! NodeSet2 invariants. The orchestrator applies them in a fixed order:
//! type definition normalization, abstract type replacement, inverse
//! reference synthesis, then (non-flat) the broken reference filter and
//! type class pruning, or (flat) the hierarchical reference purge.

use hashbrown::HashSet;
use log::{debug, warn};

use crate::types::{
    ExpandedNodeId, Identifier, NodeClass, NodeId, ObjectId, ReferenceDescription,
    ReferenceTypeId, VariableTypeId,
};

pub(crate) fn is_hierarchical_reference(reference_type_id: &NodeId) -> bool {
    reference_type_id
        .as_reference_type_id()
        .map_or(false, |id| id.is_hierarchical())
}

/// Flips inverse `HasTypeDefinition` references to forward and drops all
/// but the first one. Some servers (MasterOPC) report several, some report
/// them reversed; per Part 3 §7.13 a source Object or Variable has exactly
/// one, in the forward direction.
pub(crate) fn normalize_type_definition_references(
    node_id: &ExpandedNodeId,
    references: &mut Vec<ReferenceDescription>,
) {
    let mut type_definition_seen = false;
    references.retain_mut(|reference| {
        if reference.reference_type_id != ReferenceTypeId::HasTypeDefinition {
            return true;
        }
        if !reference.is_forward {
            warn!("An inverse reference of type HasTypeDefinition was found for node {node_id}. Fixing...");
            reference.is_forward = true;
        }
        if type_definition_seen {
            warn!("More than one reference of type HasTypeDefinition was found on node {node_id}. Removing...");
            return false;
        }
        type_definition_seen = true;
        true
    });
}

/// Rewrites `HasTypeDefinition` references targeting the abstract
/// `BaseVariableType` (i=62) to `BaseDataVariableType` (i=63). KepServer
/// assigns the abstract type to Variable nodes, and the NodeSet2 loader
/// refuses to instantiate it.
pub(crate) fn replace_abstract_variable_type(
    node_id: &ExpandedNodeId,
    references: &mut [ReferenceDescription],
) {
    for reference in references {
        if reference.reference_type_id == ReferenceTypeId::HasTypeDefinition
            && reference.node_id.node_id == VariableTypeId::BaseVariableType
        {
            warn!(
                "Node {node_id} has a reference with HasTypeDefinition = BaseVariableType (i=62). \
                 Changing to BaseDataVariableType (i=63)."
            );
            reference.node_id.node_id = VariableTypeId::BaseDataVariableType.into();
        }
    }
}

pub(crate) fn has_inverse_reference(references: &[ReferenceDescription]) -> bool {
    references.iter().any(|reference| !reference.is_forward)
}

/// Synthesizes the inverse reference KepServer-style servers omit. The
/// parent is derived from the node's string identifier: everything up to
/// the last '.', or the objects folder when there is no separator. A node
/// without a string identifier cannot be repaired this way.
///
/// Returns the synthesized target; the broken reference filter must keep
/// it even when it falls outside the exported set, otherwise the repair
/// would be undone right away.
pub(crate) fn synthesize_inverse_reference(
    node_id: &ExpandedNodeId,
    references: &mut Vec<ReferenceDescription>,
) -> Result<ExpandedNodeId, String> {
    let Identifier::String(ref identifier) = node_id.node_id.identifier else {
        return Err(format!(
            "node {node_id} does not have a string identifier, cannot build an inverse reference"
        ));
    };
    let target = ExpandedNodeId::new(match identifier.rfind('.') {
        Some(index) => NodeId::new(node_id.node_id.namespace, &identifier[..index]),
        None => ObjectId::ObjectsFolder.into(),
    });
    debug!("For node {node_id} adding an inverse HasComponent reference to {target}");
    references.push(ReferenceDescription {
        reference_type_id: ReferenceTypeId::HasComponent.into(),
        is_forward: false,
        node_id: target.clone(),
        ..Default::default()
    });
    Ok(target)
}

/// Flat mode removes every hierarchical reference, in both directions;
/// the synthetic start node re-hooks the children afterwards.
pub(crate) fn delete_hierarchical_references(
    node_id: &ExpandedNodeId,
    references: &mut Vec<ReferenceDescription>,
) {
    references.retain(|reference| {
        if is_hierarchical_reference(&reference.reference_type_id) {
            warn!(
                "{} hierarchical reference {} ==> {} was detected and removed.",
                if reference.is_forward { "Forward" } else { "Inverse" },
                node_id,
                reference.node_id
            );
            false
        } else {
            true
        }
    });
}

/// Removes references whose target will not appear in the exported set.
/// Targets in ns=0 and the freshly synthesized parent link are never
/// filtered.
pub(crate) fn delete_broken_references(
    node_id: &ExpandedNodeId,
    references: &mut Vec<ReferenceDescription>,
    exported_set: &HashSet<ExpandedNodeId>,
    ignored_by_class: &HashSet<ExpandedNodeId>,
    synthesized_target: Option<&ExpandedNodeId>,
) {
    references.retain(|reference| {
        if reference.node_id.node_id.namespace == 0 {
            return true;
        }
        if synthesized_target == Some(&reference.node_id) {
            return true;
        }
        if ignored_by_class.contains(&reference.node_id) {
            warn!(
                "The {} reference {} ==> {} is IGNORED because this node is deleted",
                if reference.is_forward { "forward" } else { "inverse" },
                node_id,
                reference.node_id
            );
            return false;
        }
        if !exported_set.contains(&reference.node_id) {
            warn!(
                "The {} reference {} ==> {} is IGNORED because this node is missing",
                if reference.is_forward { "forward" } else { "inverse" },
                node_id,
                reference.node_id
            );
            return false;
        }
        true
    });
}

/// In type class nodes only the inverse `HasSubtype` reference (and a
/// reference to the objects folder) survives. NodeSet2 loaders reconstruct
/// the other inverse references on import.
pub(crate) fn delete_non_subtype_inverse_references(
    node_id: &ExpandedNodeId,
    node_class: NodeClass,
    references: &mut Vec<ReferenceDescription>,
) {
    if !node_class.is_type_class() {
        return;
    }
    references.retain(|reference| {
        if !reference.is_forward
            && reference.reference_type_id != ReferenceTypeId::HasSubtype
            && reference.node_id.node_id != ObjectId::ObjectsFolder
        {
            warn!(
                "Found an inverse reference {} ==> {} in type class node {node_id} ({node_class}). \
                 Only the HasSubtype inverse reference is kept in this node class, removing it.",
                reference.reference_type_id, reference.node_id
            );
            false
        } else {
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32) -> ExpandedNodeId {
        ExpandedNodeId::new(NodeId::new(2, id))
    }

    fn reference(
        reference_type: ReferenceTypeId,
        is_forward: bool,
        target: NodeId,
    ) -> ReferenceDescription {
        ReferenceDescription {
            reference_type_id: reference_type.into(),
            is_forward,
            node_id: ExpandedNodeId::new(target),
            ..Default::default()
        }
    }

    #[test]
    fn reversed_type_definition_is_flipped() {
        let mut references = vec![reference(
            ReferenceTypeId::HasTypeDefinition,
            false,
            NodeId::new(0, 63u32),
        )];
        normalize_type_definition_references(&node(1), &mut references);
        assert!(references[0].is_forward);
    }

    #[test]
    fn extra_type_definitions_are_dropped() {
        let mut references = vec![
            reference(ReferenceTypeId::HasTypeDefinition, true, NodeId::new(0, 63u32)),
            reference(ReferenceTypeId::Organizes, false, NodeId::new(0, 85u32)),
            reference(ReferenceTypeId::HasTypeDefinition, true, NodeId::new(0, 61u32)),
        ];
        normalize_type_definition_references(&node(1), &mut references);
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].node_id.node_id, NodeId::new(0, 63u32));
    }

    #[test]
    fn abstract_variable_type_is_replaced() {
        let mut references = vec![reference(
            ReferenceTypeId::HasTypeDefinition,
            true,
            NodeId::new(0, 62u32),
        )];
        replace_abstract_variable_type(&node(1), &mut references);
        assert_eq!(references[0].node_id.node_id, NodeId::new(0, 63u32));
        // Other targets are left alone.
        let mut other = vec![reference(
            ReferenceTypeId::HasTypeDefinition,
            true,
            NodeId::new(0, 68u32),
        )];
        replace_abstract_variable_type(&node(1), &mut other);
        assert_eq!(other[0].node_id.node_id, NodeId::new(0, 68u32));
    }

    #[test]
    fn synthesized_inverse_uses_identifier_prefix() {
        let start = ExpandedNodeId::new(NodeId::new(1, "root.child.leaf"));
        let mut references = Vec::new();
        synthesize_inverse_reference(&start, &mut references).unwrap();
        assert_eq!(references.len(), 1);
        assert!(!references[0].is_forward);
        assert_eq!(
            references[0].node_id.node_id,
            NodeId::new(1, "root.child")
        );
        assert_eq!(
            references[0].reference_type_id,
            NodeId::from(ReferenceTypeId::HasComponent)
        );
    }

    #[test]
    fn synthesized_inverse_falls_back_to_objects_folder() {
        let start = ExpandedNodeId::new(NodeId::new(1, "leaf"));
        let mut references = Vec::new();
        synthesize_inverse_reference(&start, &mut references).unwrap();
        assert_eq!(references[0].node_id.node_id, NodeId::new(0, 85u32));
    }

    #[test]
    fn synthesis_requires_a_string_identifier() {
        let start = node(1);
        let mut references = Vec::new();
        assert!(synthesize_inverse_reference(&start, &mut references).is_err());
    }

    #[test]
    fn hierarchical_purge_keeps_type_definitions() {
        let mut references = vec![
            reference(ReferenceTypeId::HasTypeDefinition, true, NodeId::new(0, 63u32)),
            reference(ReferenceTypeId::Organizes, false, NodeId::new(0, 85u32)),
            reference(ReferenceTypeId::HasComponent, true, NodeId::new(2, 2u32)),
        ];
        delete_hierarchical_references(&node(1), &mut references);
        assert_eq!(references.len(), 1);
        assert_eq!(
            references[0].reference_type_id,
            NodeId::from(ReferenceTypeId::HasTypeDefinition)
        );
    }

    #[test]
    fn broken_reference_filter() {
        let exported: HashSet<ExpandedNodeId> = [node(1), node(2)].into_iter().collect();
        let ignored: HashSet<ExpandedNodeId> = [node(3)].into_iter().collect();
        let mut references = vec![
            reference(ReferenceTypeId::HasComponent, true, NodeId::new(2, 2u32)),
            reference(ReferenceTypeId::HasComponent, true, NodeId::new(2, 3u32)),
            reference(ReferenceTypeId::HasComponent, true, NodeId::new(2, 4u32)),
            reference(ReferenceTypeId::Organizes, false, NodeId::new(0, 85u32)),
        ];
        delete_broken_references(&node(1), &mut references, &exported, &ignored, None);
        let targets: Vec<String> = references.iter().map(|r| r.node_id.to_string()).collect();
        assert_eq!(targets, ["ns=2;i=2", "i=85"]);
    }

    #[test]
    fn broken_reference_filter_keeps_synthesized_parent() {
        let exported: HashSet<ExpandedNodeId> = HashSet::new();
        let ignored: HashSet<ExpandedNodeId> = HashSet::new();
        let parent = ExpandedNodeId::new(NodeId::new(1, "root.child"));
        let mut references = vec![ReferenceDescription {
            reference_type_id: ReferenceTypeId::HasComponent.into(),
            is_forward: false,
            node_id: parent.clone(),
            ..Default::default()
        }];
        delete_broken_references(&node(1), &mut references, &exported, &ignored, Some(&parent));
        assert_eq!(references.len(), 1);
    }

    #[test]
    fn type_class_pruning() {
        let mut references = vec![
            reference(ReferenceTypeId::HasSubtype, false, NodeId::new(0, 58u32)),
            reference(ReferenceTypeId::Organizes, false, NodeId::new(2, 9u32)),
            reference(ReferenceTypeId::Organizes, false, NodeId::new(0, 85u32)),
            reference(ReferenceTypeId::HasSubtype, true, NodeId::new(2, 7u32)),
        ];
        delete_non_subtype_inverse_references(&node(1), NodeClass::ObjectType, &mut references);
        assert_eq!(references.len(), 3);

        // Instance classes are left untouched.
        let mut untouched = vec![reference(ReferenceTypeId::Organizes, false, NodeId::new(2, 9u32))];
        delete_non_subtype_inverse_references(&node(1), NodeClass::Object, &mut untouched);
        assert_eq!(untouched.len(), 1);
    }
}
