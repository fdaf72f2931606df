// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The per-node aggregate handed to the encoder.

use std::{collections::BTreeMap, fmt};

use crate::{
    types::{
        AttributeId, ExpandedNodeId, LocalizedText, NodeClass, NodeId, QualifiedName,
        ReferenceDescription,
    },
    values::AttributeValue,
};

/// Everything the encoder needs to emit one node: identity, parent,
/// class, the repaired reference list and the fetched attributes.
#[derive(Debug, Clone)]
pub struct NodeIntermediateModel {
    /// The node itself.
    pub node_id: ExpandedNodeId,
    /// The resolved parent node.
    pub parent_node_id: ExpandedNodeId,
    /// The node's class.
    pub node_class: NodeClass,
    /// All references of the node after filtering and repair.
    pub references: Vec<ReferenceDescription>,
    /// Fetched attributes; `None` marks an absent or unreadable attribute.
    pub attributes: BTreeMap<AttributeId, Option<AttributeValue>>,
}

impl NodeIntermediateModel {
    /// The value of an attribute, if it was fetched and present.
    pub fn attribute(&self, attribute_id: AttributeId) -> Option<&AttributeValue> {
        self.attributes.get(&attribute_id).and_then(|v| v.as_ref())
    }

    /// The node's browse name.
    pub fn browse_name(&self) -> Option<&QualifiedName> {
        self.attribute(AttributeId::BrowseName)?.as_qualified_name()
    }

    /// The node's display name.
    pub fn display_name(&self) -> Option<&LocalizedText> {
        self.attribute(AttributeId::DisplayName)?.as_localized_text()
    }

    /// The node's description.
    pub fn description(&self) -> Option<&LocalizedText> {
        self.attribute(AttributeId::Description)?.as_localized_text()
    }

    /// Alias strings of every ns=0 reference type appearing in the node's
    /// reference list, paired with the reference they belong to. Reference
    /// types without a well-known name carry no alias.
    pub fn reference_type_aliases(&self) -> Vec<(&ReferenceDescription, String)> {
        self.references
            .iter()
            .filter_map(|reference| {
                let id = reference.reference_type_id.as_reference_type_id().ok()?;
                Some((reference, id.name()))
            })
            .collect()
    }

    /// For Variable and VariableType nodes, the alias of the node's data
    /// type when it lives in ns=0.
    pub fn data_type_alias(&self) -> Option<(String, NodeId)> {
        if !matches!(
            self.node_class,
            NodeClass::Variable | NodeClass::VariableType
        ) {
            return None;
        }
        let data_type = self.attribute(AttributeId::DataType)?.as_node_id()?;
        let id = data_type.as_data_type_id().ok()?;
        Some((id.name(), data_type.clone()))
    }
}

impl fmt::Display for NodeIntermediateModel {
    // Debug dump used by trace logging.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "NodeId: {}, ParentNodeId: {}, NodeClass: {}",
            self.node_id, self.parent_node_id, self.node_class
        )?;
        writeln!(f, "References ({}):", self.references.len())?;
        for reference in &self.references {
            writeln!(
                f,
                "  {} {} ==> {}",
                reference.reference_type_id,
                if reference.is_forward { "forward" } else { "inverse" },
                reference.node_id
            )?;
        }
        writeln!(f, "Attributes ({}):", self.attributes.len())?;
        for (attribute_id, value) in &self.attributes {
            match value {
                Some(value) => writeln!(f, "  {attribute_id:?}: {value}")?,
                None => writeln!(f, "  {attribute_id:?}: <absent>")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataTypeId, ReferenceTypeId};

    fn model(node_class: NodeClass) -> NodeIntermediateModel {
        NodeIntermediateModel {
            node_id: ExpandedNodeId::new(NodeId::new(2, 1u32)),
            parent_node_id: ExpandedNodeId::new(NodeId::new(0, 85u32)),
            node_class,
            references: vec![
                ReferenceDescription {
                    reference_type_id: ReferenceTypeId::HasTypeDefinition.into(),
                    is_forward: true,
                    node_id: ExpandedNodeId::new(NodeId::new(0, 63u32)),
                    ..Default::default()
                },
                ReferenceDescription {
                    reference_type_id: NodeId::new(3, 4444u32),
                    is_forward: false,
                    node_id: ExpandedNodeId::new(NodeId::new(2, 2u32)),
                    ..Default::default()
                },
            ],
            attributes: BTreeMap::from([(
                AttributeId::DataType,
                Some(AttributeValue::NodeId(DataTypeId::Double.into())),
            )]),
        }
    }

    #[test]
    fn reference_type_aliases_cover_known_ns0_types() {
        let model = model(NodeClass::Variable);
        let aliases = model.reference_type_aliases();
        // The custom ns=3 reference type has no alias.
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].1, "HasTypeDefinition");
    }

    #[test]
    fn data_type_alias_only_for_variables() {
        assert_eq!(
            model(NodeClass::Variable).data_type_alias(),
            Some(("Double".to_owned(), NodeId::new(0, 11u32)))
        );
        assert_eq!(model(NodeClass::Object).data_type_alias(), None);
    }
}
