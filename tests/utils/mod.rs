// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! An in-memory address space standing in for an OPC UA server session.

use std::{
    collections::HashMap,
    io::Write,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use nodeset_export::client::UaServices;
use nodeset_export::types::{
    Array, AttributeId, BrowseDescription, BrowseDirection, BrowseResult, ByteString, DataTypeId,
    DataValue, ExpandedNodeId, LocalizedText, NodeClass, NodeId, ObjectTypeId, QualifiedName,
    ReadValueId, ReferenceDescription, ReferenceTypeId, StatusCode, VariableId, VariableTypeId,
    Variant, VariantScalarTypeId,
};

/// One node of the fixture address space.
pub struct TestNode {
    pub node_class: NodeClass,
    pub browse_name: QualifiedName,
    pub display_name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub attributes: HashMap<AttributeId, Variant>,
    pub references: Vec<ReferenceDescription>,
}

impl TestNode {
    pub fn new(node_class: NodeClass, browse_name: QualifiedName) -> TestNode {
        let display_name = LocalizedText::from(browse_name.name.clone());
        TestNode {
            node_class,
            browse_name,
            display_name,
            description: None,
            attributes: HashMap::new(),
            references: Vec::new(),
        }
    }
}

/// Scripted [`UaServices`] implementation over the fixture space. Browse
/// results can be paged to exercise continuation point handling.
pub struct TestServices {
    pub namespace_array: Vec<String>,
    pub nodes: HashMap<NodeId, TestNode>,
    pub browse_page_size: usize,
}

impl Default for TestServices {
    fn default() -> Self {
        TestServices {
            namespace_array: vec![
                "http://opcfoundation.org/UA/".to_owned(),
                "urn:vendor:ns:one".to_owned(),
                "urn:vendor:ns:two".to_owned(),
            ],
            nodes: HashMap::new(),
            browse_page_size: 0,
        }
    }
}

pub fn reference(
    reference_type: impl Into<NodeId>,
    is_forward: bool,
    target: impl Into<NodeId>,
) -> ReferenceDescription {
    ReferenceDescription {
        reference_type_id: reference_type.into(),
        is_forward,
        node_id: ExpandedNodeId::new(target.into()),
        ..Default::default()
    }
}

impl TestServices {
    /// Adds an Object node referencing the objects folder as its parent.
    pub fn add_object(&mut self, node_id: NodeId, name: &str) {
        let mut node = TestNode::new(
            NodeClass::Object,
            QualifiedName::new(node_id.namespace, name),
        );
        node.references = vec![
            reference(ReferenceTypeId::HasTypeDefinition, true, ObjectTypeId::FolderType),
            reference(ReferenceTypeId::Organizes, false, NodeId::new(0, 85u32)),
        ];
        self.nodes.insert(node_id, node);
    }

    /// Adds a Variable node below `parent`, wiring the component
    /// references in both directions.
    pub fn add_variable(
        &mut self,
        node_id: NodeId,
        name: &str,
        parent: NodeId,
        data_type: DataTypeId,
        value: Variant,
    ) {
        let mut node = TestNode::new(
            NodeClass::Variable,
            QualifiedName::new(node_id.namespace, name),
        );
        node.references = vec![
            reference(
                ReferenceTypeId::HasTypeDefinition,
                true,
                VariableTypeId::BaseDataVariableType,
            ),
            reference(ReferenceTypeId::HasComponent, false, parent.clone()),
        ];
        node.attributes
            .insert(AttributeId::DataType, Variant::NodeId(Box::new(data_type.into())));
        node.attributes.insert(AttributeId::Value, value);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.references.push(reference(
                ReferenceTypeId::HasComponent,
                true,
                node_id.clone(),
            ));
        }
        self.nodes.insert(node_id, node);
    }

    fn browse_page(&self, description: &BrowseDescription, offset: usize) -> BrowseResult {
        let Some(node) = self.nodes.get(&description.node_id) else {
            return BrowseResult {
                status_code: StatusCode::BAD_NODE_ID_UNKNOWN,
                ..Default::default()
            };
        };
        let matching: Vec<ReferenceDescription> = node
            .references
            .iter()
            .filter(|r| match description.browse_direction {
                BrowseDirection::Forward => r.is_forward,
                BrowseDirection::Inverse => !r.is_forward,
                BrowseDirection::Both => true,
            })
            .filter(|r| {
                if description.reference_type_id == ReferenceTypeId::References {
                    true
                } else if description.reference_type_id
                    == ReferenceTypeId::HierarchicalReferences
                    && description.include_subtypes
                {
                    r.reference_type_id
                        .as_reference_type_id()
                        .map(|id| id.is_hierarchical())
                        .unwrap_or(false)
                } else {
                    r.reference_type_id == description.reference_type_id
                }
            })
            .cloned()
            .collect();

        if self.browse_page_size == 0 || matching.len() <= offset + self.browse_page_size {
            BrowseResult {
                status_code: StatusCode::GOOD,
                continuation_point: ByteString::null(),
                references: matching.into_iter().skip(offset).collect(),
            }
        } else {
            let next = offset + self.browse_page_size;
            BrowseResult {
                status_code: StatusCode::GOOD,
                continuation_point: ByteString::from(
                    format!("{}|{next}", description.node_id).into_bytes(),
                ),
                references: matching
                    .into_iter()
                    .skip(offset)
                    .take(self.browse_page_size)
                    .collect(),
            }
        }
    }

    fn read_one(&self, to_read: &ReadValueId) -> DataValue {
        if to_read.node_id == VariableId::ServerNamespaceArray
            && to_read.attribute_id == AttributeId::Value
        {
            let uris: Vec<Variant> = self
                .namespace_array
                .iter()
                .map(|uri| Variant::String(uri.clone()))
                .collect();
            let array = Array::new_single(VariantScalarTypeId::String, uris).unwrap();
            return DataValue::new(array);
        }
        let Some(node) = self.nodes.get(&to_read.node_id) else {
            return DataValue::status_only(StatusCode::BAD_NODE_ID_UNKNOWN);
        };
        match to_read.attribute_id {
            // Served as a plain Int32, the way unpatched servers report it.
            AttributeId::NodeClass => DataValue::new(Variant::Int32(node.node_class as i32)),
            AttributeId::BrowseName => {
                DataValue::new(Variant::QualifiedName(Box::new(node.browse_name.clone())))
            }
            AttributeId::DisplayName => {
                DataValue::new(Variant::LocalizedText(Box::new(node.display_name.clone())))
            }
            AttributeId::Description => match &node.description {
                Some(description) => {
                    DataValue::new(Variant::LocalizedText(Box::new(description.clone())))
                }
                None => DataValue::status_only(StatusCode::BAD_ATTRIBUTE_ID_INVALID),
            },
            other => match node.attributes.get(&other) {
                Some(value) => DataValue::new(value.clone()),
                None => DataValue::status_only(StatusCode::BAD_ATTRIBUTE_ID_INVALID),
            },
        }
    }
}

#[async_trait]
impl UaServices for TestServices {
    async fn browse(
        &self,
        nodes_to_browse: &[BrowseDescription],
        _max_references_per_node: u32,
    ) -> Result<Vec<BrowseResult>, StatusCode> {
        Ok(nodes_to_browse
            .iter()
            .map(|description| self.browse_page(description, 0))
            .collect())
    }

    async fn browse_next(
        &self,
        _release_continuation_points: bool,
        continuation_points: &[ByteString],
    ) -> Result<Vec<BrowseResult>, StatusCode> {
        continuation_points
            .iter()
            .map(|point| {
                let raw = String::from_utf8(point.as_ref().to_vec())
                    .map_err(|_| StatusCode::BAD_UNEXPECTED_ERROR)?;
                let (node, offset) = raw
                    .split_once('|')
                    .ok_or(StatusCode::BAD_UNEXPECTED_ERROR)?;
                let node_id: NodeId =
                    node.parse().map_err(|_| StatusCode::BAD_UNEXPECTED_ERROR)?;
                let offset: usize =
                    offset.parse().map_err(|_| StatusCode::BAD_UNEXPECTED_ERROR)?;
                let description = BrowseDescription {
                    node_id,
                    browse_direction: BrowseDirection::Both,
                    reference_type_id: ReferenceTypeId::References.into(),
                    include_subtypes: true,
                    node_class_mask: 0,
                    result_mask: 0x3f,
                };
                Ok(self.browse_page(&description, offset))
            })
            .collect()
    }

    async fn read(&self, nodes_to_read: &[ReadValueId]) -> Result<Vec<DataValue>, StatusCode> {
        Ok(nodes_to_read.iter().map(|id| self.read_one(id)).collect())
    }
}

/// A `Write` target that stays readable after the export consumed the
/// boxed stream.
#[derive(Clone, Default)]
pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
