// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The request-batching facade over [`UaServices`].
//!
//! Every operation here preserves the OPC UA request-response order
//! contract across chunking and paging: results stream back into the
//! request containers by positional index, never by node id lookup.

use log::warn;

use crate::{
    client::{
        NodeAttributesRequestResponse, NodeClassRequestResponse, NodeReferencesRequestResponse,
        OperationLimits, UaServices,
    },
    error::ServiceError,
    types::{
        AttributeId, BrowseDescription, BrowseDirection, ExpandedNodeId, NodeClass, ReadValueId,
        ReferenceTypeId, Variant, BROWSE_RESULT_MASK_ALL,
    },
    values::{project_attribute, AttributeValue},
};

/// Request-batching facade over an OPC UA client session.
///
/// Exposes the four operations the export pipeline needs and honors the
/// server-advertised [`OperationLimits`] when splitting them into service
/// calls.
#[derive(Debug)]
pub struct SessionAdapter<'a, T> {
    services: &'a T,
    limits: OperationLimits,
}

impl<'a, T: UaServices> SessionAdapter<'a, T> {
    /// Creates an adapter over a client session.
    pub fn new(services: &'a T, limits: OperationLimits) -> Self {
        Self { services, limits }
    }

    fn read_chunk_size(&self, total: usize) -> usize {
        if self.limits.max_nodes_per_read == 0 {
            total.max(1)
        } else {
            self.limits.max_nodes_per_read as usize
        }
    }

    // Each browse entry may pin one continuation point on the server, so
    // the chunk honors both browse limits.
    fn browse_chunk_size(&self, total: usize) -> usize {
        let per_browse = match self.limits.max_nodes_per_browse {
            0 => total.max(1),
            n => n as usize,
        };
        let per_continuation = match self.limits.max_browse_continuation_points {
            0 => total.max(1),
            n => n as usize,
        };
        per_browse.min(per_continuation)
    }

    /// Reads the node class of every node, in request order. A failed
    /// per-entry read records its status and leaves the class
    /// `Unspecified`; the caller decides whether that is fatal.
    pub async fn read_node_classes(
        &self,
        node_ids: &[ExpandedNodeId],
    ) -> Result<Vec<NodeClassRequestResponse>, ServiceError> {
        let mut out = Vec::with_capacity(node_ids.len());
        for chunk in node_ids.chunks(self.read_chunk_size(node_ids.len())) {
            let request: Vec<ReadValueId> = chunk
                .iter()
                .map(|id| ReadValueId::new(id.node_id.clone(), AttributeId::NodeClass))
                .collect();
            let results = self
                .services
                .read(&request)
                .await
                .map_err(ServiceError::Status)?;
            if results.len() != request.len() {
                return Err(ServiceError::ResponseLength {
                    expected: request.len(),
                    actual: results.len(),
                });
            }
            for (node_id, data_value) in chunk.iter().zip(results) {
                let status = data_value.status();
                if status.is_uncertain() {
                    warn!("Node class read of node {node_id} has uncertain status '{status}'");
                }
                let node_class = if status.is_bad() || data_value.value.is_none() {
                    warn!("Node class read of node {node_id} has bad status '{status}'");
                    NodeClass::Unspecified
                } else {
                    match project_attribute(
                        AttributeId::NodeClass,
                        data_value.value.as_ref().unwrap_or(&Variant::Empty),
                    )? {
                        Some(AttributeValue::NodeClass(node_class)) => node_class,
                        _ => {
                            warn!("Node class read of node {node_id} returned an unexpected value");
                            NodeClass::Unspecified
                        }
                    }
                };
                out.push(NodeClassRequestResponse {
                    node_id: node_id.clone(),
                    node_class,
                    status,
                });
            }
        }
        Ok(out)
    }

    /// Browses every node in both directions for all reference types and
    /// pages each continuation point to exhaustion, appending into the
    /// request records in request order.
    pub async fn read_node_references(
        &self,
        requests: &mut [NodeReferencesRequestResponse],
    ) -> Result<(), ServiceError> {
        if requests.is_empty() {
            return Ok(());
        }
        let chunk_size = self.browse_chunk_size(requests.len());
        for chunk in requests.chunks_mut(chunk_size) {
            let descriptions: Vec<BrowseDescription> = chunk
                .iter()
                .map(|request| BrowseDescription {
                    node_id: request.node_id.node_id.clone(),
                    browse_direction: BrowseDirection::Both,
                    reference_type_id: ReferenceTypeId::References.into(),
                    include_subtypes: true,
                    node_class_mask: 0,
                    result_mask: BROWSE_RESULT_MASK_ALL,
                })
                .collect();
            let results = self
                .services
                .browse(&descriptions, self.limits.requested_max_references_per_node)
                .await
                .map_err(ServiceError::Status)?;
            if results.len() != descriptions.len() {
                return Err(ServiceError::ResponseLength {
                    expected: descriptions.len(),
                    actual: results.len(),
                });
            }
            for (request, result) in chunk.iter_mut().zip(results) {
                let node_id = &request.node_id;
                if result.status_code.is_bad() {
                    warn!(
                        "Browse result of node {node_id} has bad status '{}'",
                        result.status_code
                    );
                } else if result.status_code.is_uncertain() {
                    warn!(
                        "Browse result of node {node_id} has uncertain status '{}'",
                        result.status_code
                    );
                }
                request.references.extend(result.references);

                let mut continuation_point = result.continuation_point;
                while !continuation_point.is_null_or_empty() {
                    let next = self
                        .services
                        .browse_next(false, std::slice::from_ref(&continuation_point))
                        .await
                        .map_err(ServiceError::Status)?;
                    let Some(page) = next.into_iter().next() else {
                        return Err(ServiceError::ResponseLength {
                            expected: 1,
                            actual: 0,
                        });
                    };
                    if page.status_code.is_bad() {
                        warn!(
                            "BrowseNext result of node {node_id} has bad status '{}'",
                            page.status_code
                        );
                    }
                    request.references.extend(page.references);
                    continuation_point = page.continuation_point;
                }
            }
        }
        Ok(())
    }

    /// Reads the requested attribute set of every node. The attribute maps
    /// are flattened to (node, attribute) pairs in iteration order and the
    /// results re-scattered by running the identical order on the way out.
    pub async fn read_node_attributes(
        &self,
        requests: &mut [NodeAttributesRequestResponse],
    ) -> Result<(), ServiceError> {
        let mut flat = Vec::new();
        for request in requests.iter() {
            for attribute_id in request.attrs.keys() {
                flat.push(ReadValueId::new(request.node_id.node_id.clone(), *attribute_id));
            }
        }
        if flat.is_empty() {
            return Ok(());
        }

        let mut results = Vec::with_capacity(flat.len());
        for chunk in flat.chunks(self.read_chunk_size(flat.len())) {
            let chunk_results = self
                .services
                .read(chunk)
                .await
                .map_err(ServiceError::Status)?;
            if chunk_results.len() != chunk.len() {
                return Err(ServiceError::ResponseLength {
                    expected: chunk.len(),
                    actual: chunk_results.len(),
                });
            }
            results.extend(chunk_results);
        }

        let mut index = 0;
        for request in requests.iter_mut() {
            let node_id = request.node_id.clone();
            for (attribute_id, slot) in request.attrs.iter_mut() {
                let data_value = &results[index];
                index += 1;
                let status = data_value.status();
                if status.is_bad() || data_value.value.is_none() {
                    warn!(
                        "Attribute read ({attribute_id:?}) of node {node_id} has bad status '{status}'"
                    );
                    *slot = None;
                    continue;
                }
                if status.is_uncertain() {
                    warn!(
                        "Attribute read ({attribute_id:?}) of node {node_id} has uncertain status '{status}'"
                    );
                }
                *slot = match data_value.value.as_ref() {
                    Some(value) => project_attribute(*attribute_id, value)?,
                    None => None,
                };
            }
        }
        Ok(())
    }

    /// Reads the `Value` attribute of a single node.
    pub async fn read_value(&self, node_id: &ExpandedNodeId) -> Result<Variant, ServiceError> {
        let request = [ReadValueId::new(node_id.node_id.clone(), AttributeId::Value)];
        let results = self
            .services
            .read(&request)
            .await
            .map_err(ServiceError::Status)?;
        let Some(data_value) = results.into_iter().next() else {
            return Err(ServiceError::ResponseLength {
                expected: 1,
                actual: 0,
            });
        };
        let status = data_value.status();
        if status.is_bad() {
            return Err(ServiceError::Status(status));
        }
        if status.is_uncertain() {
            warn!("Value read of node {node_id} has uncertain status '{status}'");
        }
        Ok(data_value.value.unwrap_or(Variant::Empty))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hashbrown::HashMap;

    use super::*;
    use crate::types::{
        BrowseResult, ByteString, DataValue, NodeId, QualifiedName, ReferenceDescription,
        StatusCode,
    };

    /// Scripted service stub. Browse results are served in pages keyed by
    /// node id; reads answer from a (node, attribute) table. Request batch
    /// sizes are recorded so the tests can assert the chunking.
    #[derive(Default)]
    struct Scripted {
        reference_pages: HashMap<NodeId, Vec<Vec<ReferenceDescription>>>,
        read_values: HashMap<(NodeId, AttributeId), DataValue>,
        read_batch_sizes: Mutex<Vec<usize>>,
        browse_batch_sizes: Mutex<Vec<usize>>,
    }

    impl Scripted {
        fn continuation_point(node_id: &NodeId, page: usize) -> ByteString {
            ByteString::from(format!("{node_id}#{page}").into_bytes())
        }

        fn page_result(&self, node_id: &NodeId, page: usize) -> BrowseResult {
            let pages = &self.reference_pages[node_id];
            let continuation_point = if page + 1 < pages.len() {
                Self::continuation_point(node_id, page + 1)
            } else {
                ByteString::null()
            };
            BrowseResult {
                status_code: StatusCode::GOOD,
                continuation_point,
                references: pages[page].clone(),
            }
        }
    }

    #[async_trait]
    impl UaServices for Scripted {
        async fn browse(
            &self,
            nodes_to_browse: &[BrowseDescription],
            _max_references_per_node: u32,
        ) -> Result<Vec<BrowseResult>, StatusCode> {
            self.browse_batch_sizes
                .lock()
                .unwrap()
                .push(nodes_to_browse.len());
            Ok(nodes_to_browse
                .iter()
                .map(|description| self.page_result(&description.node_id, 0))
                .collect())
        }

        async fn browse_next(
            &self,
            _release_continuation_points: bool,
            continuation_points: &[ByteString],
        ) -> Result<Vec<BrowseResult>, StatusCode> {
            Ok(continuation_points
                .iter()
                .map(|point| {
                    let raw = String::from_utf8(point.as_ref().to_vec()).unwrap();
                    let (node, page) = raw.split_once('#').unwrap();
                    let node_id: NodeId = node.parse().unwrap();
                    self.page_result(&node_id, page.parse().unwrap())
                })
                .collect())
        }

        async fn read(&self, nodes_to_read: &[ReadValueId]) -> Result<Vec<DataValue>, StatusCode> {
            self.read_batch_sizes
                .lock()
                .unwrap()
                .push(nodes_to_read.len());
            Ok(nodes_to_read
                .iter()
                .map(|id| {
                    self.read_values
                        .get(&(id.node_id.clone(), id.attribute_id))
                        .cloned()
                        .unwrap_or_else(|| {
                            DataValue::status_only(StatusCode::BAD_ATTRIBUTE_ID_INVALID)
                        })
                })
                .collect())
        }
    }

    fn reference_to(target: u32) -> ReferenceDescription {
        ReferenceDescription {
            reference_type_id: ReferenceTypeId::HasComponent.into(),
            is_forward: true,
            node_id: ExpandedNodeId::new(NodeId::new(2, target)),
            browse_name: QualifiedName::new(2, format!("n{target}")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn node_classes_preserve_request_order() {
        let mut services = Scripted::default();
        services.read_values.insert(
            (NodeId::new(2, 1u32), AttributeId::NodeClass),
            DataValue::new(Variant::Int32(1)),
        );
        services.read_values.insert(
            (NodeId::new(2, 2u32), AttributeId::NodeClass),
            DataValue::new(Variant::Int32(2)),
        );
        let adapter = SessionAdapter::new(&services, OperationLimits::default());
        let request = vec![
            ExpandedNodeId::new(NodeId::new(2, 2u32)),
            ExpandedNodeId::new(NodeId::new(2, 3u32)),
            ExpandedNodeId::new(NodeId::new(2, 1u32)),
        ];
        let classes = adapter.read_node_classes(&request).await.unwrap();
        assert_eq!(classes[0].node_class, NodeClass::Variable);
        assert_eq!(classes[1].node_class, NodeClass::Unspecified);
        assert!(classes[1].status.is_bad());
        assert_eq!(classes[2].node_class, NodeClass::Object);
    }

    #[tokio::test]
    async fn read_honors_max_nodes_per_read() {
        let services = Scripted::default();
        let limits = OperationLimits {
            max_nodes_per_read: 2,
            ..Default::default()
        };
        let adapter = SessionAdapter::new(&services, limits);
        let request: Vec<ExpandedNodeId> = (0..5u32)
            .map(|i| ExpandedNodeId::new(NodeId::new(2, i)))
            .collect();
        adapter.read_node_classes(&request).await.unwrap();
        assert_eq!(*services.read_batch_sizes.lock().unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn browse_pages_continuation_points() {
        let mut services = Scripted::default();
        services.reference_pages.insert(
            NodeId::new(2, 1u32),
            vec![
                vec![reference_to(10), reference_to(11)],
                vec![reference_to(12)],
                vec![reference_to(13)],
            ],
        );
        let adapter = SessionAdapter::new(&services, OperationLimits::default());
        let mut requests =
            vec![NodeReferencesRequestResponse::new(ExpandedNodeId::new(NodeId::new(2, 1u32)))];
        adapter.read_node_references(&mut requests).await.unwrap();
        let targets: Vec<String> = requests[0]
            .references
            .iter()
            .map(|r| r.node_id.to_string())
            .collect();
        assert_eq!(targets, ["ns=2;i=10", "ns=2;i=11", "ns=2;i=12", "ns=2;i=13"]);
    }

    #[tokio::test]
    async fn browse_honors_continuation_point_limit() {
        let mut services = Scripted::default();
        for i in 0..4u32 {
            services
                .reference_pages
                .insert(NodeId::new(2, i), vec![vec![reference_to(100 + i)]]);
        }
        let limits = OperationLimits {
            max_nodes_per_browse: 3,
            max_browse_continuation_points: 2,
            ..Default::default()
        };
        let adapter = SessionAdapter::new(&services, limits);
        let mut requests: Vec<NodeReferencesRequestResponse> = (0..4u32)
            .map(|i| NodeReferencesRequestResponse::new(ExpandedNodeId::new(NodeId::new(2, i))))
            .collect();
        adapter.read_node_references(&mut requests).await.unwrap();
        assert_eq!(*services.browse_batch_sizes.lock().unwrap(), vec![2, 2]);
    }

    #[tokio::test]
    async fn attributes_scatter_by_position() {
        let mut services = Scripted::default();
        let node_a = NodeId::new(2, 1u32);
        let node_b = NodeId::new(2, 2u32);
        services.read_values.insert(
            (node_a.clone(), AttributeId::BrowseName),
            DataValue::new(Variant::from(QualifiedName::new(2, "a"))),
        );
        services.read_values.insert(
            (node_b.clone(), AttributeId::BrowseName),
            DataValue::new(Variant::from(QualifiedName::new(2, "b"))),
        );
        services.read_values.insert(
            (node_b.clone(), AttributeId::WriteMask),
            DataValue::new(Variant::UInt32(96)),
        );
        let adapter = SessionAdapter::new(&services, OperationLimits::default());
        let mut requests = vec![
            NodeAttributesRequestResponse::new(
                ExpandedNodeId::new(node_a),
                [AttributeId::BrowseName, AttributeId::WriteMask],
            ),
            NodeAttributesRequestResponse::new(
                ExpandedNodeId::new(node_b),
                [AttributeId::BrowseName, AttributeId::WriteMask],
            ),
        ];
        adapter.read_node_attributes(&mut requests).await.unwrap();
        assert_eq!(
            requests[0].attrs[&AttributeId::BrowseName],
            Some(AttributeValue::QualifiedName(QualifiedName::new(2, "a")))
        );
        // Missing attribute comes back as a bad status, downgraded to None.
        assert_eq!(requests[0].attrs[&AttributeId::WriteMask], None);
        assert_eq!(
            requests[1].attrs[&AttributeId::BrowseName],
            Some(AttributeValue::QualifiedName(QualifiedName::new(2, "b")))
        );
        assert_eq!(
            requests[1].attrs[&AttributeId::WriteMask],
            Some(AttributeValue::UInt32(96))
        );
    }
}
