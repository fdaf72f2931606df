// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The export orchestrator: drives the session adapter, repairs the
//! returned reference graph and feeds the encoder.

mod repair;
mod timer;

use std::{collections::BTreeMap, fmt};

use hashbrown::HashSet;
use log::{debug, error, info, warn};

use crate::{
    client::{
        NodeAttributesRequestResponse, NodeClassRequestResponse, NodeReferencesRequestResponse,
        OperationLimits, SessionAdapter, UaServices,
    },
    encoder::{EncoderType, ExportTarget, NodesetEncoder, XmlEncoder},
    error::ExportError,
    model::NodeIntermediateModel,
    types::{
        AttributeId, DataTypeId, ExpandedNodeId, Identifier, LocalizedText, NodeClass, NodeId,
        ObjectId, ObjectTypeId, QualifiedName, ReferenceDescription, ReferenceTypeId, VariableId,
        VariableTypeId, Variant, VariantScalarTypeId,
    },
    values::AttributeValue,
};

use timer::PerfTimer;

/// Options of the flat hierarchy mode.
#[derive(Debug, Clone, Default)]
pub struct FlatListOptions {
    /// Produce a single-level hierarchy rooted at the start node. All
    /// hierarchical references between the exported nodes are removed and
    /// every node is re-hooked onto the start node.
    pub is_enable: bool,
    /// Fabricate the start node as an Object when it does not exist on
    /// the server.
    pub create_missing_start_node: bool,
    /// Add the extra backlinks that let the loader accept a Variable
    /// start node of an abstract type.
    pub allow_abstract_variable: bool,
}

/// Additional export options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Cap on the number of nodes whose data is fetched in one pipeline
    /// batch, 0 for no cap.
    pub number_of_max_nodes_to_request_data: u32,
    /// The output encoding.
    pub encoder_type: EncoderType,
    /// Parent substituted for a start node that has no reference to the
    /// objects folder.
    pub parent_start_node_replacer: ExpandedNodeId,
    /// Log per-stage timings at Info level.
    pub is_perf_timer_enable: bool,
    /// Allow user-defined nodes living in the OPC UA base namespace.
    pub ns0_custom_nodes_ready_to_work: bool,
    /// Flat hierarchy mode.
    pub flat_list_of_nodes: FlatListOptions,
    /// Server-advertised operation limits for request batching.
    pub limits: OperationLimits,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            number_of_max_nodes_to_request_data: 0,
            encoder_type: EncoderType::Xml,
            parent_start_node_replacer: ExpandedNodeId::new(NodeId::from(ObjectId::ObjectsFolder)),
            is_perf_timer_enable: false,
            ns0_custom_nodes_ready_to_work: false,
            flat_list_of_nodes: FlatListOptions::default(),
            limits: OperationLimits::default(),
        }
    }
}

/// Counts of exported nodes per class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStatistics {
    /// Exported Object nodes.
    pub object_nodes: u64,
    /// Exported Variable nodes.
    pub variable_nodes: u64,
    /// Exported ObjectType nodes.
    pub object_type_nodes: u64,
    /// Exported VariableType nodes.
    pub variable_type_nodes: u64,
    /// Exported ReferenceType nodes.
    pub reference_type_nodes: u64,
    /// Exported DataType nodes.
    pub data_type_nodes: u64,
}

impl ExportStatistics {
    /// Total number of exported nodes.
    pub fn total(&self) -> u64 {
        self.object_nodes
            + self.variable_nodes
            + self.object_type_nodes
            + self.variable_type_nodes
            + self.reference_type_nodes
            + self.data_type_nodes
    }
}

impl fmt::Display for ExportStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Objects: {}", self.object_nodes)?;
        writeln!(f, "Variables: {}", self.variable_nodes)?;
        writeln!(f, "ObjectTypes: {}", self.object_type_nodes)?;
        writeln!(f, "VariableTypes: {}", self.variable_type_nodes)?;
        writeln!(f, "ReferenceTypes: {}", self.reference_type_nodes)?;
        write!(f, "DataTypes: {}", self.data_type_nodes)
    }
}

/// Exports the given node lists from a live session into a NodeSet2
/// document.
///
/// `node_lists` maps a start node key to the list of nodes exported for
/// it; the first element of each list is the start node itself (see
/// [`collect_child_node_ids`](crate::client::collect_child_node_ids)).
/// The lists are deduplicated order-preservingly before processing.
pub async fn export_nodeset<T: UaServices>(
    services: &T,
    node_lists: BTreeMap<String, Vec<ExpandedNodeId>>,
    target: ExportTarget,
    options: Options,
) -> Result<ExportStatistics, ExportError> {
    // XML is the only encoding defined for NodeSet2 documents.
    let EncoderType::Xml = options.encoder_type;
    let encoder = XmlEncoder::new(target);
    let adapter = SessionAdapter::new(services, options.limits);
    ExportLoop::new(adapter, encoder, options).run(node_lists).await
}

fn is_standard_ns0_root(node_id: &NodeId) -> bool {
    *node_id == ObjectId::RootFolder
        || *node_id == ObjectId::ObjectsFolder
        || *node_id == ObjectId::TypesFolder
        || *node_id == ObjectId::ViewsFolder
}

fn identifier_text(node_id: &NodeId) -> String {
    match &node_id.identifier {
        Identifier::Numeric(v) => v.to_string(),
        Identifier::String(v) => v.clone(),
        Identifier::Guid(v) => v.to_string(),
        Identifier::ByteString(v) => v.as_base64(),
    }
}

// The attribute sets requested per node class: the common set plus the
// class columns of the UANodeSet schema.
fn attribute_set(node_id: &ExpandedNodeId, node_class: NodeClass) -> Vec<AttributeId> {
    let mut attributes = vec![
        AttributeId::NodeClass,
        AttributeId::BrowseName,
        AttributeId::DisplayName,
        AttributeId::Description,
        AttributeId::WriteMask,
        AttributeId::UserWriteMask,
    ];
    match node_class {
        NodeClass::Object => attributes.push(AttributeId::EventNotifier),
        NodeClass::Variable => attributes.extend([
            AttributeId::Value,
            AttributeId::DataType,
            AttributeId::ValueRank,
            AttributeId::ArrayDimensions,
            AttributeId::AccessLevel,
            AttributeId::UserAccessLevel,
            AttributeId::MinimumSamplingInterval,
            AttributeId::Historizing,
        ]),
        NodeClass::ObjectType => attributes.push(AttributeId::IsAbstract),
        NodeClass::VariableType => attributes.extend([
            AttributeId::Value,
            AttributeId::DataType,
            AttributeId::ValueRank,
            AttributeId::ArrayDimensions,
            AttributeId::IsAbstract,
        ]),
        NodeClass::ReferenceType => attributes.extend([
            AttributeId::IsAbstract,
            AttributeId::Symmetric,
            AttributeId::InverseName,
        ]),
        NodeClass::DataType => attributes.extend([
            AttributeId::IsAbstract,
            AttributeId::DataTypeDefinition,
        ]),
        _ => {
            warn!("Getting attributes of node class {node_class} is not implemented. Node ID: {node_id}");
            attributes.clear();
        }
    }
    attributes
}

struct ExportLoop<'a, T, E> {
    adapter: SessionAdapter<'a, T>,
    encoder: E,
    options: Options,
    aliases: BTreeMap<String, NodeId>,
    // Both sets belong to the start node list currently being processed.
    exported_set: HashSet<ExpandedNodeId>,
    ignored_by_class: HashSet<ExpandedNodeId>,
    statistics: ExportStatistics,
}

impl<'a, T: UaServices, E: NodesetEncoder> ExportLoop<'a, T, E> {
    fn new(adapter: SessionAdapter<'a, T>, encoder: E, options: Options) -> Self {
        Self {
            adapter,
            encoder,
            options,
            aliases: BTreeMap::new(),
            exported_set: HashSet::new(),
            ignored_by_class: HashSet::new(),
            statistics: ExportStatistics::default(),
        }
    }

    async fn run(
        mut self,
        mut node_lists: BTreeMap<String, Vec<ExpandedNodeId>>,
    ) -> Result<ExportStatistics, ExportError> {
        // Fail fast on a bad start node before any network round trip.
        self.check_start_nodes_ns0(&node_lists)?;

        let mut perf_timer = PerfTimer::new(self.options.is_perf_timer_enable);
        self.encoder.begin().map_err(ExportError::Begin)?;
        perf_timer.mark("Begin operation");

        let namespaces = self.read_namespaces().await?;
        perf_timer.mark("GetNamespaces operation");
        self.encoder
            .add_namespaces(&namespaces)
            .map_err(ExportError::ExportNamespaces)?;
        perf_timer.mark("ExportNamespaces operation");

        for (start_node_key, list) in node_lists.iter_mut() {
            if list.is_empty() {
                warn!("The node list of start node '{start_node_key}' is empty, skipping");
                continue;
            }
            self.exported_set = distinct(list);
            perf_timer.mark("Distinct operation");

            let node_classes = self.read_node_classes(start_node_key, list).await?;
            perf_timer.mark("ReadNodeClasses operation");

            self.export_start_node_list(list, &node_classes).await?;
            perf_timer.mark("GetNodeDataAndExport operations");
        }

        if self.aliases.is_empty() {
            warn!("The alias table is empty.");
        } else {
            self.encoder
                .add_aliases(&self.aliases)
                .map_err(ExportError::ExportAliases)?;
            perf_timer.mark("ExportAliases operation");
        }

        self.encoder.end().map_err(ExportError::End)?;
        perf_timer.mark("End operation");

        info!("Exported statistic:\n{}", self.statistics);
        info!("Total exported nodes: {}", self.statistics.total());
        Ok(self.statistics)
    }

    fn check_start_nodes_ns0(
        &self,
        node_lists: &BTreeMap<String, Vec<ExpandedNodeId>>,
    ) -> Result<(), ExportError> {
        for (start_node_key, list) in node_lists {
            let Some(start_node) = list.first() else {
                continue;
            };
            // The objects folder is an allowed flat mode anchor.
            if self.options.flat_list_of_nodes.is_enable
                && start_node.node_id == ObjectId::ObjectsFolder
            {
                continue;
            }
            if self.options.ns0_custom_nodes_ready_to_work {
                if is_standard_ns0_root(&start_node.node_id) {
                    error!("First NodeId (Start NodeId) is a standard OPC UA node - '{start_node_key}' in ns=0");
                    return Err(ExportError::Ns0StartNode(start_node_key.clone()));
                }
            } else if start_node.node_id.namespace == 0 {
                error!("First NodeId (Start NodeId) - '{start_node_key}' has ns=0");
                return Err(ExportError::Ns0StartNode(start_node_key.clone()));
            }
        }
        Ok(())
    }

    async fn read_namespaces(&self) -> Result<Vec<String>, ExportError> {
        let namespace_array = ExpandedNodeId::new(NodeId::from(VariableId::ServerNamespaceArray));
        let value = self
            .adapter
            .read_value(&namespace_array)
            .await
            .map_err(|e| ExportError::GetNamespaces(e.to_string()))?;
        match value {
            Variant::Array(array)
                if array.dimensions.is_none()
                    && array.value_type == VariantScalarTypeId::String =>
            {
                // Index 0 is the OPC Foundation base namespace, present on
                // every server and never declared in the document.
                Ok(array
                    .values
                    .iter()
                    .skip(1)
                    .filter_map(|value| match value {
                        Variant::String(uri) => Some(uri.clone()),
                        _ => None,
                    })
                    .collect())
            }
            _ => {
                error!("Wrong array dimensions size or type kind in the namespace array read.");
                Err(ExportError::GetNamespaces(
                    "the namespace array is not a one-dimensional string array".to_owned(),
                ))
            }
        }
    }

    async fn read_node_classes(
        &mut self,
        start_node_key: &str,
        list: &[ExpandedNodeId],
    ) -> Result<Vec<NodeClassRequestResponse>, ExportError> {
        let mut node_classes = self
            .adapter
            .read_node_classes(list)
            .await
            .map_err(|e| ExportError::GetNodeClasses(e.to_string()))?;
        if node_classes.is_empty() {
            return Err(ExportError::GetNodeClasses(format!(
                "unable to get node classes for start node '{start_node_key}'"
            )));
        }

        // The fabricated flat mode start node does not exist on the
        // server; it is exported as an Object regardless of what the class
        // read returned.
        let flat = &self.options.flat_list_of_nodes;
        if flat.is_enable
            && flat.create_missing_start_node
            && !is_standard_ns0_root(&node_classes[0].node_id.node_id)
        {
            warn!(
                "NodeID '{}' is the start node in flat mode and will be created as an Object node class.",
                node_classes[0].node_id
            );
            node_classes[0].node_class = NodeClass::Object;
            node_classes[0].status = crate::types::StatusCode::GOOD;
        }

        self.ignored_by_class.clear();
        for entry in &node_classes {
            if entry.status.is_bad() {
                error!(
                    "Node '{}' returned a bad result in the node class query: {}",
                    entry.node_id, entry.status
                );
                return Err(ExportError::GetNodeClasses(format!(
                    "node '{}' returned status {}",
                    entry.node_id, entry.status
                )));
            }
            if !entry.node_class.is_exportable() {
                self.ignored_by_class.insert(entry.node_id.clone());
            }
        }
        Ok(node_classes)
    }

    async fn export_start_node_list(
        &mut self,
        list: &[ExpandedNodeId],
        node_classes: &[NodeClassRequestResponse],
    ) -> Result<(), ExportError> {
        let batch_size = match self.options.number_of_max_nodes_to_request_data {
            0 => list.len().max(1),
            n => n as usize,
        };
        let mut offset = 0;
        while offset < list.len() {
            let end = (offset + batch_size).min(list.len());
            let models = self
                .collect_batch_models(list, node_classes, offset, end)
                .await?;
            if models.is_empty() {
                warn!("The batch produced no exportable nodes.");
            } else {
                self.collect_aliases(&models)?;
                self.export_nodes(&models)?;
            }
            offset = end;
        }
        Ok(())
    }

    async fn collect_batch_models(
        &mut self,
        list: &[ExpandedNodeId],
        node_classes: &[NodeClassRequestResponse],
        batch_start: usize,
        batch_end: usize,
    ) -> Result<Vec<NodeIntermediateModel>, ExportError> {
        debug!(
            "Collecting node data, batch [{batch_start}..{batch_end}) of {} nodes",
            list.len()
        );
        let flat = self.options.flat_list_of_nodes.clone();

        let mut attribute_requests: Vec<NodeAttributesRequestResponse> = (batch_start..batch_end)
            .map(|index| {
                NodeAttributesRequestResponse::new(
                    list[index].clone(),
                    attribute_set(&list[index], node_classes[index].node_class),
                )
            })
            .collect();
        self.adapter
            .read_node_attributes(&mut attribute_requests)
            .await
            .map_err(|e| ExportError::GetNodesData(e.to_string()))?;

        let mut reference_requests: Vec<NodeReferencesRequestResponse> = (batch_start..batch_end)
            .map(|index| NodeReferencesRequestResponse::new(list[index].clone()))
            .collect();
        self.adapter
            .read_node_references(&mut reference_requests)
            .await
            .map_err(|e| ExportError::GetNodesData(e.to_string()))?;

        let mut models = Vec::with_capacity(batch_end - batch_start);
        for batch_index in 0..(batch_end - batch_start) {
            let index = batch_start + batch_index;
            let node_id = &list[index];
            let node_class = node_classes[index].node_class;

            if !self.admit(node_id, node_class) {
                continue;
            }

            // Every existing node has at least one reference. A start node
            // without any fails the export (unless flat mode fabricates
            // it); any other node is dropped and its descendants left to
            // the broken reference filter.
            if reference_requests[batch_index].references.is_empty() {
                if index == 0 {
                    if !(flat.is_enable && flat.create_missing_start_node) {
                        return Err(ExportError::GetNodesData(format!(
                            "start node {node_id} has no references"
                        )));
                    }
                } else {
                    warn!("The node with id {node_id} is IGNORED because it has no references");
                    continue;
                }
            }

            self.repair_references(
                node_id,
                node_class,
                &mut reference_requests[batch_index].references,
            )?;

            // Start node bookkeeping: fabrication in flat mode, re-hooking
            // of followers onto the start node, and the fallback parent.
            if flat.is_enable && flat.create_missing_start_node && index == 0 {
                self.fabricate_start_node(
                    node_id,
                    &mut attribute_requests[batch_index],
                    &mut reference_requests[batch_index].references,
                );
            }
            if flat.is_enable && index != 0 {
                prepend_reference(
                    &mut reference_requests[batch_index].references,
                    ReferenceTypeId::Organizes,
                    false,
                    list[0].clone(),
                );
                info!(
                    "Adding to node '{node_id}' an inverse Organizes reference to the start node '{}'.",
                    list[0]
                );
            }
            let (subtype_start_detected, inverse_reference_count) = if index == 0 {
                self.fix_start_node_parent(
                    node_class,
                    &mut reference_requests[batch_index].references,
                )
            } else {
                (false, 0)
            };

            let Some(parent_node_id) = resolve_parent(
                node_class,
                subtype_start_detected,
                inverse_reference_count,
                &mut reference_requests[batch_index].references,
            ) else {
                warn!("The node with id {node_id} is IGNORED because this node has a PARENT NODE with wrong NODE CLASS");
                continue;
            };

            debug!("Filling NodeIntermediateModel for {node_id}");
            let model = NodeIntermediateModel {
                node_id: node_id.clone(),
                parent_node_id,
                node_class,
                references: std::mem::take(&mut reference_requests[batch_index].references),
                attributes: std::mem::take(&mut attribute_requests[batch_index].attrs),
            };
            if log::log_enabled!(log::Level::Debug) {
                debug!("{model}");
            }
            models.push(model);
        }
        debug!("-- Total nodes in NodeIntermediateModels: {} --", models.len());
        Ok(models)
    }

    fn admit(&self, node_id: &ExpandedNodeId, node_class: NodeClass) -> bool {
        if self.options.ns0_custom_nodes_ready_to_work {
            // Only the nodes of the standard itself are withheld; user
            // nodes placed into ns=0 pass.
            if is_standard_ns0_root(&node_id.node_id) {
                warn!("The node with id {node_id} is IGNORED because this node is part of the standard OPC UA set.");
                return false;
            }
        } else if node_id.node_id.namespace == 0 {
            warn!("The node with id {node_id} is IGNORED because this node is from the OPC UA namespace");
            return false;
        }
        if !node_class.is_exportable() {
            warn!("NodeID '{node_id}' is IGNORED because this node has a NODE CLASS '{node_class}' from the ignore list");
            return false;
        }
        true
    }

    fn repair_references(
        &self,
        node_id: &ExpandedNodeId,
        node_class: NodeClass,
        references: &mut Vec<ReferenceDescription>,
    ) -> Result<(), ExportError> {
        let mut synthesized_target = None;
        if !references.is_empty() {
            repair::normalize_type_definition_references(node_id, references);
            repair::replace_abstract_variable_type(node_id, references);
            if !self.options.flat_list_of_nodes.is_enable
                && !repair::has_inverse_reference(references)
            {
                warn!("For node {node_id} we didn't find an inverse reference. Let's just add one.");
                synthesized_target = Some(
                    repair::synthesize_inverse_reference(node_id, references)
                        .map_err(ExportError::GetNodesData)?,
                );
            }
        }
        if self.options.flat_list_of_nodes.is_enable {
            repair::delete_hierarchical_references(node_id, references);
        } else {
            repair::delete_broken_references(
                node_id,
                references,
                &self.exported_set,
                &self.ignored_by_class,
                synthesized_target.as_ref(),
            );
            repair::delete_non_subtype_inverse_references(node_id, node_class, references);
        }
        Ok(())
    }

    // The fabricated start node gets generated attributes and a FolderType
    // type definition; whatever the server returned for a node of the same
    // id is discarded, the synthetic root absorbs all children.
    fn fabricate_start_node(
        &self,
        node_id: &ExpandedNodeId,
        attributes: &mut NodeAttributesRequestResponse,
        references: &mut Vec<ReferenceDescription>,
    ) {
        references.clear();
        prepend_reference(
            references,
            ReferenceTypeId::HasTypeDefinition,
            true,
            ExpandedNodeId::new(NodeId::from(ObjectTypeId::FolderType)),
        );

        let name = identifier_text(&node_id.node_id);
        attributes.attrs.insert(
            AttributeId::BrowseName,
            Some(AttributeValue::QualifiedName(QualifiedName::new(
                node_id.node_id.namespace,
                name.clone(),
            ))),
        );
        attributes.attrs.insert(
            AttributeId::DisplayName,
            Some(AttributeValue::LocalizedText(LocalizedText::from(name))),
        );
        attributes.attrs.insert(
            AttributeId::Description,
            Some(AttributeValue::LocalizedText(LocalizedText::from(
                "This is autogenerated start node.",
            ))),
        );
        info!("The attributes and type reference for the start node '{node_id}' in flat mode have been created.");
    }

    // When the start node has no reference to the objects folder, hook it
    // onto the configured replacement parent. Returns whether the start
    // node is a type class node without a reference to the objects folder,
    // and how many inverse references it had before the injection.
    fn fix_start_node_parent(
        &self,
        node_class: NodeClass,
        references: &mut Vec<ReferenceDescription>,
    ) -> (bool, u64) {
        let mut inverse_reference_count = 0u64;
        let mut objects_folder_found = false;
        for reference in references.iter() {
            if reference.node_id.node_id == ObjectId::ObjectsFolder {
                objects_folder_found = true;
                break;
            }
            inverse_reference_count += u64::from(!reference.is_forward);
        }
        if objects_folder_found {
            return (false, inverse_reference_count);
        }

        let flat = &self.options.flat_list_of_nodes;
        if flat.is_enable && flat.create_missing_start_node && flat.allow_abstract_variable {
            // Two extra backlinks onto i=58 and i=63 let the loader accept
            // a Variable class start node with an abstract type.
            prepend_reference(
                references,
                ReferenceTypeId::HasComponent,
                false,
                ExpandedNodeId::new(NodeId::from(ObjectTypeId::BaseObjectType)),
            );
            prepend_reference(
                references,
                ReferenceTypeId::HasComponent,
                false,
                ExpandedNodeId::new(NodeId::from(VariableTypeId::BaseDataVariableType)),
            );
        }
        info!(
            "Adding to the start node an inverse Organizes reference to '{}'.",
            self.options.parent_start_node_replacer
        );
        prepend_reference(
            references,
            ReferenceTypeId::Organizes,
            false,
            self.options.parent_start_node_replacer.clone(),
        );

        (node_class.is_type_class(), inverse_reference_count)
    }

    fn collect_aliases(&mut self, models: &[NodeIntermediateModel]) -> Result<(), ExportError> {
        for model in models {
            if matches!(
                model.node_class,
                NodeClass::Variable | NodeClass::VariableType
            ) {
                match model.attributes.get(&AttributeId::DataType) {
                    Some(Some(AttributeValue::NodeId(_))) => {
                        if let Some((alias, data_type)) = model.data_type_alias() {
                            // An alias must be in only one instance.
                            self.aliases.entry(alias).or_insert(data_type);
                        }
                    }
                    Some(Some(other)) => {
                        error!("DataType has wrong type in NodeID: {}", model.node_id);
                        return Err(ExportError::GetAliases(format!(
                            "node {} has a DataType attribute of the wrong type: {other}",
                            model.node_id
                        )));
                    }
                    Some(None) => {
                        warn!("DataType has an empty value in NodeID: {}", model.node_id);
                    }
                    None => {
                        warn!("DataType attribute is missing from NodeID: {}", model.node_id);
                    }
                }
            }

            // reference_type_aliases only yields well-known ns=0 types.
            for (reference, alias) in model.reference_type_aliases() {
                self.aliases
                    .entry(alias)
                    .or_insert_with(|| reference.reference_type_id.clone());
            }
        }
        Ok(())
    }

    fn export_nodes(&mut self, models: &[NodeIntermediateModel]) -> Result<(), ExportError> {
        debug!("Export nodes...");
        for model in models {
            if log::log_enabled!(log::Level::Debug) {
                debug!("Node: {}, node class: {}", model.node_id, model.node_class);
            }
            match model.node_class {
                NodeClass::Object => {
                    self.encoder
                        .add_node_object(model)
                        .map_err(ExportError::ExportNodes)?;
                    self.statistics.object_nodes += 1;
                }
                NodeClass::Variable => {
                    self.encoder
                        .add_node_variable(model)
                        .map_err(ExportError::ExportNodes)?;
                    self.statistics.variable_nodes += 1;
                }
                NodeClass::ObjectType => {
                    self.encoder
                        .add_node_object_type(model)
                        .map_err(ExportError::ExportNodes)?;
                    self.statistics.object_type_nodes += 1;
                }
                NodeClass::VariableType => {
                    self.encoder
                        .add_node_variable_type(model)
                        .map_err(ExportError::ExportNodes)?;
                    self.statistics.variable_type_nodes += 1;
                }
                NodeClass::ReferenceType => {
                    self.encoder
                        .add_node_reference_type(model)
                        .map_err(ExportError::ExportNodes)?;
                    self.statistics.reference_type_nodes += 1;
                }
                NodeClass::DataType => {
                    self.encoder
                        .add_node_data_type(model)
                        .map_err(ExportError::ExportNodes)?;
                    self.statistics.data_type_nodes += 1;
                }
                other => warn!("Node class {other} cannot be exported"),
            }
        }
        Ok(())
    }
}

fn prepend_reference(
    references: &mut Vec<ReferenceDescription>,
    reference_type: ReferenceTypeId,
    is_forward: bool,
    target: ExpandedNodeId,
) {
    references.insert(
        0,
        ReferenceDescription {
            reference_type_id: reference_type.into(),
            is_forward,
            node_id: target,
            ..Default::default()
        },
    );
}

// Order-preserving dedup. Returns the set of kept ids, used by the broken
// reference filter.
fn distinct(list: &mut Vec<ExpandedNodeId>) -> HashSet<ExpandedNodeId> {
    let mut seen = HashSet::with_capacity(list.len());
    list.retain(|node_id| {
        if seen.insert(node_id.clone()) {
            true
        } else {
            info!("The found NodeID duplicate {node_id} has been removed.");
            false
        }
    });
    seen
}

// First inverse reference wins; type class nodes only accept their
// HasSubtype supertype edge. A type class start node that lost its
// supertype edge is re-anchored at the base type of its hierarchy.
fn resolve_parent(
    node_class: NodeClass,
    subtype_start_detected: bool,
    inverse_reference_count: u64,
    references: &mut Vec<ReferenceDescription>,
) -> Option<ExpandedNodeId> {
    let is_type_class = node_class.is_type_class();
    let mut parent = references
        .iter()
        .find(|reference| {
            !reference.is_forward
                && (!is_type_class
                    || reference.reference_type_id == ReferenceTypeId::HasSubtype)
        })
        .map(|reference| reference.node_id.clone());

    if subtype_start_detected && inverse_reference_count == 0 {
        let supertype: NodeId = match node_class {
            NodeClass::ObjectType => ObjectTypeId::BaseObjectType.into(),
            NodeClass::VariableType => VariableTypeId::BaseVariableType.into(),
            NodeClass::ReferenceType => ReferenceTypeId::References.into(),
            NodeClass::DataType => DataTypeId::BaseDataType.into(),
            _ => return parent,
        };
        warn!(
            "The start node is a type class node without any HasSubtype inverse reference. \
             Adding a new HasSubtype parent reference to {supertype}."
        );
        references.push(ReferenceDescription {
            reference_type_id: ReferenceTypeId::HasSubtype.into(),
            is_forward: false,
            node_id: ExpandedNodeId::new(supertype.clone()),
            ..Default::default()
        });
        parent = Some(ExpandedNodeId::new(supertype));
    }
    parent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_preserves_first_occurrence_order() {
        let a = ExpandedNodeId::new(NodeId::new(2, 1u32));
        let b = ExpandedNodeId::new(NodeId::new(2, 2u32));
        let mut list = vec![a.clone(), b.clone(), a.clone(), b.clone(), a.clone()];
        let set = distinct(&mut list);
        assert_eq!(list, vec![a, b]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn standard_roots() {
        assert!(is_standard_ns0_root(&NodeId::new(0, 84u32)));
        assert!(is_standard_ns0_root(&NodeId::new(0, 87u32)));
        assert!(!is_standard_ns0_root(&NodeId::new(0, 88u32)));
        assert!(!is_standard_ns0_root(&NodeId::new(2, 85u32)));
    }

    #[test]
    fn parent_is_first_inverse_reference() {
        let mut references = vec![
            ReferenceDescription {
                reference_type_id: ReferenceTypeId::HasTypeDefinition.into(),
                is_forward: true,
                node_id: ExpandedNodeId::new(NodeId::new(0, 63u32)),
                ..Default::default()
            },
            ReferenceDescription {
                reference_type_id: ReferenceTypeId::HasComponent.into(),
                is_forward: false,
                node_id: ExpandedNodeId::new(NodeId::new(2, 7u32)),
                ..Default::default()
            },
            ReferenceDescription {
                reference_type_id: ReferenceTypeId::Organizes.into(),
                is_forward: false,
                node_id: ExpandedNodeId::new(NodeId::new(2, 8u32)),
                ..Default::default()
            },
        ];
        let parent = resolve_parent(NodeClass::Variable, false, 1, &mut references);
        assert_eq!(parent, Some(ExpandedNodeId::new(NodeId::new(2, 7u32))));
    }

    #[test]
    fn type_class_parent_requires_subtype_edge() {
        let mut references = vec![ReferenceDescription {
            reference_type_id: ReferenceTypeId::Organizes.into(),
            is_forward: false,
            node_id: ExpandedNodeId::new(NodeId::new(2, 7u32)),
            ..Default::default()
        }];
        assert_eq!(
            resolve_parent(NodeClass::DataType, false, 1, &mut references),
            None
        );
    }

    #[test]
    fn type_class_start_node_gets_base_supertype() {
        let mut references = Vec::new();
        let parent = resolve_parent(NodeClass::ReferenceType, true, 0, &mut references);
        assert_eq!(parent, Some(ExpandedNodeId::new(NodeId::new(0, 31u32))));
        assert_eq!(references.len(), 1);
        assert!(!references[0].is_forward);
        assert_eq!(
            references[0].reference_type_id,
            NodeId::from(ReferenceTypeId::HasSubtype)
        );
    }
}
