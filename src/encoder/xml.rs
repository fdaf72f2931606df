// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The NodeSet2 XML encoder.
//!
//! Node elements are buffered in memory while the export is running and
//! the document is assembled at `end`, since the alias table is only
//! complete after every node has been processed but the `<Aliases>`
//! section precedes the node elements in the document.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
};

use log::debug;
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{
    encoder::{value_xml, EncoderError, ExportTarget, NodesetEncoder},
    model::NodeIntermediateModel,
    types::{
        AttributeId, LocalizedText, NodeId, ReferenceDescription, Variant,
    },
    values::AttributeValue,
};

const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const NS_UAX: &str = "http://opcfoundation.org/UA/2008/02/Types.xsd";
const NS_XSD: &str = "http://www.w3.org/2001/XMLSchema";
const NS_UANODESET: &str = "http://opcfoundation.org/UA/2011/03/UANodeSet.xsd";

/// NodeSet2 XML implementation of [`NodesetEncoder`].
pub struct XmlEncoder {
    target: Option<ExportTarget>,
    began: bool,
    namespaces: Option<Vec<String>>,
    aliases: Option<BTreeMap<String, NodeId>>,
    nodes: Writer<Vec<u8>>,
    node_count: usize,
}

impl std::fmt::Debug for XmlEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlEncoder")
            .field("target", &self.target)
            .field("began", &self.began)
            .field("node_count", &self.node_count)
            .finish()
    }
}

fn reference_type_text(reference: &ReferenceDescription) -> String {
    // Known ns=0 reference types render through their alias.
    match reference.reference_type_id.as_reference_type_id() {
        Ok(id) => id.name(),
        Err(_) => reference.reference_type_id.to_string(),
    }
}

fn data_type_text(data_type: &NodeId) -> String {
    match data_type.as_data_type_id() {
        Ok(id) => id.name(),
        Err(_) => data_type.to_string(),
    }
}

impl XmlEncoder {
    /// Creates an encoder writing to `target`.
    pub fn new(target: ExportTarget) -> XmlEncoder {
        XmlEncoder {
            target: Some(target),
            began: false,
            namespaces: None,
            aliases: None,
            nodes: Writer::new(Vec::new()),
            node_count: 0,
        }
    }

    fn check_open(&self) -> Result<(), EncoderError> {
        if !self.began {
            return Err(EncoderError::State(
                "the encoder has not been started".to_owned(),
            ));
        }
        if self.target.is_none() {
            return Err(EncoderError::State(
                "the encoder has already been finished".to_owned(),
            ));
        }
        Ok(())
    }

    fn attr_bool(node: &NodeIntermediateModel, id: AttributeId) -> Option<bool> {
        match node.attribute(id) {
            Some(AttributeValue::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    fn attr_byte(node: &NodeIntermediateModel, id: AttributeId) -> Option<u8> {
        match node.attribute(id) {
            Some(AttributeValue::Byte(v)) => Some(*v),
            _ => None,
        }
    }

    fn attr_u32(node: &NodeIntermediateModel, id: AttributeId) -> Option<u32> {
        match node.attribute(id) {
            Some(AttributeValue::UInt32(v)) => Some(*v),
            _ => None,
        }
    }

    fn attr_i32(node: &NodeIntermediateModel, id: AttributeId) -> Option<i32> {
        match node.attribute(id) {
            Some(AttributeValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    fn attr_f64(node: &NodeIntermediateModel, id: AttributeId) -> Option<f64> {
        match node.attribute(id) {
            Some(AttributeValue::Double(v)) => Some(*v),
            _ => None,
        }
    }

    fn attr_value(node: &NodeIntermediateModel) -> Option<&Variant> {
        match node.attribute(AttributeId::Value) {
            Some(AttributeValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    // Attributes shared by every node class: NodeId, BrowseName, the write
    // masks and ParentNodeId.
    fn common_attributes(node: &NodeIntermediateModel) -> Vec<(&'static str, String)> {
        let mut attributes = vec![("NodeId", node.node_id.node_id.to_string())];
        if let Some(browse_name) = node.browse_name() {
            attributes.push(("BrowseName", browse_name.to_string()));
        }
        if let Some(write_mask) = Self::attr_u32(node, AttributeId::WriteMask) {
            if write_mask != 0 {
                attributes.push(("WriteMask", write_mask.to_string()));
            }
        }
        if let Some(user_write_mask) = Self::attr_u32(node, AttributeId::UserWriteMask) {
            if user_write_mask != 0 {
                attributes.push(("UserWriteMask", user_write_mask.to_string()));
            }
        }
        attributes.push(("ParentNodeId", node.parent_node_id.node_id.to_string()));
        attributes
    }

    fn variable_attributes(node: &NodeIntermediateModel) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::new();
        if let Some(AttributeValue::NodeId(data_type)) = node.attribute(AttributeId::DataType) {
            attributes.push(("DataType", data_type_text(data_type)));
        }
        if let Some(value_rank) = Self::attr_i32(node, AttributeId::ValueRank) {
            if value_rank != -1 {
                attributes.push(("ValueRank", value_rank.to_string()));
            }
        }
        if let Some(AttributeValue::ArrayDimensions(dims)) =
            node.attribute(AttributeId::ArrayDimensions)
        {
            if !dims.is_empty() {
                let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                attributes.push(("ArrayDimensions", dims.join(",")));
            }
        }
        attributes
    }

    fn is_abstract_attribute(node: &NodeIntermediateModel) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::new();
        if Self::attr_bool(node, AttributeId::IsAbstract).unwrap_or(false) {
            attributes.push(("IsAbstract", "true".to_owned()));
        }
        attributes
    }

    fn write_localized_text_child(
        &mut self,
        tag: &str,
        text: &LocalizedText,
    ) -> Result<(), EncoderError> {
        let mut start = BytesStart::new(tag);
        if !text.locale.is_empty() {
            start.push_attribute(("Locale", text.locale.as_str()));
        }
        self.nodes.write_event(Event::Start(start))?;
        self.nodes
            .write_event(Event::Text(BytesText::new(&text.text)))?;
        self.nodes.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn write_references(
        &mut self,
        references: &[ReferenceDescription],
    ) -> Result<(), EncoderError> {
        self.nodes
            .write_event(Event::Start(BytesStart::new("References")))?;
        for reference in references {
            let mut start = BytesStart::new("Reference");
            let reference_type = reference_type_text(reference);
            start.push_attribute(("ReferenceType", reference_type.as_str()));
            // IsForward="true" is the schema default and omitted.
            if !reference.is_forward {
                start.push_attribute(("IsForward", "false"));
            }
            self.nodes.write_event(Event::Start(start))?;
            self.nodes.write_event(Event::Text(BytesText::new(
                &reference.node_id.node_id.to_string(),
            )))?;
            self.nodes
                .write_event(Event::End(BytesEnd::new("Reference")))?;
        }
        self.nodes
            .write_event(Event::End(BytesEnd::new("References")))?;
        Ok(())
    }

    // DisplayName, Description and References, in schema order.
    fn write_common_children(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError> {
        if let Some(display_name) = node.display_name() {
            self.write_localized_text_child("DisplayName", display_name)?;
        }
        if let Some(description) = node.description() {
            if !description.is_null() {
                self.write_localized_text_child("Description", description)?;
            }
        }
        self.write_references(&node.references)
    }

    fn write_value_child(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError> {
        if let Some(value) = Self::attr_value(node) {
            if !value.is_empty() {
                self.nodes
                    .write_event(Event::Start(BytesStart::new("Value")))?;
                value_xml::write_value(&mut self.nodes, value)?;
                self.nodes.write_event(Event::End(BytesEnd::new("Value")))?;
            }
        }
        Ok(())
    }

    fn write_node_element(
        &mut self,
        tag: &str,
        node: &NodeIntermediateModel,
        extra_attributes: Vec<(&'static str, String)>,
    ) -> Result<(), EncoderError> {
        self.check_open()?;
        let mut start = BytesStart::new(tag);
        for (key, value) in Self::common_attributes(node) {
            start.push_attribute((key, value.as_str()));
        }
        for (key, value) in &extra_attributes {
            start.push_attribute((*key, value.as_str()));
        }
        self.nodes.write_event(Event::Start(start))?;
        self.write_common_children(node)?;
        self.node_count += 1;
        Ok(())
    }

    fn finish_node_element(&mut self, tag: &str) -> Result<(), EncoderError> {
        self.nodes.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn write_document<W: Write>(&mut self, sink: W) -> Result<(), EncoderError> {
        let mut writer = Writer::new(sink);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("UANodeSet");
        root.push_attribute(("xmlns:xsi", NS_XSI));
        root.push_attribute(("xmlns:uax", NS_UAX));
        root.push_attribute(("xmlns:xsd", NS_XSD));
        root.push_attribute(("xmlns", NS_UANODESET));
        writer.write_event(Event::Start(root))?;

        if let Some(ref namespaces) = self.namespaces {
            if !namespaces.is_empty() {
                writer.write_event(Event::Start(BytesStart::new("NamespaceUris")))?;
                for namespace in namespaces {
                    writer.write_event(Event::Start(BytesStart::new("Uri")))?;
                    writer.write_event(Event::Text(BytesText::new(namespace)))?;
                    writer.write_event(Event::End(BytesEnd::new("Uri")))?;
                }
                writer.write_event(Event::End(BytesEnd::new("NamespaceUris")))?;
            }
        }

        if let Some(ref aliases) = self.aliases {
            if !aliases.is_empty() {
                writer.write_event(Event::Start(BytesStart::new("Aliases")))?;
                for (alias, node_id) in aliases {
                    let mut start = BytesStart::new("Alias");
                    start.push_attribute(("Alias", alias.as_str()));
                    writer.write_event(Event::Start(start))?;
                    writer.write_event(Event::Text(BytesText::new(&node_id.to_string())))?;
                    writer.write_event(Event::End(BytesEnd::new("Alias")))?;
                }
                writer.write_event(Event::End(BytesEnd::new("Aliases")))?;
            }
        }

        let nodes = std::mem::replace(&mut self.nodes, Writer::new(Vec::new())).into_inner();
        writer.get_mut().write_all(&nodes)?;

        writer.write_event(Event::End(BytesEnd::new("UANodeSet")))?;
        writer.get_mut().flush()?;
        Ok(())
    }
}

impl NodesetEncoder for XmlEncoder {
    fn begin(&mut self) -> Result<(), EncoderError> {
        if self.began {
            return Err(EncoderError::State(
                "the encoder has already been started".to_owned(),
            ));
        }
        if self.target.is_none() {
            return Err(EncoderError::State(
                "the encoder has already been finished".to_owned(),
            ));
        }
        self.began = true;
        Ok(())
    }

    fn add_namespaces(&mut self, namespaces: &[String]) -> Result<(), EncoderError> {
        self.check_open()?;
        if self.namespaces.is_some() {
            return Err(EncoderError::State(
                "the namespace section has already been added".to_owned(),
            ));
        }
        self.namespaces = Some(namespaces.to_vec());
        Ok(())
    }

    fn add_aliases(&mut self, aliases: &BTreeMap<String, NodeId>) -> Result<(), EncoderError> {
        self.check_open()?;
        if self.aliases.is_some() {
            return Err(EncoderError::State(
                "the alias section has already been added".to_owned(),
            ));
        }
        self.aliases = Some(aliases.clone());
        Ok(())
    }

    fn add_node_object(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError> {
        let mut extra = Vec::new();
        if let Some(event_notifier) = Self::attr_byte(node, AttributeId::EventNotifier) {
            if event_notifier != 0 {
                extra.push(("EventNotifier", event_notifier.to_string()));
            }
        }
        self.write_node_element("UAObject", node, extra)?;
        self.finish_node_element("UAObject")
    }

    fn add_node_variable(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError> {
        let mut extra = Self::variable_attributes(node);
        if let Some(access_level) = Self::attr_byte(node, AttributeId::AccessLevel) {
            if access_level != 1 {
                extra.push(("AccessLevel", access_level.to_string()));
            }
        }
        if let Some(user_access_level) = Self::attr_byte(node, AttributeId::UserAccessLevel) {
            if user_access_level != 1 {
                extra.push(("UserAccessLevel", user_access_level.to_string()));
            }
        }
        if let Some(interval) = Self::attr_f64(node, AttributeId::MinimumSamplingInterval) {
            if interval != 0.0 {
                extra.push(("MinimumSamplingInterval", interval.to_string()));
            }
        }
        if Self::attr_bool(node, AttributeId::Historizing).unwrap_or(false) {
            extra.push(("Historizing", "true".to_owned()));
        }
        self.write_node_element("UAVariable", node, extra)?;
        self.write_value_child(node)?;
        self.finish_node_element("UAVariable")
    }

    fn add_node_object_type(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError> {
        self.write_node_element("UAObjectType", node, Self::is_abstract_attribute(node))?;
        self.finish_node_element("UAObjectType")
    }

    fn add_node_variable_type(
        &mut self,
        node: &NodeIntermediateModel,
    ) -> Result<(), EncoderError> {
        let mut extra = Self::variable_attributes(node);
        extra.extend(Self::is_abstract_attribute(node));
        self.write_node_element("UAVariableType", node, extra)?;
        self.write_value_child(node)?;
        self.finish_node_element("UAVariableType")
    }

    fn add_node_reference_type(
        &mut self,
        node: &NodeIntermediateModel,
    ) -> Result<(), EncoderError> {
        let mut extra = Self::is_abstract_attribute(node);
        if Self::attr_bool(node, AttributeId::Symmetric).unwrap_or(false) {
            extra.push(("Symmetric", "true".to_owned()));
        }
        self.write_node_element("UAReferenceType", node, extra)?;
        if let Some(AttributeValue::LocalizedText(inverse_name)) =
            node.attribute(AttributeId::InverseName)
        {
            if !inverse_name.is_null() {
                self.write_localized_text_child("InverseName", inverse_name)?;
            }
        }
        self.finish_node_element("UAReferenceType")
    }

    fn add_node_data_type(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError> {
        self.write_node_element("UADataType", node, Self::is_abstract_attribute(node))?;
        self.finish_node_element("UADataType")
    }

    fn end(&mut self) -> Result<(), EncoderError> {
        if !self.began {
            return Err(EncoderError::State(
                "the encoder has not been started".to_owned(),
            ));
        }
        let Some(target) = self.target.take() else {
            return Err(EncoderError::State(
                "the encoder has already been finished".to_owned(),
            ));
        };
        debug!("Writing the export document, {} nodes", self.node_count);
        match target {
            ExportTarget::File(path) => {
                let file = File::create(path)?;
                self.write_document(BufWriter::new(file))
            }
            ExportTarget::Stream(stream) => self.write_document(stream),
        }
    }
}
