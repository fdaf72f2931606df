// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Core OPC UA data types used by the exporter.
//!
//! These are trimmed to the shapes the export pipeline consumes: node
//! identity, attribute values, browse service records and the variant
//! lattice for `Value` payloads.

mod attribute;
mod browse;
mod byte_string;
mod data_types;
mod data_value;
mod expanded_node_id;
mod guid;
mod ids;
mod localized_text;
mod node_class;
mod node_id;
mod qualified_name;
mod reference_description;
mod status_code;
mod variant;

pub use attribute::AttributeId;
pub use browse::{
    BrowseDescription, BrowseDirection, BrowseResult, BROWSE_RESULT_MASK_ALL,
};
pub use byte_string::ByteString;
pub use data_types::{
    EnumDefinition, EnumField, StructureDefinition, StructureField, StructureType,
};
pub use data_value::{DataValue, ReadValueId};
pub use expanded_node_id::ExpandedNodeId;
pub use guid::Guid;
pub use ids::{
    DataTypeId, ObjectId, ObjectTypeId, ReferenceTypeId, VariableId, VariableTypeId,
};
pub use localized_text::LocalizedText;
pub use node_class::NodeClass;
pub use node_id::{Identifier, NodeId};
pub use qualified_name::QualifiedName;
pub use reference_description::ReferenceDescription;
pub use status_code::StatusCode;
pub use variant::{
    Array, ArrayError, DiagnosticInfo, ExtensionObject, Variant, VariantScalarTypeId,
};
