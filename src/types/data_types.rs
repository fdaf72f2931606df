// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Data type definition payloads of the `DataTypeDefinition` attribute.

use crate::types::{localized_text::LocalizedText, node_id::NodeId};

/// How the fields of a structured data type are laid out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum StructureType {
    /// Plain structure, all fields mandatory.
    #[default]
    Structure = 0,
    /// Structure with optional fields.
    StructureWithOptionalFields = 1,
    /// Union, exactly one field present.
    Union = 2,
}

/// One field of a structured data type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureField {
    /// Field name.
    pub name: String,
    /// Field description.
    pub description: LocalizedText,
    /// Data type of the field.
    pub data_type: NodeId,
    /// Value rank, -1 for scalar.
    pub value_rank: i32,
    /// Whether the field may be absent.
    pub is_optional: bool,
}

/// Definition of a structured data type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureDefinition {
    /// Node id of the default encoding.
    pub default_encoding_id: NodeId,
    /// The structure's supertype.
    pub base_data_type: NodeId,
    /// Field layout.
    pub structure_type: StructureType,
    /// The fields.
    pub fields: Vec<StructureField>,
}

/// One value of an enumerated data type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumField {
    /// The numeric value.
    pub value: i64,
    /// Display name of the value.
    pub display_name: LocalizedText,
    /// Description of the value.
    pub description: LocalizedText,
    /// Symbolic name of the value.
    pub name: String,
}

/// Definition of an enumerated data type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumDefinition {
    /// The enumeration values.
    pub fields: Vec<EnumField>,
}
