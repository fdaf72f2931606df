// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `Variant`, the dynamically typed value
//! container for `Value` attribute payloads.

use chrono::{DateTime, Utc};

use crate::types::{
    byte_string::ByteString,
    data_types::{EnumDefinition, StructureDefinition},
    expanded_node_id::ExpandedNodeId,
    guid::Guid,
    localized_text::LocalizedText,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
};

/// The scalar type held by a variant, or by every element of a variant
/// array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VariantScalarTypeId {
    /// Boolean.
    Boolean,
    /// Signed byte.
    SByte,
    /// Unsigned byte.
    Byte,
    /// Signed 16-bit int.
    Int16,
    /// Unsigned 16-bit int.
    UInt16,
    /// Signed 32-bit int.
    Int32,
    /// Unsigned 32-bit int.
    UInt32,
    /// Signed 64-bit int.
    Int64,
    /// Unsigned 64-bit int.
    UInt64,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// String.
    String,
    /// Date/time.
    DateTime,
    /// GUID.
    Guid,
    /// Status code.
    StatusCode,
    /// Byte string.
    ByteString,
    /// Node ID.
    NodeId,
    /// Expanded node ID.
    ExpandedNodeId,
    /// Qualified name.
    QualifiedName,
    /// Localized text.
    LocalizedText,
    /// Diagnostic info.
    DiagnosticInfo,
    /// Extension object.
    ExtensionObject,
}

impl VariantScalarTypeId {
    /// The element name used for this type in the OPC UA Types schema.
    pub fn xml_name(&self) -> &'static str {
        match self {
            VariantScalarTypeId::Boolean => "Boolean",
            VariantScalarTypeId::SByte => "SByte",
            VariantScalarTypeId::Byte => "Byte",
            VariantScalarTypeId::Int16 => "Int16",
            VariantScalarTypeId::UInt16 => "UInt16",
            VariantScalarTypeId::Int32 => "Int32",
            VariantScalarTypeId::UInt32 => "UInt32",
            VariantScalarTypeId::Int64 => "Int64",
            VariantScalarTypeId::UInt64 => "UInt64",
            VariantScalarTypeId::Float => "Float",
            VariantScalarTypeId::Double => "Double",
            VariantScalarTypeId::String => "String",
            VariantScalarTypeId::DateTime => "DateTime",
            VariantScalarTypeId::Guid => "Guid",
            VariantScalarTypeId::StatusCode => "StatusCode",
            VariantScalarTypeId::ByteString => "ByteString",
            VariantScalarTypeId::NodeId => "NodeId",
            VariantScalarTypeId::ExpandedNodeId => "ExpandedNodeId",
            VariantScalarTypeId::QualifiedName => "QualifiedName",
            VariantScalarTypeId::LocalizedText => "LocalizedText",
            VariantScalarTypeId::DiagnosticInfo => "DiagnosticInfo",
            VariantScalarTypeId::ExtensionObject => "ExtensionObject",
        }
    }
}

/// A `Variant` holds built-in OPC UA data types, including single and
/// multi dimensional arrays.
///
/// As variants may be passed around a lot on the stack, Boxes are used for
/// more complex types to keep the size of this type down a bit, especially
/// when used in arrays.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum Variant {
    /// Empty type has no value. It is equivalent to a Null value (part 6 5.1.6)
    #[default]
    Empty,
    /// Boolean
    Boolean(bool),
    /// Signed byte
    SByte(i8),
    /// Unsigned byte
    Byte(u8),
    /// Signed 16-bit int
    Int16(i16),
    /// Unsigned 16-bit int
    UInt16(u16),
    /// Signed 32-bit int
    Int32(i32),
    /// Unsigned 32-bit int
    UInt32(u32),
    /// Signed 64-bit int
    Int64(i64),
    /// Unsigned 64-bit int
    UInt64(u64),
    /// Float
    Float(f32),
    /// Double
    Double(f64),
    /// String
    String(String),
    /// DateTime
    DateTime(Box<DateTime<Utc>>),
    /// Guid
    Guid(Box<Guid>),
    /// StatusCode
    StatusCode(StatusCode),
    /// ByteString
    ByteString(ByteString),
    /// NodeId
    NodeId(Box<NodeId>),
    /// ExpandedNodeId
    ExpandedNodeId(Box<ExpandedNodeId>),
    /// QualifiedName
    QualifiedName(Box<QualifiedName>),
    /// LocalizedText
    LocalizedText(Box<LocalizedText>),
    /// DiagnosticInfo
    DiagnosticInfo(Box<DiagnosticInfo>),
    /// ExtensionObject
    ExtensionObject(ExtensionObject),
    /// Single dimension array which can contain any scalar type, all the
    /// same type. To represent matrices, set the `dimensions` field on the
    /// `Array`.
    Array(Box<Array>),
}

impl Variant {
    /// The scalar type of this variant, `None` for `Empty` and `Array`.
    pub fn scalar_type_id(&self) -> Option<VariantScalarTypeId> {
        Some(match self {
            Variant::Empty | Variant::Array(_) => return None,
            Variant::Boolean(_) => VariantScalarTypeId::Boolean,
            Variant::SByte(_) => VariantScalarTypeId::SByte,
            Variant::Byte(_) => VariantScalarTypeId::Byte,
            Variant::Int16(_) => VariantScalarTypeId::Int16,
            Variant::UInt16(_) => VariantScalarTypeId::UInt16,
            Variant::Int32(_) => VariantScalarTypeId::Int32,
            Variant::UInt32(_) => VariantScalarTypeId::UInt32,
            Variant::Int64(_) => VariantScalarTypeId::Int64,
            Variant::UInt64(_) => VariantScalarTypeId::UInt64,
            Variant::Float(_) => VariantScalarTypeId::Float,
            Variant::Double(_) => VariantScalarTypeId::Double,
            Variant::String(_) => VariantScalarTypeId::String,
            Variant::DateTime(_) => VariantScalarTypeId::DateTime,
            Variant::Guid(_) => VariantScalarTypeId::Guid,
            Variant::StatusCode(_) => VariantScalarTypeId::StatusCode,
            Variant::ByteString(_) => VariantScalarTypeId::ByteString,
            Variant::NodeId(_) => VariantScalarTypeId::NodeId,
            Variant::ExpandedNodeId(_) => VariantScalarTypeId::ExpandedNodeId,
            Variant::QualifiedName(_) => VariantScalarTypeId::QualifiedName,
            Variant::LocalizedText(_) => VariantScalarTypeId::LocalizedText,
            Variant::DiagnosticInfo(_) => VariantScalarTypeId::DiagnosticInfo,
            Variant::ExtensionObject(_) => VariantScalarTypeId::ExtensionObject,
        })
    }

    /// Tests for the `Empty` variant.
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Boolean(v)
    }
}

impl From<u8> for Variant {
    fn from(v: u8) -> Self {
        Variant::Byte(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int32(v)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Variant::UInt32(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int64(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Double(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_owned())
    }
}

impl From<NodeId> for Variant {
    fn from(v: NodeId) -> Self {
        Variant::NodeId(Box::new(v))
    }
}

impl From<QualifiedName> for Variant {
    fn from(v: QualifiedName) -> Self {
        Variant::QualifiedName(Box::new(v))
    }
}

impl From<LocalizedText> for Variant {
    fn from(v: LocalizedText) -> Self {
        Variant::LocalizedText(Box::new(v))
    }
}

impl From<Array> for Variant {
    fn from(v: Array) -> Self {
        Variant::Array(Box::new(v))
    }
}

/// Error raised when an array shape is inconsistent with the OPC UA array
/// model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ArrayError(String);

/// An array value. One-dimensional arrays carry no dimensions vector; a
/// matrix carries one dimension length per rank.
#[derive(PartialEq, Debug, Clone)]
pub struct Array {
    /// The scalar type of every element.
    pub value_type: VariantScalarTypeId,
    /// Elements of the array, flattened in row-major order for matrices.
    pub values: Vec<Variant>,
    /// Dimension lengths, `None` for a one-dimensional array.
    pub dimensions: Option<Vec<u32>>,
}

impl Array {
    /// Constructs a one-dimensional array. The element list must be
    /// non-empty and homogeneous.
    pub fn new_single(
        value_type: VariantScalarTypeId,
        values: impl Into<Vec<Variant>>,
    ) -> Result<Array, ArrayError> {
        let values = values.into();
        Self::validate_elements(value_type, &values)?;
        Ok(Array {
            value_type,
            values,
            dimensions: None,
        })
    }

    /// Constructs a multi dimensional array. A dimensions vector of
    /// length 1 is rejected; a one-dimensional array must be constructed
    /// with [`Array::new_single`].
    pub fn new_multi(
        value_type: VariantScalarTypeId,
        values: impl Into<Vec<Variant>>,
        dimensions: Vec<u32>,
    ) -> Result<Array, ArrayError> {
        let values = values.into();
        Self::validate_elements(value_type, &values)?;
        if dimensions.len() < 2 {
            return Err(ArrayError(format!(
                "a multi dimensional array requires at least two dimensions, got {}",
                dimensions.len()
            )));
        }
        let expected: usize = dimensions.iter().map(|d| *d as usize).product();
        if expected != values.len() {
            return Err(ArrayError(format!(
                "array dimensions {:?} do not match element count {}",
                dimensions,
                values.len()
            )));
        }
        Ok(Array {
            value_type,
            values,
            dimensions: Some(dimensions),
        })
    }

    fn validate_elements(
        value_type: VariantScalarTypeId,
        values: &[Variant],
    ) -> Result<(), ArrayError> {
        if values.is_empty() {
            return Err(ArrayError("array must have at least one element".to_owned()));
        }
        if let Some(bad) = values
            .iter()
            .find(|v| v.scalar_type_id() != Some(value_type))
        {
            return Err(ArrayError(format!(
                "array of {value_type:?} contains an element of a different type: {bad:?}"
            )));
        }
        Ok(())
    }

    /// Tests if the array has more than one dimension.
    pub fn is_multi_dimensional(&self) -> bool {
        self.dimensions.as_ref().map_or(false, |d| d.len() > 1)
    }

    /// Checks the invariants the exporter relies on: non-empty element
    /// list, and either no dimensions vector or one of length ≥ 2.
    pub fn validate(&self) -> Result<(), ArrayError> {
        Self::validate_elements(self.value_type, &self.values)?;
        if let Some(ref dimensions) = self.dimensions {
            if dimensions.len() < 2 {
                return Err(ArrayError(
                    "a one-dimensional array must not carry an array dimensions vector".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// Structured diagnostic information, possibly nested.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct DiagnosticInfo {
    /// Index of a symbolic id in the string table.
    pub symbolic_id: Option<i32>,
    /// Index of a namespace uri in the string table.
    pub namespace_uri: Option<i32>,
    /// Index of a locale in the string table.
    pub locale: Option<i32>,
    /// Index of a localized text in the string table.
    pub localized_text: Option<i32>,
    /// Vendor-specific detail.
    pub additional_info: Option<String>,
    /// Status code of an inner operation.
    pub inner_status_code: Option<StatusCode>,
    /// Diagnostic info of an inner operation.
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

/// A structured value carried inside a variant. The only payloads the
/// exporter understands are data type definitions.
#[derive(PartialEq, Debug, Clone)]
pub enum ExtensionObject {
    /// Definition of a structured data type.
    StructureDefinition(Box<StructureDefinition>),
    /// Definition of an enumerated data type.
    EnumDefinition(Box<EnumDefinition>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_dimension_array() {
        let array = Array::new_single(
            VariantScalarTypeId::Int32,
            vec![Variant::Int32(1), Variant::Int32(2)],
        )
        .unwrap();
        assert!(!array.is_multi_dimensional());
        assert!(array.validate().is_ok());
    }

    #[test]
    fn empty_array_is_rejected() {
        assert!(Array::new_single(VariantScalarTypeId::Int32, vec![]).is_err());
    }

    #[test]
    fn heterogeneous_array_is_rejected() {
        assert!(Array::new_single(
            VariantScalarTypeId::Int32,
            vec![Variant::Int32(1), Variant::Double(2.0)],
        )
        .is_err());
    }

    #[test]
    fn one_dimension_vector_is_rejected() {
        assert!(
            Array::new_multi(VariantScalarTypeId::Int32, vec![Variant::Int32(1)], vec![1]).is_err()
        );
        let array = Array {
            value_type: VariantScalarTypeId::Int32,
            values: vec![Variant::Int32(1)],
            dimensions: Some(vec![1]),
        };
        assert!(array.validate().is_err());
    }

    #[test]
    fn matrix_dimensions_must_match() {
        let values: Vec<Variant> = (0..6).map(Variant::Int32).collect();
        let array =
            Array::new_multi(VariantScalarTypeId::Int32, values.clone(), vec![2, 3]).unwrap();
        assert!(array.is_multi_dimensional());
        assert!(Array::new_multi(VariantScalarTypeId::Int32, values, vec![2, 4]).is_err());
    }
}
