// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Projection of raw `Variant` attribute payloads onto the closed
//! [`AttributeValue`] sum type consumed by the rest of the pipeline.
//!
//! Unsupported payloads project to "absent" rather than failing; an array
//! whose shape contradicts the OPC UA array model is a type error that
//! aborts the export.

use std::fmt;

use thiserror::Error;

use crate::types::{
    Array, AttributeId, EnumDefinition, ExtensionObject, LocalizedText, NodeClass, NodeId,
    QualifiedName, StructureDefinition, Variant, VariantScalarTypeId,
};

/// Error raised when a value cannot be represented at all, as opposed to
/// merely being unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValueTypeError(pub String);

impl From<crate::types::ArrayError> for ValueTypeError {
    fn from(value: crate::types::ArrayError) -> Self {
        ValueTypeError(value.to_string())
    }
}

/// The statically typed value of one node attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// IsAbstract, Symmetric, Historizing and the other boolean attributes.
    Boolean(bool),
    /// EventNotifier, AccessLevel, UserAccessLevel.
    Byte(u8),
    /// WriteMask, UserWriteMask.
    UInt32(u32),
    /// ValueRank.
    Int32(i32),
    /// MinimumSamplingInterval.
    Double(f64),
    /// The NodeClass attribute.
    NodeClass(NodeClass),
    /// The DataType attribute.
    NodeId(NodeId),
    /// The BrowseName attribute.
    QualifiedName(QualifiedName),
    /// DisplayName, Description, InverseName.
    LocalizedText(LocalizedText),
    /// The Value attribute, kept opaque until encoding.
    Value(Variant),
    /// The ArrayDimensions attribute.
    ArrayDimensions(Vec<u32>),
    /// DataTypeDefinition of a structured data type.
    StructureDefinition(StructureDefinition),
    /// DataTypeDefinition of an enumerated data type.
    EnumDefinition(EnumDefinition),
}

impl fmt::Display for AttributeValue {
    // Diagnostic rendering for log and error messages only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Boolean(v) => write!(f, "{v}"),
            AttributeValue::Byte(v) => write!(f, "{v}"),
            AttributeValue::UInt32(v) => write!(f, "{v}"),
            AttributeValue::Int32(v) => write!(f, "{v}"),
            AttributeValue::Double(v) => write!(f, "{v}"),
            AttributeValue::NodeClass(v) => write!(f, "{v}"),
            AttributeValue::NodeId(v) => write!(f, "{v}"),
            AttributeValue::QualifiedName(v) => write!(f, "{v}"),
            AttributeValue::LocalizedText(v) => write!(f, "{v}"),
            AttributeValue::Value(v) => write!(f, "{v:?}"),
            AttributeValue::ArrayDimensions(v) => {
                write!(f, "[ ")?;
                for dim in v {
                    write!(f, "{dim}, ")?;
                }
                write!(f, "]")
            }
            AttributeValue::StructureDefinition(v) => write!(f, "{v:?}"),
            AttributeValue::EnumDefinition(v) => write!(f, "{v:?}"),
        }
    }
}

impl AttributeValue {
    /// The inner node id, if this is the NodeId case.
    pub fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            AttributeValue::NodeId(v) => Some(v),
            _ => None,
        }
    }

    /// The inner qualified name, if this is the QualifiedName case.
    pub fn as_qualified_name(&self) -> Option<&QualifiedName> {
        match self {
            AttributeValue::QualifiedName(v) => Some(v),
            _ => None,
        }
    }

    /// The inner localized text, if this is the LocalizedText case.
    pub fn as_localized_text(&self) -> Option<&LocalizedText> {
        match self {
            AttributeValue::LocalizedText(v) => Some(v),
            _ => None,
        }
    }
}

/// Projects a raw variant read for `attribute_id` onto the attribute value
/// sum type. Returns `Ok(None)` for empty or unsupported payloads.
pub fn project_attribute(
    attribute_id: AttributeId,
    value: &Variant,
) -> Result<Option<AttributeValue>, ValueTypeError> {
    if value.is_empty() {
        return Ok(None);
    }

    // The Value attribute may hold any of the variant cases and is kept
    // opaque; its shape is still validated here so that a malformed array
    // fails the export before any XML is produced.
    if attribute_id == AttributeId::Value {
        if let Variant::Array(array) = value {
            array.validate()?;
        }
        return Ok(Some(AttributeValue::Value(value.clone())));
    }

    // ArrayDimensions is the one attribute that reads back as an array.
    if attribute_id == AttributeId::ArrayDimensions {
        return match value {
            Variant::Array(array) => {
                array.validate()?;
                if array.value_type != VariantScalarTypeId::UInt32 {
                    return Ok(None);
                }
                let dims = array
                    .values
                    .iter()
                    .map(|v| match v {
                        Variant::UInt32(d) => *d,
                        // Unreachable per Array::validate, but do not panic
                        // on malformed input.
                        _ => 0,
                    })
                    .collect();
                Ok(Some(AttributeValue::ArrayDimensions(dims)))
            }
            _ => Ok(None),
        };
    }

    let value = match value {
        Variant::Boolean(v) => AttributeValue::Boolean(*v),
        Variant::Byte(v) => AttributeValue::Byte(*v),
        Variant::UInt32(v) => AttributeValue::UInt32(*v),
        Variant::Int32(v) => {
            // Servers report the NodeClass attribute as a raw Int32;
            // re-tag it so downstream code sees the proper enum.
            if attribute_id == AttributeId::NodeClass {
                match NodeClass::try_from(*v) {
                    Ok(node_class) => AttributeValue::NodeClass(node_class),
                    Err(_) => return Ok(None),
                }
            } else {
                AttributeValue::Int32(*v)
            }
        }
        Variant::Double(v) => AttributeValue::Double(*v),
        Variant::NodeId(v) => AttributeValue::NodeId(v.as_ref().clone()),
        Variant::QualifiedName(v) => AttributeValue::QualifiedName(v.as_ref().clone()),
        Variant::LocalizedText(v) => AttributeValue::LocalizedText(v.as_ref().clone()),
        Variant::ExtensionObject(ExtensionObject::StructureDefinition(v)) => {
            AttributeValue::StructureDefinition(v.as_ref().clone())
        }
        Variant::ExtensionObject(ExtensionObject::EnumDefinition(v)) => {
            AttributeValue::EnumDefinition(v.as_ref().clone())
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Validates an array destined for a `Value` payload, used by callers that
/// construct arrays outside [`project_attribute`].
pub fn validate_value_array(array: &Array) -> Result<(), ValueTypeError> {
    array.validate().map_err(ValueTypeError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Array;

    #[test]
    fn empty_projects_to_absent() {
        assert_eq!(
            project_attribute(AttributeId::DisplayName, &Variant::Empty).unwrap(),
            None
        );
    }

    #[test]
    fn scalar_cases() {
        assert_eq!(
            project_attribute(AttributeId::IsAbstract, &Variant::Boolean(true)).unwrap(),
            Some(AttributeValue::Boolean(true))
        );
        assert_eq!(
            project_attribute(AttributeId::WriteMask, &Variant::UInt32(96)).unwrap(),
            Some(AttributeValue::UInt32(96))
        );
        assert_eq!(
            project_attribute(AttributeId::ValueRank, &Variant::Int32(-1)).unwrap(),
            Some(AttributeValue::Int32(-1))
        );
        assert_eq!(
            project_attribute(
                AttributeId::BrowseName,
                &Variant::from(QualifiedName::new(1, "vPLC1"))
            )
            .unwrap(),
            Some(AttributeValue::QualifiedName(QualifiedName::new(1, "vPLC1")))
        );
    }

    #[test]
    fn node_class_is_re_tagged() {
        assert_eq!(
            project_attribute(AttributeId::NodeClass, &Variant::Int32(2)).unwrap(),
            Some(AttributeValue::NodeClass(NodeClass::Variable))
        );
        // An undefined class value is unsupported rather than fatal.
        assert_eq!(
            project_attribute(AttributeId::NodeClass, &Variant::Int32(7)).unwrap(),
            None
        );
    }

    #[test]
    fn array_dimensions_project_to_u32_vector() {
        let array = Array::new_single(
            VariantScalarTypeId::UInt32,
            vec![Variant::UInt32(5), Variant::UInt32(3)],
        )
        .unwrap();
        assert_eq!(
            project_attribute(AttributeId::ArrayDimensions, &Variant::from(array)).unwrap(),
            Some(AttributeValue::ArrayDimensions(vec![5, 3]))
        );
    }

    #[test]
    fn value_stays_opaque() {
        let projected = project_attribute(AttributeId::Value, &Variant::Int64(45)).unwrap();
        assert_eq!(projected, Some(AttributeValue::Value(Variant::Int64(45))));
    }

    #[test]
    fn inconsistent_array_is_a_type_error() {
        let array = Array {
            value_type: VariantScalarTypeId::Int32,
            values: vec![Variant::Int32(1)],
            dimensions: Some(vec![1]),
        };
        assert!(project_attribute(AttributeId::Value, &Variant::from(array)).is_err());
    }

    #[test]
    fn unsupported_projects_to_absent() {
        assert_eq!(
            project_attribute(AttributeId::Value, &Variant::Empty).unwrap(),
            None
        );
        assert_eq!(
            project_attribute(AttributeId::Description, &Variant::Int64(1)).unwrap(),
            None
        );
    }

    #[test]
    fn formatter_is_total() {
        let values = [
            AttributeValue::Boolean(true),
            AttributeValue::Byte(5),
            AttributeValue::UInt32(96),
            AttributeValue::Int32(-1),
            AttributeValue::Double(0.5),
            AttributeValue::NodeClass(NodeClass::Object),
            AttributeValue::NodeId(NodeId::new(0, 8u32)),
            AttributeValue::QualifiedName(QualifiedName::new(1, "name")),
            AttributeValue::LocalizedText(LocalizedText::from("text")),
            AttributeValue::Value(Variant::Int64(45)),
            AttributeValue::ArrayDimensions(vec![5, 3]),
            AttributeValue::StructureDefinition(StructureDefinition::default()),
            AttributeValue::EnumDefinition(EnumDefinition::default()),
        ];
        for value in values {
            assert!(!value.to_string().is_empty());
        }
    }
}
