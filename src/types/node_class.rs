// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The `NodeClass` enum, a mask-valued classification of address space nodes.

use std::fmt;

/// The class of an address space node, with the mask values from
/// OPC UA Part 3.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum NodeClass {
    /// Unknown or unreadable node class. Servers report this for nodes
    /// that do not exist.
    #[default]
    Unspecified = 0,
    /// Object node.
    Object = 1,
    /// Variable node.
    Variable = 2,
    /// Method node.
    Method = 4,
    /// Object type node.
    ObjectType = 8,
    /// Variable type node.
    VariableType = 16,
    /// Reference type node.
    ReferenceType = 32,
    /// Data type node.
    DataType = 64,
    /// View node.
    View = 128,
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TryFrom<i32> for NodeClass {
    type Error = i32;

    // Node class attribute reads come back as a raw Int32 and are re-tagged
    // through this conversion.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => NodeClass::Unspecified,
            1 => NodeClass::Object,
            2 => NodeClass::Variable,
            4 => NodeClass::Method,
            8 => NodeClass::ObjectType,
            16 => NodeClass::VariableType,
            32 => NodeClass::ReferenceType,
            64 => NodeClass::DataType,
            128 => NodeClass::View,
            v => return Err(v),
        })
    }
}

impl NodeClass {
    /// Tests if this is one of the type node classes, whose supertype edge
    /// is an inverse `HasSubtype` reference.
    pub fn is_type_class(&self) -> bool {
        matches!(
            self,
            NodeClass::ObjectType
                | NodeClass::VariableType
                | NodeClass::ReferenceType
                | NodeClass::DataType
        )
    }

    /// Tests if nodes of this class appear in a NodeSet2 export. Method,
    /// View and Unspecified nodes are never exported.
    pub fn is_exportable(&self) -> bool {
        !matches!(
            self,
            NodeClass::Unspecified | NodeClass::Method | NodeClass::View
        )
    }
}
