// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Well-known numeric node ids from the OPC UA base namespace, trimmed to
//! the identifiers the exporter needs. The `Debug` names of `DataTypeId`
//! and `ReferenceTypeId` double as NodeSet2 alias strings.

use crate::types::node_id::NodeId;

macro_rules! well_known_id {
    ($(#[$attr:meta])* $name:ident { $($(#[$vattr:meta])* $variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $($(#[$vattr])* $variant = $value,)+
        }

        impl TryFrom<u32> for $name {
            type Error = u32;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                Ok(match value {
                    $($value => $name::$variant,)+
                    v => return Err(v),
                })
            }
        }

        impl From<$name> for NodeId {
            fn from(value: $name) -> Self {
                NodeId::new(0, value as u32)
            }
        }

        impl $name {
            /// The name of the identifier, as used in NodeSet2 aliases.
            pub fn name(&self) -> String {
                format!("{self:?}")
            }
        }
    };
}

well_known_id!(
    /// Well-known objects in the base namespace.
    ObjectId {
        /// The root of the address space.
        RootFolder = 84,
        /// The objects folder, the default parent for exported start nodes.
        ObjectsFolder = 85,
        /// The types folder.
        TypesFolder = 86,
        /// The views folder.
        ViewsFolder = 87,
    }
);

well_known_id!(
    /// Well-known object types in the base namespace.
    ObjectTypeId {
        /// Base of the object type hierarchy.
        BaseObjectType = 58,
        /// Folder type, assigned to fabricated start nodes.
        FolderType = 61,
    }
);

well_known_id!(
    /// Well-known variable types in the base namespace.
    VariableTypeId {
        /// Abstract base of the variable type hierarchy. Cannot be
        /// instantiated by NodeSet2 loaders.
        BaseVariableType = 62,
        /// The concrete replacement for `BaseVariableType`.
        BaseDataVariableType = 63,
        /// Property variable type.
        PropertyType = 68,
    }
);

well_known_id!(
    /// Well-known variables in the base namespace.
    VariableId {
        /// The server's namespace array.
        ServerNamespaceArray = 2255,
    }
);

well_known_id!(
    /// Well-known data types in the base namespace.
    DataTypeId {
        /// Boolean data type.
        Boolean = 1,
        /// Signed byte data type.
        SByte = 2,
        /// Unsigned byte data type.
        Byte = 3,
        /// 16-bit signed integer data type.
        Int16 = 4,
        /// 16-bit unsigned integer data type.
        UInt16 = 5,
        /// 32-bit signed integer data type.
        Int32 = 6,
        /// 32-bit unsigned integer data type.
        UInt32 = 7,
        /// 64-bit signed integer data type.
        Int64 = 8,
        /// 64-bit unsigned integer data type.
        UInt64 = 9,
        /// 32-bit floating point data type.
        Float = 10,
        /// 64-bit floating point data type.
        Double = 11,
        /// String data type.
        String = 12,
        /// Date/time data type.
        DateTime = 13,
        /// GUID data type.
        Guid = 14,
        /// Byte string data type.
        ByteString = 15,
        /// XML element data type.
        XmlElement = 16,
        /// NodeId data type.
        NodeId = 17,
        /// ExpandedNodeId data type.
        ExpandedNodeId = 18,
        /// StatusCode data type.
        StatusCode = 19,
        /// QualifiedName data type.
        QualifiedName = 20,
        /// LocalizedText data type.
        LocalizedText = 21,
        /// Abstract structure data type.
        Structure = 22,
        /// DataValue data type.
        DataValue = 23,
        /// Abstract base of the data type hierarchy.
        BaseDataType = 24,
        /// DiagnosticInfo data type.
        DiagnosticInfo = 25,
        /// Abstract number data type.
        Number = 26,
        /// Abstract integer data type.
        Integer = 27,
        /// Abstract unsigned integer data type.
        UInteger = 28,
        /// Abstract enumeration data type.
        Enumeration = 29,
    }
);

well_known_id!(
    /// Well-known reference types in the base namespace.
    ReferenceTypeId {
        /// Abstract base of all references.
        References = 31,
        /// Abstract base of non-hierarchical references.
        NonHierarchicalReferences = 32,
        /// Abstract base of hierarchical references.
        HierarchicalReferences = 33,
        /// Abstract child aggregation reference.
        HasChild = 34,
        /// Organizational reference.
        Organizes = 35,
        /// Event source reference.
        HasEventSource = 36,
        /// Modelling rule reference.
        HasModellingRule = 37,
        /// Encoding reference.
        HasEncoding = 38,
        /// Description reference.
        HasDescription = 39,
        /// Type definition reference. Every Object and Variable carries
        /// exactly one in the forward direction.
        HasTypeDefinition = 40,
        /// Event generation reference.
        GeneratesEvent = 41,
        /// Abstract aggregation reference.
        Aggregates = 44,
        /// Subtype reference, the supertype edge of the type hierarchies.
        HasSubtype = 45,
        /// Property reference.
        HasProperty = 46,
        /// Component reference.
        HasComponent = 47,
        /// Notifier reference.
        HasNotifier = 48,
        /// Ordered component reference.
        HasOrderedComponent = 49,
    }
);

impl ReferenceTypeId {
    /// Tests if this reference type is a subtype of
    /// `HierarchicalReferences`.
    pub fn is_hierarchical(&self) -> bool {
        matches!(
            self,
            ReferenceTypeId::HierarchicalReferences
                | ReferenceTypeId::HasChild
                | ReferenceTypeId::Organizes
                | ReferenceTypeId::HasEventSource
                | ReferenceTypeId::Aggregates
                | ReferenceTypeId::HasSubtype
                | ReferenceTypeId::HasProperty
                | ReferenceTypeId::HasComponent
                | ReferenceTypeId::HasNotifier
                | ReferenceTypeId::HasOrderedComponent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_names() {
        assert_eq!(DataTypeId::Int64.name(), "Int64");
        assert_eq!(ReferenceTypeId::HasTypeDefinition.name(), "HasTypeDefinition");
        assert_eq!(DataTypeId::try_from(11), Ok(DataTypeId::Double));
        assert_eq!(DataTypeId::try_from(9999), Err(9999));
    }

    #[test]
    fn hierarchy_membership() {
        assert!(ReferenceTypeId::Organizes.is_hierarchical());
        assert!(ReferenceTypeId::HasSubtype.is_hierarchical());
        assert!(!ReferenceTypeId::HasTypeDefinition.is_hierarchical());
        assert!(!ReferenceTypeId::References.is_hierarchical());
    }
}
