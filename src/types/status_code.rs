// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! A reduced `StatusCode` carrying the severity tests and the named codes
//! the exporter reports.

use std::fmt;

/// An OPC UA status code. The top two bits hold the severity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatusCode(u32);

impl StatusCode {
    /// The operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0);
    /// An unexpected error occurred.
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);
    /// An internal error occurred as a result of a programming or configuration error.
    pub const BAD_INTERNAL_ERROR: StatusCode = StatusCode(0x8002_0000);
    /// There was nothing to do because the client passed a list of operations with no elements.
    pub const BAD_NOTHING_TO_DO: StatusCode = StatusCode(0x800F_0000);
    /// The node id refers to a node that does not exist in the server address space.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);
    /// The attribute is not supported for the specified node.
    pub const BAD_ATTRIBUTE_ID_INVALID: StatusCode = StatusCode(0x8035_0000);
    /// The value supplied for the attribute is not of the same type as the attribute's value.
    pub const BAD_TYPE_MISMATCH: StatusCode = StatusCode(0x8074_0000);
    /// The value is an initial value for a variable that normally receives its value from another variable.
    pub const UNCERTAIN_INITIAL_VALUE: StatusCode = StatusCode(0x4092_0000);

    /// Creates a status code from its numeric value.
    pub const fn from_bits(bits: u32) -> StatusCode {
        StatusCode(bits)
    }

    /// The numeric value of the code.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Severity is good.
    pub const fn is_good(&self) -> bool {
        self.0 & 0xc000_0000 == 0
    }

    /// Severity is bad.
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Severity is uncertain.
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0xc000_0000 == 0x4000_0000
    }

    fn name(&self) -> Option<&'static str> {
        Some(match *self {
            StatusCode::GOOD => "Good",
            StatusCode::BAD_UNEXPECTED_ERROR => "BadUnexpectedError",
            StatusCode::BAD_INTERNAL_ERROR => "BadInternalError",
            StatusCode::BAD_NOTHING_TO_DO => "BadNothingToDo",
            StatusCode::BAD_NODE_ID_UNKNOWN => "BadNodeIdUnknown",
            StatusCode::BAD_ATTRIBUTE_ID_INVALID => "BadAttributeIdInvalid",
            StatusCode::BAD_TYPE_MISMATCH => "BadTypeMismatch",
            StatusCode::UNCERTAIN_INITIAL_VALUE => "UncertainInitialValue",
            _ => return None,
        })
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity() {
        assert!(StatusCode::GOOD.is_good());
        assert!(!StatusCode::GOOD.is_bad());
        assert!(StatusCode::BAD_NODE_ID_UNKNOWN.is_bad());
        assert!(!StatusCode::BAD_NODE_ID_UNKNOWN.is_uncertain());
        assert!(StatusCode::UNCERTAIN_INITIAL_VALUE.is_uncertain());
        assert!(!StatusCode::UNCERTAIN_INITIAL_VALUE.is_bad());
        assert!(!StatusCode::UNCERTAIN_INITIAL_VALUE.is_good());
    }

    #[test]
    fn display_names() {
        assert_eq!(StatusCode::BAD_NODE_ID_UNKNOWN.to_string(), "BadNodeIdUnknown");
        assert_eq!(StatusCode::from_bits(0x8123_0000).to_string(), "0x81230000");
    }
}
