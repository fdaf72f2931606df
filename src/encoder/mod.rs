// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Encoders for the export document. XML is the only encoding, per the
//! NodeSet2 standard.

mod value_xml;
mod xml;

pub use xml::XmlEncoder;

use std::{collections::BTreeMap, fmt, io::Write, path::PathBuf};

use thiserror::Error;

use crate::{model::NodeIntermediateModel, types::NodeId};

/// The encoding of the exported document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EncoderType {
    /// NodeSet2 XML.
    #[default]
    Xml,
}

/// Where the exported document is written.
pub enum ExportTarget {
    /// Write to a file at the given path.
    File(PathBuf),
    /// Write to a caller-provided stream.
    Stream(Box<dyn Write + Send>),
}

impl fmt::Debug for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportTarget::File(path) => f.debug_tuple("File").field(path).finish(),
            ExportTarget::Stream(_) => f.debug_tuple("Stream").finish(),
        }
    }
}

impl From<PathBuf> for ExportTarget {
    fn from(path: PathBuf) -> Self {
        ExportTarget::File(path)
    }
}

/// Error returned when building or writing the export document.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// Invalid XML produced while writing.
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),
    /// Failed to write to the output.
    #[error("failed to write to the output: {0}")]
    Io(#[from] std::io::Error),
    /// The encoder was driven out of order.
    #[error("{0}")]
    State(String),
    /// A `Value` payload cannot be represented in the document.
    #[error("unsupported value payload: {0}")]
    UnsupportedValue(String),
}

/// An ordered encoder for a NodeSet2 document. Sections may be fed in any
/// pipeline order; the document ordering (namespaces, aliases, nodes) is
/// enforced when [`end`](NodesetEncoder::end) assembles the output.
pub trait NodesetEncoder {
    /// Starts the document. Must be called exactly once, first.
    fn begin(&mut self) -> Result<(), EncoderError>;

    /// Adds the namespace URI section. Calling twice is an error.
    fn add_namespaces(&mut self, namespaces: &[String]) -> Result<(), EncoderError>;

    /// Adds the alias section. Calling twice is an error.
    fn add_aliases(&mut self, aliases: &BTreeMap<String, NodeId>) -> Result<(), EncoderError>;

    /// Adds one Object node.
    fn add_node_object(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError>;

    /// Adds one Variable node.
    fn add_node_variable(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError>;

    /// Adds one ObjectType node.
    fn add_node_object_type(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError>;

    /// Adds one VariableType node.
    fn add_node_variable_type(&mut self, node: &NodeIntermediateModel)
        -> Result<(), EncoderError>;

    /// Adds one ReferenceType node.
    fn add_node_reference_type(
        &mut self,
        node: &NodeIntermediateModel,
    ) -> Result<(), EncoderError>;

    /// Adds one DataType node.
    fn add_node_data_type(&mut self, node: &NodeIntermediateModel) -> Result<(), EncoderError>;

    /// Assembles the document and writes it to the target. Consumes the
    /// in-memory tree; the encoder cannot be used afterwards.
    fn end(&mut self) -> Result<(), EncoderError>;
}
