// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Errors returned from the export pipeline.

use thiserror::Error;

use crate::{encoder::EncoderError, types::StatusCode, values::ValueTypeError};

/// Error returned from the service layer, before any pipeline stage
/// attribution.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A service call failed at the transport level.
    #[error("service call failed: {0}")]
    Status(StatusCode),
    /// The server broke the request-response order contract.
    #[error("response contains {actual} results, expected {expected}")]
    ResponseLength {
        /// Number of entries requested.
        expected: usize,
        /// Number of results received.
        actual: usize,
    },
    /// A returned value cannot be represented.
    #[error(transparent)]
    Value(#[from] ValueTypeError),
}

/// The pipeline stage sub-code carried by the export status.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusDetail {
    /// No failure.
    No,
    /// Failed to start the output document.
    BeginFail,
    /// Failed to read the server namespace array.
    GetNamespacesFail,
    /// Failed to write the namespace section.
    ExportNamespacesFail,
    /// Failed to read node classes.
    GetNodeClassesFail,
    /// Failed to collect node attributes and references.
    GetNodesDataFail,
    /// Failed to collect aliases.
    GetAliasesFail,
    /// Failed to write node elements.
    ExportNodesFail,
    /// Failed to write the alias section.
    ExportAliasesFail,
    /// Failed to finish the output document.
    EndFail,
    /// A start node violates the ns=0 policy.
    FailedCheckNs0StartNodes,
}

/// Error returned from [`export_nodeset`](crate::export_nodeset). Each
/// variant corresponds to the pipeline stage that failed.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A start node violates the ns=0 start node policy.
    #[error("start node '{0}' is not allowed in the OPC UA base namespace")]
    Ns0StartNode(String),
    /// The output document could not be started.
    #[error("failed to begin the output document: {0}")]
    Begin(#[source] EncoderError),
    /// The server namespace array could not be read.
    #[error("failed to read the server namespace array: {0}")]
    GetNamespaces(String),
    /// The namespace section could not be written.
    #[error("failed to export namespaces: {0}")]
    ExportNamespaces(#[source] EncoderError),
    /// Node classes could not be read.
    #[error("failed to read node classes: {0}")]
    GetNodeClasses(String),
    /// Node attributes or references could not be collected.
    #[error("failed to collect node data: {0}")]
    GetNodesData(String),
    /// Alias collection failed.
    #[error("failed to collect aliases: {0}")]
    GetAliases(String),
    /// A node element could not be written.
    #[error("failed to export nodes: {0}")]
    ExportNodes(#[source] EncoderError),
    /// The alias section could not be written.
    #[error("failed to export aliases: {0}")]
    ExportAliases(#[source] EncoderError),
    /// The document could not be flushed to its destination.
    #[error("failed to finish the output document: {0}")]
    End(#[source] EncoderError),
}

impl ExportError {
    /// The sub-code of the pipeline stage this error belongs to.
    pub fn detail(&self) -> StatusDetail {
        match self {
            ExportError::Ns0StartNode(_) => StatusDetail::FailedCheckNs0StartNodes,
            ExportError::Begin(_) => StatusDetail::BeginFail,
            ExportError::GetNamespaces(_) => StatusDetail::GetNamespacesFail,
            ExportError::ExportNamespaces(_) => StatusDetail::ExportNamespacesFail,
            ExportError::GetNodeClasses(_) => StatusDetail::GetNodeClassesFail,
            ExportError::GetNodesData(_) => StatusDetail::GetNodesDataFail,
            ExportError::GetAliases(_) => StatusDetail::GetAliasesFail,
            ExportError::ExportNodes(_) => StatusDetail::ExportNodesFail,
            ExportError::ExportAliases(_) => StatusDetail::ExportAliasesFail,
            ExportError::End(_) => StatusDetail::EndFail,
        }
    }
}
