// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

#![warn(missing_docs)]

//! Export a selected sub-graph of a live OPC UA address space into a
//! standards-conformant NodeSet2 XML document.
//!
//! The exporter drives batched View and Attribute Service requests over a
//! client session, filters and repairs the returned reference graph so
//! that the output satisfies the NodeSet2 invariants, and streams the
//! result through an ordered XML encoder.
//!
//! The OPC UA transport is not part of this crate: the exporter talks to
//! the session through the [`client::UaServices`] trait, which mirrors
//! the browse/read surface of an OPC UA client session.
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use nodeset_export::{export_nodeset, ExportTarget, Options};
//! use nodeset_export::client::collect_child_node_ids;
//! use nodeset_export::types::ExpandedNodeId;
//!
//! # async fn demo<T: nodeset_export::client::UaServices>(session: &T) -> Result<(), Box<dyn std::error::Error>> {
//! let start: ExpandedNodeId = "ns=2;i=1".parse()?;
//! let nodes = collect_child_node_ids(session, &start).await?;
//! let node_lists = BTreeMap::from([(start.to_string(), nodes)]);
//! let statistics = export_nodeset(
//!     session,
//!     node_lists,
//!     ExportTarget::File("export.xml".into()),
//!     Options::default(),
//! )
//! .await?;
//! println!("exported {} nodes", statistics.total());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod encoder;
mod error;
mod export;
mod model;
pub mod types;
pub mod values;

pub use encoder::{EncoderType, ExportTarget};
pub use error::{ExportError, ServiceError, StatusDetail};
pub use export::{export_nodeset, ExportStatistics, FlatListOptions, Options};
pub use model::NodeIntermediateModel;
