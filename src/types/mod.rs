//! Data types for the process miner
//!
//! This module contains the core data structures shared by the pipeline,
//! the collaborators and the HTTP/WebSocket surface.

mod event;
mod model;
mod update;

pub use event::{sort_by_timestamp, Event};
pub use model::{ElementId, ElementSet, Edge, ModelElement, Place, Snapshot, Transition};
pub use update::{Update, UpdateKind, WireMessage, WIRE_VERSION};
