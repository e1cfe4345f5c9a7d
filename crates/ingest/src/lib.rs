//! Ingestion of dental scan archives.
//!
//! An archive bundles the upper (`*_u.stl`) and lower (`*_l.stl`) arch scans of one or more cases
//! together with reference photographs. [`ingest`] validates the archive, pairs every upper scan
//! with its lower counterpart, decodes the meshes and returns a [`SceneBundle`] that a renderer
//! can consume. Problems with individual files are collected in the bundle instead of failing the
//! whole call.

mod archive;
mod decoder;
mod pairer;
mod pipeline;
mod segment;

pub use archive::*;
pub use decoder::*;
pub use pairer::*;
pub use pipeline::*;
pub use segment::*;

pub use dentscan_mesh::MeshData;
