use dentscan_mesh::{MeshData, MeshError};
use thiserror::Error;

use crate::{
    archive::{ArchiveError, ArchiveReader},
    decoder::{DecodeError, MeshDecoder},
    pairer::is_mesh_file,
};

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error(transparent)]
    InvalidArchive(ArchiveError),

    #[error("no .stl files found in the archive")]
    NoMeshFilesFound,

    #[error("segmentation needs at least two .stl files, found {found}")]
    TooFewMeshes { found: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to extract '{name}': {source}")]
    Extract {
        name: String,
        #[source]
        source: ArchiveError,
    },

    #[error("segmentation failed: {0}")]
    Failed(String),
}

impl From<MeshError> for SegmentationError {
    fn from(e: MeshError) -> Self {
        SegmentationError::Failed(e.to_string())
    }
}

/// Splits or merges scan geometry into a segmented surface.
pub trait Segmenter {
    fn segment(&self, a: &MeshData, b: &MeshData) -> Result<MeshData, SegmentationError>;
}

/// Stand-in segmenter that merges both inputs into one mesh.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcatSegmenter;

impl Segmenter for ConcatSegmenter {
    fn segment(&self, a: &MeshData, b: &MeshData) -> Result<MeshData, SegmentationError> {
        Ok(MeshData::concatenate(a, b)?)
    }
}

/// Segments the first two mesh files of an archive, in listing order.
///
/// Unlike ingestion, this does not look at the upper/lower naming convention at all.
pub fn segment_archive<D: MeshDecoder, S: Segmenter>(
    bytes: &[u8],
    decoder: &D,
    segmenter: &S,
) -> Result<MeshData, SegmentationError> {
    let mut archive = ArchiveReader::open(bytes).map_err(SegmentationError::InvalidArchive)?;
    let meshes: Vec<String> = archive
        .entries()
        .iter()
        .filter(|n| is_mesh_file(n))
        .cloned()
        .collect();

    let (first, second) = match meshes.as_slice() {
        [] => return Err(SegmentationError::NoMeshFilesFound),
        [_] => return Err(SegmentationError::TooFewMeshes { found: 1 }),
        [first, second, ..] => (first, second),
    };
    log::debug!("segmenting '{first}' and '{second}'");

    let mut load = |name: &str| -> Result<MeshData, SegmentationError> {
        let data = archive
            .read_entry(name)
            .map_err(|source| SegmentationError::Extract {
                name: name.to_string(),
                source,
            })?;
        Ok(decoder.decode(name, &data)?)
    };
    let a = load(first)?;
    let b = load(second)?;
    segmenter.segment(&a, &b)
}
