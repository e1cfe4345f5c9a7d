use std::{collections::HashSet, fmt};

use dentscan_mesh::MeshData;
use thiserror::Error;

use crate::{
    archive::{ArchiveError, ArchiveReader},
    decoder::{DecodeError, MeshDecoder, StlDecoder},
    pairer::{plan_pairs, PairingError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestionErrorKind {
    /// An upper scan has no lower scan to pair with.
    UnmatchedUpper,
    /// A file could not be extracted or parsed.
    DecodeFailure,
    /// A mesh parsed but holds no surface.
    InvalidMeshFormat,
}

impl fmt::Display for IngestionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IngestionErrorKind::UnmatchedUpper => "unmatched upper scan",
            IngestionErrorKind::DecodeFailure => "decode failure",
            IngestionErrorKind::InvalidMeshFormat => "invalid mesh format",
        };
        f.write_str(s)
    }
}

/// A problem with part of an archive. These are collected in the [`SceneBundle`] and never
/// abort ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionError {
    pub kind: IngestionErrorKind,
    /// The archive entries the problem relates to.
    pub files: Vec<String>,
    pub message: String,
}

impl IngestionError {
    pub fn new(kind: IngestionErrorKind, files: Vec<String>, message: String) -> Self {
        Self {
            kind,
            files,
            message,
        }
    }
}

impl fmt::Display for IngestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<DecodeError> for IngestionError {
    fn from(e: DecodeError) -> Self {
        let kind = match e {
            DecodeError::Failure { .. } => IngestionErrorKind::DecodeFailure,
            DecodeError::InvalidMeshFormat { .. } => IngestionErrorKind::InvalidMeshFormat,
        };
        IngestionError::new(kind, vec![e.name().to_string()], e.to_string())
    }
}

/// Failures that abort ingestion of the whole archive.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    InvalidArchive(ArchiveError),

    #[error("no .stl files found in the archive")]
    NoMeshFilesFound,
}

impl From<PairingError> for IngestError {
    fn from(e: PairingError) -> Self {
        match e {
            PairingError::NoMeshFilesFound => IngestError::NoMeshFilesFound,
        }
    }
}

/// The upper and lower arch of one case.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPair {
    /// Upper scan name without its `_u.stl` suffix.
    pub base_name: String,
    pub upper_name: String,
    pub lower_name: String,
    pub upper: MeshData,
    pub lower: MeshData,
}

/// A reference photograph, passed through undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Everything ingested from one archive.
///
/// Pairs, images and errors each keep the order in which they were found in the archive.
/// Unmatched upper scans are reported before any decode problems since pairing happens first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBundle {
    pairs: Vec<ScanPair>,
    images: Vec<AuxImage>,
    errors: Vec<IngestionError>,
}

impl SceneBundle {
    pub fn pairs(&self) -> &[ScanPair] {
        &self.pairs
    }

    pub fn images(&self) -> &[AuxImage] {
        &self.images
    }

    pub fn errors(&self) -> &[IngestionError] {
        &self.errors
    }

    /// True when every upper scan was paired and decoded.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Vec<ScanPair>, Vec<AuxImage>, Vec<IngestionError>) {
        (self.pairs, self.images, self.errors)
    }
}

/// Ingests scan archives using `D` to decode meshes.
#[derive(Debug, Default, Clone)]
pub struct Pipeline<D> {
    decoder: D,
}

impl<D: MeshDecoder> Pipeline<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    fn load(&self, archive: &mut ArchiveReader<'_>, name: &str) -> Result<MeshData, DecodeError> {
        let bytes = archive.read_entry(name).map_err(|e| DecodeError::Failure {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.decoder.decode(name, &bytes)
    }

    /// Ingests one archive.
    ///
    /// Only two conditions fail the call: `bytes` not being a ZIP archive, and the archive not
    /// holding any `.stl` file. Every other problem ends up in [`SceneBundle::errors`].
    pub fn ingest(&self, bytes: &[u8]) -> Result<SceneBundle, IngestError> {
        let mut archive = ArchiveReader::open(bytes).map_err(IngestError::InvalidArchive)?;
        let plan = plan_pairs(archive.entries())?;

        let mut bundle = SceneBundle {
            pairs: Vec::with_capacity(plan.pairs.len()),
            images: Vec::with_capacity(plan.images.len()),
            errors: plan.errors,
        };

        // A lower scan can be matched by several upper scans. One that fails is decoded and
        // reported only once.
        let mut failed: HashSet<String> = HashSet::new();
        let mut load = |name: &str, errors: &mut Vec<IngestionError>| -> Option<MeshData> {
            if failed.contains(name) {
                log::debug!("skipping '{name}', it already failed to decode");
                return None;
            }
            match self.load(&mut archive, name) {
                Ok(mesh) => Some(mesh),
                Err(e) => {
                    log::warn!("{e}");
                    failed.insert(name.to_string());
                    errors.push(e.into());
                    None
                }
            }
        };

        for pair in plan.pairs {
            let upper = load(&pair.upper, &mut bundle.errors);
            let lower = load(&pair.lower, &mut bundle.errors);
            if let (Some(upper), Some(lower)) = (upper, lower) {
                bundle.pairs.push(ScanPair {
                    base_name: pair.base_name,
                    upper_name: pair.upper,
                    lower_name: pair.lower,
                    upper,
                    lower,
                });
            }
        }

        for name in plan.images {
            match archive.read_entry(&name) {
                Ok(bytes) => bundle.images.push(AuxImage { name, bytes }),
                Err(e) => {
                    log::warn!("{e}");
                    bundle.errors.push(IngestionError::new(
                        IngestionErrorKind::DecodeFailure,
                        vec![name],
                        e.to_string(),
                    ));
                }
            }
        }

        log::info!(
            "ingested {} scan pairs, {} images, {} problems",
            bundle.pairs.len(),
            bundle.images.len(),
            bundle.errors.len()
        );
        Ok(bundle)
    }
}

/// Ingests `bytes` with the STL decoder.
pub fn ingest(bytes: &[u8]) -> Result<SceneBundle, IngestError> {
    Pipeline::new(StlDecoder).ingest(bytes)
}
