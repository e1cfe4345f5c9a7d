use dentscan_mesh::MeshData;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The bytes could not be parsed into a mesh at all.
    #[error("failed to decode '{name}': {reason}")]
    Failure { name: String, reason: String },

    /// The bytes parsed but did not describe a triangulated surface.
    #[error("'{name}' does not contain a triangulated surface")]
    InvalidMeshFormat { name: String },
}

impl DecodeError {
    pub fn name(&self) -> &str {
        match self {
            DecodeError::Failure { name, .. } | DecodeError::InvalidMeshFormat { name } => name,
        }
    }
}

/// Turns the raw bytes of one archive entry into a mesh.
///
/// Implementations must never hand back an empty mesh: input that parses but holds no vertices
/// or no faces is reported as [`DecodeError::InvalidMeshFormat`].
pub trait MeshDecoder {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<MeshData, DecodeError>;
}

/// Decodes binary and ASCII STL.
#[derive(Debug, Default, Clone, Copy)]
pub struct StlDecoder;

impl MeshDecoder for StlDecoder {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<MeshData, DecodeError> {
        let mesh: MeshData =
            dentscan_stl::parse_stl(bytes).map_err(|e| DecodeError::Failure {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        if mesh.is_empty() {
            return Err(DecodeError::InvalidMeshFormat {
                name: name.to_string(),
            });
        }
        Ok(mesh)
    }
}
