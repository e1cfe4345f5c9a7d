use thiserror::Error;

use crate::pipeline::{IngestionError, IngestionErrorKind};

/// Extension shared by all mesh entries, compared case-insensitively.
pub const MESH_EXTENSION: &str = ".stl";
/// Marks an upper arch scan. The `_u` part is case-sensitive.
pub const UPPER_SUFFIX: &str = "_u.stl";
/// Marks a lower arch scan. The `_l` part is case-sensitive.
pub const LOWER_SUFFIX: &str = "_l.stl";
pub const IMAGE_EXTENSIONS: [&str; 2] = [".jpg", ".jpeg"];
/// A photograph is only picked up when its name mentions one of these views.
pub const IMAGE_KEYWORDS: [&str; 3] = ["front", "left", "right"];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PairingError {
    #[error("no .stl files found in the archive")]
    NoMeshFilesFound,
}

/// An upper scan and the lower scan it was matched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPair {
    pub base_name: String,
    pub upper: String,
    pub lower: String,
}

/// The outcome of pairing one archive listing. Every list keeps the archive order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairingPlan {
    pub pairs: Vec<PlannedPair>,
    pub images: Vec<String>,
    pub errors: Vec<IngestionError>,
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    let (name, suffix) = (name.as_bytes(), suffix.as_bytes());
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

pub fn is_mesh_file(name: &str) -> bool {
    ends_with_ignore_case(name, MESH_EXTENSION)
}

// `suffix` is the side marker plus the mesh extension. Only the extension part is compared
// case-insensitively.
fn has_side_suffix(name: &str, suffix: &str) -> bool {
    let marker = &suffix[..suffix.len() - MESH_EXTENSION.len()];
    is_mesh_file(name) && name[..name.len() - MESH_EXTENSION.len()].ends_with(marker)
}

pub fn is_upper_scan(name: &str) -> bool {
    has_side_suffix(name, UPPER_SUFFIX)
}

pub fn is_lower_scan(name: &str) -> bool {
    has_side_suffix(name, LOWER_SUFFIX)
}

/// The token an upper scan shares with its lower counterpart: the name without `_u.stl`.
///
/// Returns `None` for names that are not upper scans.
pub fn base_name(upper: &str) -> Option<&str> {
    is_upper_scan(upper).then(|| &upper[..upper.len() - UPPER_SUFFIX.len()])
}

pub fn is_aux_image(name: &str) -> bool {
    if !IMAGE_EXTENSIONS
        .iter()
        .any(|ext| ends_with_ignore_case(name, ext))
    {
        return false;
    }
    let lower = name.to_lowercase();
    IMAGE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Classifies archive entries and matches every upper scan with a lower scan.
///
/// A lower scan matches when its name contains the upper scan's base name. When several do, the
/// first one in listing order wins. The same lower scan may be matched by more than one upper
/// scan, so a base name that is a substring of another (`A` and `AA`) can produce a false match.
///
/// Upper scans without a match are reported as [`IngestionErrorKind::UnmatchedUpper`] and left
/// out of the plan. Mesh files that carry neither side marker are ignored.
pub fn plan_pairs<S: AsRef<str>>(names: &[S]) -> Result<PairingPlan, PairingError> {
    let mesh_files: Vec<&str> = names
        .iter()
        .map(AsRef::as_ref)
        .filter(|n| is_mesh_file(n))
        .collect();
    if mesh_files.is_empty() {
        return Err(PairingError::NoMeshFilesFound);
    }

    let lower_candidates: Vec<&str> = mesh_files
        .iter()
        .copied()
        .filter(|n| is_lower_scan(n))
        .collect();

    let mut plan = PairingPlan::default();
    for upper in mesh_files.iter().copied() {
        let Some(base) = base_name(upper) else {
            continue;
        };
        match lower_candidates.iter().find(|l| l.contains(base)) {
            Some(lower) => {
                log::debug!("paired '{upper}' with '{lower}' (base '{base}')");
                plan.pairs.push(PlannedPair {
                    base_name: base.to_string(),
                    upper: upper.to_string(),
                    lower: lower.to_string(),
                });
            }
            None => {
                log::warn!("no lower scan found for '{upper}'");
                plan.errors.push(IngestionError::new(
                    IngestionErrorKind::UnmatchedUpper,
                    vec![upper.to_string()],
                    format!("no matching '{LOWER_SUFFIX}' file found for '{upper}'"),
                ));
            }
        }
    }

    plan.images = names
        .iter()
        .map(AsRef::as_ref)
        .filter(|n| is_aux_image(n))
        .map(str::to_string)
        .collect();

    Ok(plan)
}
