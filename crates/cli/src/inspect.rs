use dentscan::{IngestionError, MeshData, SceneBundle};
use dentscan_mesh::TriangleMesh;
use serde::Serialize;

use crate::args;

#[derive(Debug, Serialize, PartialEq)]
struct MeshSummary {
    name: String,
    vertices: usize,
    faces: usize,
    /// Lowest and highest z; renderers colour the surface along this range.
    z_range: Option<(f32, f32)>,
}

impl MeshSummary {
    fn new(name: &str, mesh: &MeshData) -> Self {
        Self {
            name: name.to_string(),
            vertices: mesh.vertex_count(),
            faces: mesh.triangle_count(),
            z_range: mesh.bounds().map(|b| (b.min.z, b.max.z)),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct PairSummary {
    base_name: String,
    upper: MeshSummary,
    lower: MeshSummary,
}

#[derive(Debug, Serialize, PartialEq)]
struct ImageSummary {
    name: String,
    bytes: usize,
}

#[derive(Debug, Serialize, PartialEq)]
struct ProblemSummary {
    kind: String,
    files: Vec<String>,
    message: String,
}

impl From<&IngestionError> for ProblemSummary {
    fn from(e: &IngestionError) -> Self {
        Self {
            kind: format!("{:?}", e.kind),
            files: e.files.clone(),
            message: e.message.clone(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct Report {
    pairs: Vec<PairSummary>,
    images: Vec<ImageSummary>,
    errors: Vec<ProblemSummary>,
}

impl From<&SceneBundle> for Report {
    fn from(bundle: &SceneBundle) -> Self {
        Self {
            pairs: bundle
                .pairs()
                .iter()
                .map(|p| PairSummary {
                    base_name: p.base_name.clone(),
                    upper: MeshSummary::new(&p.upper_name, &p.upper),
                    lower: MeshSummary::new(&p.lower_name, &p.lower),
                })
                .collect(),
            images: bundle
                .images()
                .iter()
                .map(|i| ImageSummary {
                    name: i.name.clone(),
                    bytes: i.bytes.len(),
                })
                .collect(),
            errors: bundle.errors().iter().map(ProblemSummary::from).collect(),
        }
    }
}

fn print_mesh(side: &str, m: &MeshSummary) {
    print!(
        "    {side}: {} ({} vertices, {} faces",
        m.name, m.vertices, m.faces
    );
    if let Some((zmin, zmax)) = m.z_range {
        print!(", z {zmin}..{zmax}");
    }
    println!(")");
}

fn print_report(report: &Report) {
    println!("{} scan pair(s)", report.pairs.len());
    for pair in &report.pairs {
        println!("  {}", pair.base_name);
        print_mesh("upper", &pair.upper);
        print_mesh("lower", &pair.lower);
    }
    println!("{} image(s)", report.images.len());
    for image in &report.images {
        println!("  {} ({} bytes)", image.name, image.bytes);
    }
    if !report.errors.is_empty() {
        println!("{} problem(s)", report.errors.len());
        for e in &report.errors {
            println!("  {}: {}", e.kind, e.message);
        }
    }
}

pub fn inspect_command(args: args::InspectArgs) -> anyhow::Result<()> {
    let bytes = crate::read_archive(&args.archive)?;
    let bundle = dentscan::ingest(&bytes)?;
    let report = Report::from(&bundle);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
