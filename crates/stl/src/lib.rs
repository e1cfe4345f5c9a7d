//! Reading and writing of STL surface meshes.
//!
//! Both the binary and the ASCII flavour of the format are understood when reading. Writing
//! always produces binary STL.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use dentscan_mesh::{MeshData, Triangle, TriangleMesh, Vector3};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

const HEADER_SIZE: u64 = 80;
/// Header plus the triangle count.
const PREAMBLE_SIZE: u64 = HEADER_SIZE + 4;
/// Normal, 3 vertices and the attribute byte count.
const TRIANGLE_SIZE: u64 = 4 * 3 * 4 + 2;

#[derive(Debug, Error)]
pub enum StlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input of {0} bytes is too small to be an STL file")]
    TooShort(u64),

    #[error("header declares {triangles} triangles ({expected} bytes) but only {got} bytes are present")]
    Truncated {
        triangles: u32,
        expected: u64,
        got: u64,
    },

    #[error("line {line}: {message}")]
    Ascii { line: usize, message: String },

    #[error("mesh has {0} triangles which cannot be stored in an STL file")]
    TooManyTriangles(usize),
}

fn read_vector<T: Read>(f: &mut T) -> std::io::Result<Vector3> {
    Ok(Vector3 {
        x: f.read_f32::<LittleEndian>()?,
        y: f.read_f32::<LittleEndian>()?,
        z: f.read_f32::<LittleEndian>()?,
    })
}

fn read_binary<M: TriangleMesh, T: Read + Seek>(f: &mut T, len: u64) -> Result<M, StlError> {
    if len < PREAMBLE_SIZE {
        return Err(StlError::TooShort(len));
    }

    // Binary files start with an 80 byte header. There is no defined structure for this
    // header but some implementations will stash some metadata in this header. For now
    // we'll just skip the header and load the geometry.
    f.seek(SeekFrom::Start(HEADER_SIZE))?;

    // Immediately following the header is an unsigned 32-bit integer that indicates the
    // number of triagles that follow.
    let n_triangles = f.read_u32::<LittleEndian>()?;
    let expected = PREAMBLE_SIZE + TRIANGLE_SIZE * n_triangles as u64;
    if expected > len {
        return Err(StlError::Truncated {
            triangles: n_triangles,
            expected,
            got: len,
        });
    }

    let mut data = Vec::<Triangle>::with_capacity(n_triangles as usize);
    for _ in 0..n_triangles {
        // Each triangle is specified by a normal vector followed by 3 verticies of the
        // triangle. While the normal vector may be included, it is generally expected
        // that verticies be listed in counter-clockwise order and so the normal vector
        // maybe specified as (0, 0, 0).
        let _normal = read_vector(f)?;
        data.push(Triangle {
            p0: read_vector(f)?,
            p1: read_vector(f)?,
            p2: read_vector(f)?,
        });
        // After the triangle geometry there is a 2-byte unsigned integer called the
        // "attribute byte count". There is no standard structure of this field, but
        // some applications use this for color data.
        let _attribute_byte_count = f.read_u16::<LittleEndian>()?;
    }
    Ok(M::from_triangles(data))
}

fn ascii_error(line: usize, message: impl Into<String>) -> StlError {
    StlError::Ascii {
        line,
        message: message.into(),
    }
}

fn parse_coord(line: usize, token: Option<&str>) -> Result<f32, StlError> {
    let token = token.ok_or_else(|| ascii_error(line, "vertex needs 3 coordinates"))?;
    token
        .parse()
        .map_err(|e| ascii_error(line, format!("invalid coordinate '{token}': {e}")))
}

fn read_ascii<M: TriangleMesh>(text: &str) -> Result<M, StlError> {
    let mut data = Vec::<Triangle>::new();
    let mut corners = Vec::<Vector3>::with_capacity(3);
    let mut in_facet = false;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword.to_ascii_lowercase().as_str() {
            "facet" => {
                if in_facet {
                    return Err(ascii_error(line_no, "nested facet"));
                }
                in_facet = true;
                corners.clear();
            }
            "vertex" => {
                if !in_facet {
                    return Err(ascii_error(line_no, "vertex outside of a facet"));
                }
                corners.push(Vector3 {
                    x: parse_coord(line_no, tokens.next())?,
                    y: parse_coord(line_no, tokens.next())?,
                    z: parse_coord(line_no, tokens.next())?,
                });
            }
            "endfacet" => {
                if corners.len() != 3 {
                    return Err(ascii_error(
                        line_no,
                        format!("facet has {} vertices, expected 3", corners.len()),
                    ));
                }
                data.push(Triangle {
                    p0: corners[0],
                    p1: corners[1],
                    p2: corners[2],
                });
                in_facet = false;
            }
            "endsolid" => break,
            // solid, outer loop, endloop
            _ => {}
        }
    }
    if in_facet {
        return Err(ascii_error(text.lines().count(), "unterminated facet"));
    }
    Ok(M::from_triangles(data))
}

/// ASCII files start with `solid`. Unfortunately so do plenty of binary files, so the input is
/// only treated as ASCII when it cannot be binary: the header holds no NUL bytes and the
/// triangle count does not fit in the data that follows. Binary files with trailing padding
/// still count as binary.
fn looks_like_ascii(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    if !data[start..].starts_with(b"solid") {
        return false;
    }
    if data.len() as u64 >= PREAMBLE_SIZE {
        if data[..HEADER_SIZE as usize].contains(&0) {
            return false;
        }
        let count = &data[HEADER_SIZE as usize..PREAMBLE_SIZE as usize];
        let n = u32::from_le_bytes([count[0], count[1], count[2], count[3]]);
        if PREAMBLE_SIZE + TRIANGLE_SIZE * n as u64 <= data.len() as u64 {
            return false;
        }
    }
    true
}

pub fn read_stl<M: TriangleMesh, P: AsRef<Path>>(p: P) -> Result<M, StlError> {
    let data = std::fs::read(p)?;
    parse_stl(&data)
}

pub fn parse_stl<M: TriangleMesh>(data: &[u8]) -> Result<M, StlError> {
    if looks_like_ascii(data) {
        log::trace!("parsing {} bytes as ASCII STL", data.len());
        read_ascii(&String::from_utf8_lossy(data))
    } else {
        let mut c = std::io::Cursor::new(data);
        read_binary(&mut c, data.len() as u64)
    }
}

/// Writes `mesh` as binary STL.
///
/// Normals are recomputed from the facet winding.
pub fn write_stl<W: Write>(mesh: &MeshData, w: &mut W) -> Result<(), StlError> {
    let count = mesh.triangle_count();
    let n_triangles = u32::try_from(count).map_err(|_| StlError::TooManyTriangles(count))?;

    let mut header = [0u8; HEADER_SIZE as usize];
    let tag = b"binary STL written by dentscan";
    header[..tag.len()].copy_from_slice(tag);
    w.write_all(&header)?;
    w.write_u32::<LittleEndian>(n_triangles)?;

    for t in mesh.triangles() {
        for v in [t.normal(), t.p0, t.p1, t.p2] {
            w.write_f32::<LittleEndian>(v.x)?;
            w.write_f32::<LittleEndian>(v.y)?;
            w.write_f32::<LittleEndian>(v.z)?;
        }
        w.write_u16::<LittleEndian>(0)?;
    }
    Ok(())
}

pub trait StlReader: Read {
    fn read_stl<M: TriangleMesh>(&mut self) -> Result<M, StlError>;
}

impl<T: Read + Seek> StlReader for T {
    fn read_stl<M: TriangleMesh>(&mut self) -> Result<M, StlError> {
        let start = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(start))?;

        let mut data = Vec::with_capacity((end - start) as usize);
        self.read_to_end(&mut data)?;
        parse_stl(&data)
    }
}
