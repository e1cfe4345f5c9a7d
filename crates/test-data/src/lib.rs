//! Scan fixtures shared by the test suites.
//!
//! Everything is generated in memory so tests do not depend on checked-in models.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

pub struct TestModel {
    pub bytes: Vec<u8>,
    pub triangles: usize,
    /// Vertex count once identical corners are merged.
    pub vertices: usize,
    pub model_height: f32,
}

type Corner = [f32; 3];

fn binary_stl(triangles: &[[Corner; 3]]) -> Vec<u8> {
    let mut out = vec![0u8; 80];
    out.write_u32::<LittleEndian>(triangles.len() as u32).unwrap();
    for t in triangles {
        // Normals are optional in STL, readers must not rely on them.
        for _ in 0..3 {
            out.write_f32::<LittleEndian>(0.0).unwrap();
        }
        for corner in t {
            for c in corner {
                out.write_f32::<LittleEndian>(*c).unwrap();
            }
        }
        out.write_u16::<LittleEndian>(0).unwrap();
    }
    out
}

fn cube_triangles(size: f32, z: f32) -> Vec<[Corner; 3]> {
    let x0 = [0.0, size, z + size];
    let x1 = [size, 0.0, z + size];
    let x2 = [size, size, z + size];
    let x3 = [0.0, 0.0, z + size];
    let x4 = [0.0, 0.0, z];
    let x5 = [size, size, z];
    let x6 = [size, 0.0, z];
    let x7 = [0.0, size, z];
    vec![
        [x0, x1, x2],
        [x1, x0, x3],
        [x4, x5, x6],
        [x5, x4, x7],
        [x4, x1, x3],
        [x1, x4, x6],
        [x1, x5, x2],
        [x5, x1, x6],
        [x5, x0, x2],
        [x0, x5, x7],
        [x4, x0, x7],
        [x0, x4, x3],
    ]
}

/// A binary cube from 0-20 on x,y,z.
pub fn stl_cube() -> TestModel {
    TestModel {
        bytes: binary_stl(&cube_triangles(20.0, 0.0)),
        triangles: 12,
        vertices: 8,
        model_height: 20.0,
    }
}

/// A binary cube of side 10 floating above the origin, stands in for an upper arch.
pub fn stl_upper_arch() -> TestModel {
    TestModel {
        bytes: binary_stl(&cube_triangles(10.0, 15.0)),
        triangles: 12,
        vertices: 8,
        model_height: 10.0,
    }
}

/// A single binary triangle in the z=0 plane.
pub fn stl_triangle() -> TestModel {
    TestModel {
        bytes: binary_stl(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]),
        triangles: 1,
        vertices: 3,
        model_height: 0.0,
    }
}

/// A well formed binary STL that holds no triangles.
pub fn stl_empty() -> TestModel {
    TestModel {
        bytes: binary_stl(&[]),
        triangles: 0,
        vertices: 0,
        model_height: 0.0,
    }
}

/// Binary STL whose header claims more triangles than the file holds.
pub fn stl_truncated() -> Vec<u8> {
    let mut bytes = stl_cube().bytes;
    bytes.truncate(bytes.len() - 60);
    bytes
}

pub const STL_ASCII_SQUARE: &str = "solid square
  facet normal 0 0 1
    outer loop
      vertex 0 0 5
      vertex 4 0 5
      vertex 4 4 5
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 0 0 5
      vertex 4 4 5
      vertex 0 4 5
    endloop
  endfacet
endsolid square
";

/// Bytes that look like a JPEG to anything that only sniffs the magic number.
pub fn jpeg_stub() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9]
}

/// Builds an in-memory ZIP archive holding `entries` in the given order.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, bytes) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// One uncompressed entry of an archive built by [`stored_zip_archive`].
///
/// Unlike [`zip_archive`] this allows writing archives that lie about their content.
#[derive(Debug, Clone, Copy)]
pub struct StoredEntry<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
    /// Uncompressed size written to the headers instead of the real one, as a ZIP64 field.
    pub declared_size: Option<u64>,
    /// Store a checksum that does not match `bytes`.
    pub bad_crc: bool,
}

impl<'a> StoredEntry<'a> {
    pub fn new(name: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            bytes,
            declared_size: None,
            bad_crc: false,
        }
    }

    pub fn declaring_size(self, size: u64) -> Self {
        Self {
            declared_size: Some(size),
            ..self
        }
    }

    pub fn with_bad_crc(self) -> Self {
        Self {
            bad_crc: true,
            ..self
        }
    }
}

const ZIP64_SIZE_MARKER: u32 = 0xFFFF_FFFF;
const ZIP64_EXTRA_ID: u16 = 0x0001;
// 1980-01-01, the earliest date MS-DOS timestamps can hold.
const DOS_DATE: u16 = (1 << 5) | 1;

struct EntryHeader {
    crc: u32,
    size: u32,
    extra: Vec<u8>,
}

impl EntryHeader {
    fn new(entry: &StoredEntry) -> Self {
        let mut crc = crc32fast::hash(entry.bytes);
        if entry.bad_crc {
            crc ^= 0xDEAD_BEEF;
        }
        match entry.declared_size {
            None => Self {
                crc,
                size: entry.bytes.len() as u32,
                extra: Vec::new(),
            },
            Some(declared) => {
                // ZIP64 extended information: uncompressed then compressed size.
                let mut extra = Vec::new();
                extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID).unwrap();
                extra.write_u16::<LittleEndian>(16).unwrap();
                extra.write_u64::<LittleEndian>(declared).unwrap();
                extra.write_u64::<LittleEndian>(entry.bytes.len() as u64).unwrap();
                Self {
                    crc,
                    size: ZIP64_SIZE_MARKER,
                    extra,
                }
            }
        }
    }

    fn write_common(&self, out: &mut Vec<u8>, name: &str) {
        out.write_u16::<LittleEndian>(45).unwrap(); // version needed
        out.write_u16::<LittleEndian>(0).unwrap(); // flags
        out.write_u16::<LittleEndian>(0).unwrap(); // stored
        out.write_u16::<LittleEndian>(0).unwrap(); // time
        out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
        out.write_u32::<LittleEndian>(self.crc).unwrap();
        out.write_u32::<LittleEndian>(self.size).unwrap(); // compressed
        out.write_u32::<LittleEndian>(self.size).unwrap(); // uncompressed
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.extra.len() as u16).unwrap();
    }
}

/// Builds an archive of uncompressed entries byte by byte.
pub fn stored_zip_archive(entries: &[StoredEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let header = EntryHeader::new(entry);
        let offset = out.len() as u32;

        out.write_u32::<LittleEndian>(0x0403_4b50).unwrap();
        header.write_common(&mut out, entry.name);
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&header.extra);
        out.extend_from_slice(entry.bytes);

        central.write_u32::<LittleEndian>(0x0201_4b50).unwrap();
        central.write_u16::<LittleEndian>(45).unwrap(); // version made by
        header.write_common(&mut central, entry.name);
        central.write_u16::<LittleEndian>(0).unwrap(); // comment length
        central.write_u16::<LittleEndian>(0).unwrap(); // disk number
        central.write_u16::<LittleEndian>(0).unwrap(); // internal attributes
        central.write_u32::<LittleEndian>(0).unwrap(); // external attributes
        central.write_u32::<LittleEndian>(offset).unwrap();
        central.extend_from_slice(entry.name.as_bytes());
        central.extend_from_slice(&header.extra);
    }

    let central_offset = out.len() as u32;
    out.extend_from_slice(&central);

    out.write_u32::<LittleEndian>(0x0605_4b50).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap(); // this disk
    out.write_u16::<LittleEndian>(0).unwrap(); // central directory disk
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(central_offset).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap(); // comment length
    out
}
