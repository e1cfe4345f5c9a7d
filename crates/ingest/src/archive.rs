use std::io::{Cursor, Read};

use thiserror::Error;
use zip::{result::ZipError, ZipArchive};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("not a readable ZIP archive: {0}")]
    InvalidArchive(#[source] ZipError),

    #[error("archive has no entry named '{name}'")]
    EntryNotFound { name: String },

    #[error("failed to extract '{name}': {source}")]
    EntryUnreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read access to one in-memory ZIP archive.
///
/// A reader is meant to serve a single ingestion request. Nothing is cached between calls to
/// [`ArchiveReader::read_entry`]; each call decompresses the entry again.
pub struct ArchiveReader<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
    entries: Vec<String>,
}

impl<'a> ArchiveReader<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes)).map_err(ArchiveError::InvalidArchive)?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let file = zip.by_index_raw(i).map_err(ArchiveError::InvalidArchive)?;
            if !file.is_dir() {
                entries.push(file.name().to_string());
            }
        }
        log::debug!("archive lists {} file entries", entries.len());

        Ok(Self { zip, entries })
    }

    /// File entry names in the order of the archive's central directory.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let unreadable = |source: std::io::Error| ArchiveError::EntryUnreadable {
            name: name.to_string(),
            source,
        };

        let mut file = match self.zip.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(ArchiveError::EntryNotFound {
                    name: name.to_string(),
                })
            }
            Err(ZipError::Io(e)) => return Err(unreadable(e)),
            Err(e) => return Err(unreadable(std::io::Error::new(std::io::ErrorKind::InvalidData, e))),
        };

        // The declared size comes from the archive itself, so it is not used to pre-size.
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(unreadable)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentscan_test_data::{stored_zip_archive, zip_archive, StoredEntry};

    #[test]
    fn lists_files_in_order() {
        let bytes = zip_archive(&[
            ("case/", b""),
            ("case/b_u.stl", b"upper"),
            ("case/a_l.stl", b"lower"),
            ("front.jpg", b"jpeg"),
        ]);
        let mut archive = ArchiveReader::open(&bytes).unwrap();
        assert_eq!(
            vec!["case/b_u.stl", "case/a_l.stl", "front.jpg"],
            archive.entries()
        );
        assert_eq!(b"lower".to_vec(), archive.read_entry("case/a_l.stl").unwrap());
        // Entries can be read more than once.
        assert_eq!(b"lower".to_vec(), archive.read_entry("case/a_l.stl").unwrap());
    }

    #[test]
    fn missing_entry() {
        let bytes = zip_archive(&[("a_u.stl", b"upper")]);
        let mut archive = ArchiveReader::open(&bytes).unwrap();
        assert!(matches!(
            archive.read_entry("a_l.stl"),
            Err(ArchiveError::EntryNotFound { name }) if name == "a_l.stl"
        ));
    }

    #[test]
    fn checksum_mismatch_is_unreadable() {
        let bytes = stored_zip_archive(&[
            StoredEntry::new("good.jpg", b"fine"),
            StoredEntry::new("bad.jpg", b"flipped").with_bad_crc(),
        ]);
        let mut archive = ArchiveReader::open(&bytes).unwrap();
        assert_eq!(b"fine".to_vec(), archive.read_entry("good.jpg").unwrap());
        assert!(matches!(
            archive.read_entry("bad.jpg"),
            Err(ArchiveError::EntryUnreadable { name, .. }) if name == "bad.jpg"
        ));
    }

    #[test]
    fn rejects_non_zip() {
        assert!(matches!(
            ArchiveReader::open(b"solid cube\nendsolid cube\n"),
            Err(ArchiveError::InvalidArchive(_))
        ));
        assert!(matches!(
            ArchiveReader::open(&[]),
            Err(ArchiveError::InvalidArchive(_))
        ));
    }
}
