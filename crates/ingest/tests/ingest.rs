use dentscan::{
    ingest, DecodeError, IngestError, IngestionErrorKind, MeshData, MeshDecoder, Pipeline,
    SceneBundle,
};
use dentscan_mesh::TriangleMesh;
use dentscan_test_data::{
    jpeg_stub, stl_cube, stl_empty, stl_upper_arch, stored_zip_archive, zip_archive, StoredEntry,
};

fn names(bundle: &SceneBundle) -> Vec<&str> {
    bundle.pairs().iter().map(|p| p.base_name.as_str()).collect()
}

#[test]
fn matched_pair() {
    let upper = stl_upper_arch();
    let lower = stl_cube();
    let bytes = zip_archive(&[("case7_u.stl", &upper.bytes), ("case7_l.stl", &lower.bytes)]);

    let bundle = ingest(&bytes).unwrap();
    assert!(bundle.is_complete());
    assert_eq!(vec!["case7"], names(&bundle));

    let pair = &bundle.pairs()[0];
    assert_eq!("case7_u.stl", pair.upper_name);
    assert_eq!("case7_l.stl", pair.lower_name);
    assert_eq!(upper.triangles, pair.upper.triangle_count());
    assert_eq!(lower.vertices, pair.lower.vertex_count());
    assert_eq!(upper.model_height, pair.upper.bounds().unwrap().size().z);
}

#[test]
fn mixed_archive() {
    let cube = stl_cube();
    let jpeg = jpeg_stub();
    let bytes = zip_archive(&[
        ("A_u.stl", &cube.bytes),
        ("A_l.stl", &cube.bytes),
        ("B_u.stl", &cube.bytes),
        ("front.jpg", &jpeg),
        ("left.jpg", &jpeg),
    ]);

    let bundle = ingest(&bytes).unwrap();
    assert_eq!(vec!["A"], names(&bundle));

    assert_eq!(1, bundle.errors().len());
    let error = &bundle.errors()[0];
    assert_eq!(IngestionErrorKind::UnmatchedUpper, error.kind);
    assert_eq!(vec!["B_u.stl"], error.files);

    let images: Vec<_> = bundle.images().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(vec!["front.jpg", "left.jpg"], images);
    assert_eq!(jpeg, bundle.images()[0].bytes);
}

#[test]
fn empty_upper_is_invalid_format() {
    let bytes = zip_archive(&[
        ("P_u.stl", &stl_empty().bytes),
        ("P_l.stl", &stl_cube().bytes),
    ]);

    let bundle = ingest(&bytes).unwrap();
    assert!(bundle.pairs().is_empty());
    assert_eq!(1, bundle.errors().len());
    assert_eq!(IngestionErrorKind::InvalidMeshFormat, bundle.errors()[0].kind);
    assert_eq!(vec!["P_u.stl"], bundle.errors()[0].files);
}

#[test]
fn each_broken_side_is_reported() {
    let cube = stl_cube();
    let bytes = zip_archive(&[
        ("X_u.stl", b"not a mesh"),
        ("X_l.stl", &stl_empty().bytes),
        ("Y_u.stl", &cube.bytes),
        ("Y_l.stl", &cube.bytes),
    ]);

    let bundle = ingest(&bytes).unwrap();
    assert_eq!(vec!["Y"], names(&bundle));

    let kinds: Vec<_> = bundle.errors().iter().map(|e| e.kind).collect();
    assert_eq!(
        vec![
            IngestionErrorKind::DecodeFailure,
            IngestionErrorKind::InvalidMeshFormat
        ],
        kinds
    );
    assert_eq!(vec!["X_u.stl"], bundle.errors()[0].files);
    assert_eq!(vec!["X_l.stl"], bundle.errors()[1].files);
}

#[test]
fn no_mesh_files_is_a_hard_stop() {
    let bytes = zip_archive(&[("front.jpg", &jpeg_stub()), ("notes.txt", b"hi")]);
    assert!(matches!(ingest(&bytes), Err(IngestError::NoMeshFilesFound)));
}

#[test]
fn non_archive_is_a_hard_stop() {
    assert!(matches!(
        ingest(&stl_cube().bytes),
        Err(IngestError::InvalidArchive(_))
    ));
    assert!(matches!(ingest(b""), Err(IngestError::InvalidArchive(_))));
}

#[test]
fn repeated_ingestion_is_identical() {
    let cube = stl_cube();
    let upper = stl_upper_arch();
    let bytes = zip_archive(&[
        ("zz_l.stl", &cube.bytes),
        ("B_u.stl", &upper.bytes),
        ("old_B_l.stl", &cube.bytes),
        ("B_l.stl", &upper.bytes),
        ("zz_u.stl", &upper.bytes),
        ("right side.JPG", &jpeg_stub()),
    ]);

    let first = ingest(&bytes).unwrap();
    assert_eq!(vec!["B", "zz"], names(&first));
    // The first listed lower candidate wins, even though it carries a prefix.
    assert_eq!("old_B_l.stl", first.pairs()[0].lower_name);

    for _ in 0..3 {
        assert_eq!(first, ingest(&bytes).unwrap());
    }
}

/// Refuses every mesh, so ingestion has to carry on without any pairs.
struct RejectAll;

impl MeshDecoder for RejectAll {
    fn decode(&self, name: &str, _bytes: &[u8]) -> Result<MeshData, DecodeError> {
        Err(DecodeError::Failure {
            name: name.to_string(),
            reason: "unsupported".to_string(),
        })
    }
}

#[test]
fn custom_decoder_failures_are_collected() {
    let cube = stl_cube();
    let bytes = zip_archive(&[
        ("a_u.stl", &cube.bytes),
        ("a_l.stl", &cube.bytes),
        ("front.jpg", &jpeg_stub()),
    ]);

    let bundle = Pipeline::new(RejectAll).ingest(&bytes).unwrap();
    assert!(bundle.pairs().is_empty());
    assert_eq!(1, bundle.images().len());
    assert_eq!(2, bundle.errors().len());
    assert!(bundle
        .errors()
        .iter()
        .all(|e| e.kind == IngestionErrorKind::DecodeFailure && e.message.contains("unsupported")));
}

#[test]
fn oversized_declared_entry_does_not_abort() {
    let cube = stl_cube();
    let bytes = stored_zip_archive(&[
        StoredEntry::new("A_u.stl", &cube.bytes).declaring_size(1 << 62),
        StoredEntry::new("A_l.stl", &cube.bytes),
    ]);

    let bundle = ingest(&bytes).unwrap();
    // Reading either succeeds with the real content or is reported against the entry.
    if bundle.pairs().is_empty() {
        assert_eq!(1, bundle.errors().len());
        assert_eq!(IngestionErrorKind::DecodeFailure, bundle.errors()[0].kind);
        assert_eq!(vec!["A_u.stl"], bundle.errors()[0].files);
    } else {
        assert!(bundle.is_complete());
        assert_eq!(cube.triangles, bundle.pairs()[0].upper.triangle_count());
    }
}

#[test]
fn corrupt_entries_are_decode_failures() {
    let cube = stl_cube();
    let jpeg = jpeg_stub();
    let bytes = stored_zip_archive(&[
        StoredEntry::new("A_u.stl", &cube.bytes),
        StoredEntry::new("A_l.stl", &cube.bytes).with_bad_crc(),
        StoredEntry::new("B_u.stl", &cube.bytes),
        StoredEntry::new("B_l.stl", &cube.bytes),
        StoredEntry::new("front.jpg", &jpeg).with_bad_crc(),
        StoredEntry::new("left.jpg", &jpeg),
    ]);

    let bundle = ingest(&bytes).unwrap();
    assert_eq!(vec!["B"], names(&bundle));

    let images: Vec<_> = bundle.images().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(vec!["left.jpg"], images);

    assert_eq!(2, bundle.errors().len());
    for (error, file) in bundle.errors().iter().zip(["A_l.stl", "front.jpg"]) {
        assert_eq!(IngestionErrorKind::DecodeFailure, error.kind);
        assert_eq!(vec![file], error.files);
    }
}

#[test]
fn shared_lower_failure_is_reported_once() {
    let cube = stl_cube();
    let bytes = zip_archive(&[
        ("AA_l.stl", b"not a mesh"),
        ("A_u.stl", &cube.bytes),
        ("AA_u.stl", &cube.bytes),
    ]);

    let bundle = ingest(&bytes).unwrap();
    assert!(bundle.pairs().is_empty());
    assert_eq!(1, bundle.errors().len());
    assert_eq!(IngestionErrorKind::DecodeFailure, bundle.errors()[0].kind);
    assert_eq!(vec!["AA_l.stl"], bundle.errors()[0].files);
}

#[test]
fn shared_lower_is_owned_by_each_pair() {
    let cube = stl_cube();
    let bytes = zip_archive(&[
        ("AA_l.stl", &cube.bytes),
        ("A_u.stl", &cube.bytes),
        ("AA_u.stl", &cube.bytes),
    ]);

    let bundle = ingest(&bytes).unwrap();
    assert_eq!(vec!["A", "AA"], names(&bundle));
    assert_eq!(bundle.pairs()[0].lower, bundle.pairs()[1].lower);
}
