use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context};

use crate::args;

/// Extensions recognised in a segmentation results directory.
const RESULT_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Maps an archive entry name onto a path below the output directory.
///
/// Directories are kept so that photos with the same file name in different folders do not
/// overwrite each other. Root, `.` and `..` components are dropped.
fn relative_output_path(name: &str) -> Option<PathBuf> {
    let path: PathBuf = Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    (!path.as_os_str().is_empty()).then_some(path)
}

pub fn images_command(args: args::ImagesArgs) -> anyhow::Result<()> {
    let bytes = crate::read_archive(&args.archive)?;
    let (_, images, errors) = dentscan::ingest(&bytes)?.into_parts();

    let mut written = HashSet::new();
    for image in images {
        let relative = relative_output_path(&image.name)
            .with_context(|| format!("'{}' has no file name", image.name))?;
        if !written.insert(relative.clone()) {
            bail!(
                "'{}' would overwrite {} extracted earlier",
                image.name,
                relative.display()
            );
        }

        let path = args.output.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, image.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    for e in errors {
        log::warn!("{e}");
    }
    Ok(())
}

fn result_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        let is_image = path.is_file()
            && path.extension().is_some_and(|ext| {
                RESULT_IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if is_image {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

pub fn results_command(args: args::ResultsArgs) -> anyhow::Result<()> {
    let images = result_images(&args.dir)?;
    if images.is_empty() {
        println!("No segmentation results to display.");
    }
    for path in images {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_images() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.gif"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<_> = result_images(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(vec!["a.jpg", "b.PNG", "c.gif"], names);
    }

    #[test]
    fn output_paths_stay_below_the_output_dir() {
        assert_eq!(
            Some(PathBuf::from("a/front.jpg")),
            relative_output_path("a/front.jpg")
        );
        assert_eq!(
            Some(PathBuf::from("evil/left.jpg")),
            relative_output_path("/../evil/./left.jpg")
        );
        assert_eq!(None, relative_output_path("../"));
    }

    #[test]
    fn same_file_name_in_different_folders() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("case.zip");
        let output = dir.path().join("photos");
        std::fs::write(
            &archive,
            dentscan_test_data::zip_archive(&[
                ("a_u.stl", &dentscan_test_data::stl_cube().bytes),
                ("a/front.jpg", b"first"),
                ("b/front.jpg", b"second"),
            ]),
        )
        .unwrap();

        images_command(args::ImagesArgs {
            archive,
            output: output.clone(),
        })
        .unwrap();

        assert_eq!(b"first".to_vec(), std::fs::read(output.join("a/front.jpg")).unwrap());
        assert_eq!(b"second".to_vec(), std::fs::read(output.join("b/front.jpg")).unwrap());
    }

    #[test]
    fn colliding_photos_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("case.zip");
        std::fs::write(
            &archive,
            dentscan_test_data::zip_archive(&[
                ("a_u.stl", &dentscan_test_data::stl_cube().bytes),
                ("a/front.jpg", b"first"),
                ("./a/front.jpg", b"second"),
            ]),
        )
        .unwrap();

        let result = images_command(args::ImagesArgs {
            archive,
            output: dir.path().join("photos"),
        });
        assert!(result.is_err());
    }

    #[test]
    fn extracts_photographs() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("case.zip");
        let output = dir.path().join("photos");
        std::fs::write(
            &archive,
            dentscan_test_data::zip_archive(&[
                ("a_u.stl", &dentscan_test_data::stl_cube().bytes),
                ("photos/Front.jpg", b"front"),
                ("occlusal.jpg", b"skipped"),
            ]),
        )
        .unwrap();

        images_command(args::ImagesArgs {
            archive,
            output: output.clone(),
        })
        .unwrap();

        assert_eq!(
            b"front".to_vec(),
            std::fs::read(output.join("photos/Front.jpg")).unwrap()
        );
        assert!(!output.join("occlusal.jpg").exists());
    }
}
