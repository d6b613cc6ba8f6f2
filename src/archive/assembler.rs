//! Deterministic ZIP assembly of transform results into the delivery
//! archive.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::manifest::{self, BUCKET_ORDER};
use crate::core::{Artifact, FolderBucket, Package, ProcessingSettings, TransformResult};
use crate::utils::{extension_of, PackagerError, PackagerResult};

const DEFLATE_LEVEL: i64 = 6;

/// Assembles all successful results into a single in-memory ZIP archive.
///
/// Entry order, naming and manifest text depend only on the results and
/// settings: running twice over the same inputs yields byte-identical
/// archives. Failed items contribute nothing.
pub fn assemble(
    results: &[TransformResult],
    settings: &ProcessingSettings,
) -> PackagerResult<Package> {
    let mut successes: Vec<&TransformResult> = results
        .iter()
        .filter(|r| !r.is_failed() && !r.artifacts.is_empty())
        .collect();
    successes.sort_by_key(|r| r.index);

    let present: Vec<FolderBucket> = {
        let seen: HashSet<FolderBucket> = successes
            .iter()
            .flat_map(|r| r.artifacts.iter().map(|a| a.bucket))
            .collect();
        BUCKET_ORDER.into_iter().filter(|b| seen.contains(b)).collect()
    };

    let project = &settings.project_name;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(DEFLATE_LEVEL));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut file_count = 0usize;
    let mut total_bytes = 0u64;

    let mut add = |writer: &mut ZipWriter<Cursor<Vec<u8>>>,
                   path: String,
                   bytes: &[u8]|
     -> PackagerResult<()> {
        writer
            .start_file(path, options.clone())
            .map_err(|e| PackagerError::archive(e.to_string()))?;
        writer.write_all(bytes)?;
        file_count += 1;
        total_bytes += bytes.len() as u64;
        Ok(())
    };

    let readme = manifest::build_readme(settings, &present);
    add(&mut writer, format!("{project}/README.txt"), readme.as_bytes())?;
    if present.contains(&FolderBucket::Raw) {
        add(
            &mut writer,
            format!("{project}/{}/README.txt", FolderBucket::Raw.relative_path()),
            manifest::raw_readme().as_bytes(),
        )?;
    }

    for bucket in present {
        for (position, result) in successes.iter().enumerate() {
            for artifact in result.artifacts.iter().filter(|a| a.bucket == bucket) {
                let name = delivery_name(artifact, project, position + 1);
                let path = format!("{project}/{}/{name}", bucket.relative_path());
                debug!("Archiving '{}' from '{}'", path, result.source_name);
                add(&mut writer, path, &artifact.bytes)?;
            }
        }
    }

    let cursor = writer
        .finish()
        .map_err(|e| PackagerError::archive(e.to_string()))?;
    let bytes = cursor.into_inner();
    info!(
        "Assembled archive: {} file(s), {} bytes uncompressed, {} bytes archived",
        file_count,
        total_bytes,
        bytes.len()
    );

    Ok(Package {
        bytes,
        file_count,
        total_bytes,
    })
}

/// Sequence-numbered delivery filename: `001-Project.jpg`. The sequence
/// number is shared by every variant of the same source photo.
fn delivery_name(artifact: &Artifact, project: &str, sequence: usize) -> String {
    match extension_of(&artifact.file_name) {
        Some(ext) => format!("{sequence:03}-{project}.{ext}"),
        None => format!("{sequence:03}-{project}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EncodingKind, Fingerprint};
    use bytes::Bytes;
    use std::time::Duration;
    use zip::ZipArchive;

    fn result(index: usize, name: &str, artifacts: Vec<Artifact>) -> TransformResult {
        TransformResult {
            index,
            source_name: name.to_string(),
            fingerprint: Fingerprint::new(name, 10),
            artifacts,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    fn artifact(bucket: FolderBucket, file_name: &str) -> Artifact {
        Artifact {
            bucket,
            file_name: file_name.to_string(),
            bytes: Bytes::from_static(b"payload"),
            encoding: EncodingKind::Jpeg,
        }
    }

    fn settings() -> ProcessingSettings {
        ProcessingSettings {
            project_name: "Shoot".into(),
            ..Default::default()
        }
    }

    fn entry_names(package: &Package) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(package.bytes.clone())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_sequence_naming_and_layout() {
        let results = vec![
            result(0, "b.jpg", vec![artifact(FolderBucket::OptimizedJpg, "b.jpg")]),
            result(1, "a.jpg", vec![artifact(FolderBucket::OptimizedJpg, "a.jpg")]),
        ];
        let package = assemble(&results, &settings()).unwrap();
        let names = entry_names(&package);
        assert_eq!(
            names,
            vec![
                "Shoot/README.txt",
                "Shoot/Optimized Files/Optimized JPGs/001-Shoot.jpg",
                "Shoot/Optimized Files/Optimized JPGs/002-Shoot.jpg",
            ]
        );
        assert_eq!(package.file_count, 3);
    }

    #[test]
    fn test_failed_items_contribute_nothing() {
        let mut failed = result(0, "bad.jpg", vec![]);
        failed.error = Some("undecodable".into());
        let results = vec![
            failed,
            result(1, "good.jpg", vec![artifact(FolderBucket::OptimizedJpg, "good.jpg")]),
        ];
        let package = assemble(&results, &settings()).unwrap();
        let names = entry_names(&package);
        // The surviving item takes sequence 001
        assert!(names.contains(&"Shoot/Optimized Files/Optimized JPGs/001-Shoot.jpg".into()));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_raw_folder_gets_its_readme() {
        let results = vec![result(
            0,
            "frame.cr2",
            vec![artifact(FolderBucket::Raw, "frame.cr2")],
        )];
        let package = assemble(&results, &settings()).unwrap();
        let names = entry_names(&package);
        assert!(names.contains(&"Shoot/RAW Files/README.txt".into()));
        assert!(names.contains(&"Shoot/RAW Files/001-Shoot.cr2".into()));
    }

    #[test]
    fn test_deterministic_bytes() {
        let results = vec![
            result(
                0,
                "a.jpg",
                vec![
                    artifact(FolderBucket::OptimizedJpg, "a.jpg"),
                    artifact(FolderBucket::CompressedWebp, "a.webp"),
                ],
            ),
            result(1, "b.jpg", vec![artifact(FolderBucket::OptimizedJpg, "b.jpg")]),
        ];
        let one = assemble(&results, &settings()).unwrap();
        let two = assemble(&results, &settings()).unwrap();
        assert_eq!(one.bytes, two.bytes);
    }

    #[test]
    fn test_variants_share_sequence_number() {
        let results = vec![result(
            0,
            "a.jpg",
            vec![
                artifact(FolderBucket::OptimizedJpg, "a.jpg"),
                artifact(FolderBucket::CompressedJpg, "a.jpg"),
            ],
        )];
        let package = assemble(&results, &settings()).unwrap();
        let names = entry_names(&package);
        assert!(names.contains(&"Shoot/Optimized Files/Optimized JPGs/001-Shoot.jpg".into()));
        assert!(names.contains(&"Shoot/Compressed Files/Compressed JPGs/001-Shoot.jpg".into()));
    }

    #[test]
    fn test_empty_results_still_produce_manifest_only_archive() {
        let package = assemble(&[], &settings()).unwrap();
        assert_eq!(entry_names(&package), vec!["Shoot/README.txt".to_string()]);
    }
}
