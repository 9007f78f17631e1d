use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::pipeline::outcome::RunReport;
use crate::pipeline::process_image_use_case::ImageProcessor;

/// Walks a dataset laid out as one directory per subject and pushes
/// every file through the image processor. Subject and file order is
/// lexicographic so runs over the same tree are reproducible.
pub struct ProcessDatasetUseCase {
    processor: Box<dyn ImageProcessor>,
}

impl ProcessDatasetUseCase {
    pub fn new(processor: Box<dyn ImageProcessor>) -> Self {
        Self { processor }
    }

    pub fn execute(
        &mut self,
        input_root: &Path,
        output_root: &Path,
    ) -> Result<RunReport, Box<dyn std::error::Error>> {
        let mut report = RunReport::new();
        let mut canonical_size: Option<(u32, u32)> = None;

        for subject_dir in sorted_entries(input_root, |e| e.is_dir())? {
            let subject = match subject_dir.file_name() {
                Some(name) => name.to_owned(),
                None => continue,
            };
            let output_dir = output_root.join(&subject);

            // The subject directory must exist before any of its images
            // are written; failure skips the whole subject.
            if !output_dir.is_dir() {
                if let Err(err) = fs::create_dir(&output_dir) {
                    warn!(
                        "Failed to create {}: {}, skipping subject",
                        output_dir.display(),
                        err
                    );
                    report.skipped_subjects += 1;
                    continue;
                }
            }

            let images = sorted_entries(&subject_dir, |e| e.is_file())?;
            info!(
                "Subject {}: {} images",
                subject.to_string_lossy(),
                images.len()
            );
            for image_path in images {
                let file_name = match image_path.file_name() {
                    Some(name) => name.to_owned(),
                    None => continue,
                };
                info!("Processing {}", image_path.display());
                let output_path = output_dir.join(&file_name);
                let outcome =
                    self.processor
                        .process(&image_path, &output_path, &mut canonical_size)?;
                report.record(&outcome);
            }
        }

        Ok(report)
    }
}

fn sorted_entries(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| keep(path))
        .collect();
    entries.sort();
    Ok(entries)
}

// ─────────────────────────────── Tests ───────────────────────────────
