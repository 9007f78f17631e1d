/// Result of pushing a single image through the pipeline. Skips are
/// recoverable per-image conditions; hard failures stay errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Processed,
    SkippedNoFace,
    SkippedMultipleFaces { count: usize },
    SkippedRedetectFailed { count: usize },
    SkippedEmptyCrop,
}

/// Tally of a full dataset run, reported once at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub skipped_no_face: usize,
    pub skipped_multiple_faces: usize,
    pub skipped_redetect_failed: usize,
    pub skipped_empty_crop: usize,
    pub skipped_subjects: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &ImageOutcome) {
        match outcome {
            ImageOutcome::Processed => self.processed += 1,
            ImageOutcome::SkippedNoFace => self.skipped_no_face += 1,
            ImageOutcome::SkippedMultipleFaces { .. } => self.skipped_multiple_faces += 1,
            ImageOutcome::SkippedRedetectFailed { .. } => self.skipped_redetect_failed += 1,
            ImageOutcome::SkippedEmptyCrop => self.skipped_empty_crop += 1,
        }
    }

    pub fn total_skipped_images(&self) -> usize {
        self.skipped_no_face
            + self.skipped_multiple_faces
            + self.skipped_redetect_failed
            + self.skipped_empty_crop
    }

    pub fn summary(&self) -> String {
        format!(
            "{} processed, {} skipped ({} no face, {} multiple faces, \
             {} re-detection failed, {} empty crop), {} subject directories skipped",
            self.processed,
            self.total_skipped_images(),
            self.skipped_no_face,
            self.skipped_multiple_faces,
            self.skipped_redetect_failed,
            self.skipped_empty_crop,
            self.skipped_subjects,
        )
    }
}

// ─────────────────────────────── Tests ───────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tallies_each_outcome() {
        let mut report = RunReport::new();
        report.record(&ImageOutcome::Processed);
        report.record(&ImageOutcome::Processed);
        report.record(&ImageOutcome::SkippedNoFace);
        report.record(&ImageOutcome::SkippedMultipleFaces { count: 3 });
        report.record(&ImageOutcome::SkippedRedetectFailed { count: 0 });
        report.record(&ImageOutcome::SkippedEmptyCrop);

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped_no_face, 1);
        assert_eq!(report.skipped_multiple_faces, 1);
        assert_eq!(report.skipped_redetect_failed, 1);
        assert_eq!(report.skipped_empty_crop, 1);
        assert_eq!(report.total_skipped_images(), 4);
    }

    #[test]
    fn test_summary_mentions_every_bucket() {
        let mut report = RunReport::new();
        report.record(&ImageOutcome::Processed);
        report.skipped_subjects = 1;

        let summary = report.summary();
        assert!(summary.contains("1 processed"));
        assert!(summary.contains("0 skipped"));
        assert!(summary.contains("1 subject directories skipped"));
    }
}
