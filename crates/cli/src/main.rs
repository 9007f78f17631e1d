use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use faceprep_core::alignment::domain::chip_extractor::{ChipExtractor, ChipParams};
use faceprep_core::alignment::infrastructure::similarity_chip_extractor::SimilarityChipExtractor;
use faceprep_core::detection::domain::face_locator::FaceLocator;
use faceprep_core::detection::domain::landmark_predictor::LandmarkPredictor;
use faceprep_core::detection::infrastructure::ert_predictor::ErtPredictor;
use faceprep_core::detection::infrastructure::model_resolver;
use faceprep_core::detection::infrastructure::seeta_face_locator::SeetaFaceLocator;
use faceprep_core::imaging::domain::image_reader::ImageReader;
use faceprep_core::imaging::domain::image_writer::ImageWriter;
use faceprep_core::imaging::domain::stage_viewer::{NullStageViewer, StageViewer};
use faceprep_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use faceprep_core::imaging::infrastructure::jpeg_image_writer::JpegImageWriter;
use faceprep_core::imaging::infrastructure::window_stage_viewer::WindowStageViewer;
use faceprep_core::pipeline::process_dataset_use_case::ProcessDatasetUseCase;
use faceprep_core::pipeline::process_image_use_case::ProcessImageUseCase;
use faceprep_core::shared::constants::{SEETA_MODEL_NAME, SEETA_MODEL_URL};

/// Batch face alignment and cropping for labelled image datasets.
#[derive(Parser)]
#[command(name = "faceprep")]
struct Cli {
    /// Landmark predictor model (.dat, .dat.bz2 or .bin).
    predictor_model: PathBuf,

    /// Input root: one directory per subject, images inside.
    input_root: PathBuf,

    /// Output root (must already exist); mirrors the input layout.
    output_root: PathBuf,

    /// Aligned chip edge length in pixels.
    chip_size: u32,

    /// Aligned chip padding (0.0 = tight crop).
    chip_padding: f64,

    /// Show each processing stage in a window (0 = off).
    show_stages: i32,

    /// Draw the crop rectangle on the displayed chip (0 = off).
    draw_rect: i32,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => -1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(-1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let output_root = validate(&cli)?;
    log::info!("Saving processed images to {}", output_root.display());

    let reader: Box<dyn ImageReader> = Box::new(ImageFileReader::new());
    let writer: Box<dyn ImageWriter> = Box::new(JpegImageWriter::new());
    let locator = build_locator()?;
    let predictor: Box<dyn LandmarkPredictor> =
        Box::new(ErtPredictor::from_file(&cli.predictor_model)?);
    let chip_extractor: Box<dyn ChipExtractor> = Box::new(SimilarityChipExtractor::new());
    let viewer: Box<dyn StageViewer> = if cli.show_stages != 0 {
        Box::new(WindowStageViewer::new())
    } else {
        Box::new(NullStageViewer::new())
    };

    let processor = ProcessImageUseCase::new(
        reader,
        writer,
        locator,
        predictor,
        chip_extractor,
        viewer,
        ChipParams {
            size: cli.chip_size,
            padding: cli.chip_padding,
        },
        cli.draw_rect != 0,
    );

    let mut use_case = ProcessDatasetUseCase::new(Box::new(processor));
    let report = use_case.execute(&cli.input_root, &output_root)?;
    log::info!("Done: {}", report.summary());
    Ok(())
}

fn validate(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if cli.chip_size == 0 {
        return Err("Chip size must be a positive integer".into());
    }
    if !cli.chip_padding.is_finite() || cli.chip_padding < 0.0 {
        return Err(format!(
            "Chip padding must be a finite non-negative number, got {}",
            cli.chip_padding
        )
        .into());
    }
    if !cli.input_root.is_dir() {
        return Err(format!("Input root is not a directory: {}", cli.input_root.display()).into());
    }
    let output_root = cli.output_root.canonicalize().map_err(|e| {
        format!(
            "Output root is not accessible: {}: {e}",
            cli.output_root.display()
        )
    })?;
    if !output_root.is_dir() {
        return Err(format!(
            "Output root is not a directory: {}",
            cli.output_root.display()
        )
        .into());
    }
    Ok(output_root)
}

fn build_locator() -> Result<Box<dyn FaceLocator>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {SEETA_MODEL_NAME}");
    let bundled = bundled_models_dir();
    let model_path = model_resolver::resolve(
        SEETA_MODEL_NAME,
        SEETA_MODEL_URL,
        bundled.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    eprintln!();
    Ok(Box::new(SeetaFaceLocator::from_file(&model_path)?))
}

/// `models/` directory shipped next to the executable, for installs
/// that bundle the detector model instead of downloading it.
fn bundled_models_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()?
        .parent()
        .map(|dir| dir.join("models"))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
