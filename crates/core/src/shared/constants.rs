/// File name of the SeetaFace frontal detection model.
pub const SEETA_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";

/// Download location for the SeetaFace model (rustface repository).
pub const SEETA_MODEL_URL: &str =
    "https://raw.githubusercontent.com/atomashpolskiy/rustface/master/model/seeta_fd_frontal_v1.0.bin";

// Stage window titles shown when stage display is enabled. These names
// are part of the observable CLI surface, so they stay fixed.
pub const STAGE_LOADED: &str = "Zero stage";
pub const STAGE_CHIP: &str = "First stage";
pub const STAGE_OUTLINE: &str = "Second stage";
pub const STAGE_RESIZED: &str = "Third stage";
pub const STAGE_GRAY: &str = "Fourth stage";

/// RGB color of the crop-rectangle outline drawn onto the chip.
pub const CROP_OUTLINE_COLOR: [u8; 3] = [0, 255, 255];

/// Quality used for the lossy grayscale output images.
pub const JPEG_QUALITY: u8 = 75;
