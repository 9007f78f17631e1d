//! Batch normalization of labeled face-image datasets.
//!
//! Walks a directory tree of subject directories, detects and aligns a
//! single face per image, re-crops it to a landmark-bounded sub-region,
//! and writes a grayscale chip of canonical size to a mirrored output
//! tree. Face location, landmark prediction, and chip extraction are
//! domain traits so the geometric core can be exercised without any
//! real detector.

pub mod alignment;
pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod shared;
