pub mod image_file_reader;
pub mod jpeg_image_writer;
pub mod window_stage_viewer;
