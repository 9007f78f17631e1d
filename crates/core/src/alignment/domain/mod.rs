pub mod chip_extractor;
