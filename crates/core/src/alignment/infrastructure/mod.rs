pub mod similarity_chip_extractor;
