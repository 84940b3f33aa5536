pub mod extractor;
pub mod red_flags;
pub mod statistics;
