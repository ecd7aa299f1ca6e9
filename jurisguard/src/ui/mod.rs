// jurisguard/src/ui/mod.rs
//! Terminal output helpers: status messages and result summaries.

pub mod output_format;
pub mod summary;
