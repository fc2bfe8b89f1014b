// Resume upload, extraction, analysis and owner-scoped persistence.

pub mod analysis;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod repository;
pub mod upload;
