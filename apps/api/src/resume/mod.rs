// Résumé intake: document text source, heuristic field extraction, upload handler.

pub mod document;
pub mod extractor;
pub mod handlers;
pub mod models;
