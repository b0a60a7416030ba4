pub mod ai;
pub mod embedder;
pub mod searcher;
