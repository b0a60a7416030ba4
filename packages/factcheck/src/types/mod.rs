pub mod answer;
pub mod claim;
pub mod config;
pub mod document;
pub mod record;
pub mod statement;
