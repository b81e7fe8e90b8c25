pub mod analyzers;
pub mod config;
pub mod error;
pub mod handler;
pub mod output;
pub mod stats;
pub mod store;
pub mod summarizer;
pub mod table;
