pub mod analyzers;
pub mod config;
pub mod dates;
pub mod error;
pub mod output;
pub mod parser;
pub mod store;
