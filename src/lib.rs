pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod model;
pub mod parser;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod table;
pub mod writer;
