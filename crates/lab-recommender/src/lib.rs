pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod model;
pub mod parser;
pub mod rate_limit;
pub mod ranker;
pub mod server;
pub mod service;
pub mod similarity;
