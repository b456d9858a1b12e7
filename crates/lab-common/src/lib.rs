pub mod api;
pub mod error;
pub mod extraction;
pub mod openai;
pub mod redis;
