pub mod actors;
pub mod engine;
pub mod models;
pub mod storage;
pub mod types;
pub mod workflows;
