//! Debate history storage

mod json_repository;

pub use json_repository::JsonFileDebateRepository;
