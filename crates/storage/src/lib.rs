#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    DocumentRepository, InMemoryRepository, ProgressRepository, ResultRepository, Storage,
    StorageError,
};
