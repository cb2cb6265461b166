// Declare submodules for the document domain
pub mod repository;
pub mod service;
pub mod types;

// Re-export key types
pub use types::{
    mime_for_filename, FileRecord, NewFileRecord, Operation, ProcessOutcome, StoredFile,
};

pub use repository::{FileRecordRepository, SqliteFileRecordRepository};
pub use service::{DocumentService, DocumentServiceImpl};
