pub mod renderer;
pub mod upload_storage;

pub use renderer::PageRenderer;
pub use upload_storage::UploadStorage;
