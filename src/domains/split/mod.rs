pub mod pages;

pub use pages::extract_pages;
