pub mod content;
pub mod pagination;

pub use content::ContentService;
