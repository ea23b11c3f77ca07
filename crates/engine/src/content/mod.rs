mod atomic_io;
mod images;
mod loader;

pub use atomic_io::write_text_atomic;
pub use images::ImageStore;
pub use loader::{
    load_json_document, load_json_document_or_default, parse_json_document, ContentErrorCode,
    ContentLoadError,
};
