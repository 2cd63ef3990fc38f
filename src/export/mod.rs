// Serialization of the item store into external annotation archives

mod archive;
pub mod xml;

pub use archive::{entry_name, write_archive, ExportError, ExportSummary};
pub use xml::{write_package_document, RenderOptions};
