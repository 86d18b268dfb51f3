pub mod document;
pub mod outline;
#[cfg(test)]
pub mod test_helpers;

pub use document::PdfDocument;
