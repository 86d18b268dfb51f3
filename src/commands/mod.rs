pub mod bookmark;
pub mod outline;
pub mod parse;
pub mod scan;
