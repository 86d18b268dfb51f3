pub mod format;
pub mod parse;

pub use format::{
    render_bookmarks, write_bookmarks_file, BookmarkEntry, BookmarkStyle, PageMap,
    FRONT_MATTER_PAGES,
};
pub use parse::{parse_bookmarks, read_bookmarks, BookmarkFile};
