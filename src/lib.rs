//! Spreadsheet-to-HTML rendering with image links resolved through
//! normalized `category-name` keys.

pub mod config;
pub mod normalize;
pub mod table;
pub mod urlmap;
pub mod workbook;
