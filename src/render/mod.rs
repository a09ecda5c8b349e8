//! Poster composition: turning a layout plan into an encoded image.

pub mod compose;

/// A finished poster: encoded PNG bytes plus a suggested file name.
#[derive(Debug, Clone)]
pub struct Poster {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
    pub file_name: String,
}
