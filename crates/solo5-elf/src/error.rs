//! Image error types.

/// Errors that can occur while reading notes out of an executable image.
///
/// A note that is simply not present is not an error; see
/// [`find_note`](crate::find_note).
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The file does not start with the ELF magic bytes.
    #[error("not an ELF image")]
    NotElf,

    /// ELF variant this reader does not handle.
    #[error("unsupported ELF image: {detail}")]
    Unsupported { detail: String },

    /// A header, table or segment extends past the end of the image.
    #[error("truncated ELF image: {what} out of bounds")]
    Truncated { what: &'static str },

    /// A note header inside a `PT_NOTE` segment is inconsistent.
    #[error("malformed note at segment offset {offset}: {detail}")]
    MalformedNote { offset: usize, detail: String },

    /// The requested note is present but larger than the caller allows.
    #[error("note type {note_type:#x} is {size} bytes, maximum {max}")]
    NoteTooLarge {
        note_type: u32,
        size: usize,
        max: usize,
    },
}

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;
