//! Checks on an uploaded curriculum file before anything is sent to the AI service.

const ACCEPTED_MIME_TYPES: [&str; 2] = ["text/plain", "text/markdown"];
const ACCEPTED_EXTENSIONS: [&str; 2] = [".txt", ".md"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please send a text file (.txt) or a markdown file (.md).")]
    UnsupportedType,
    #[error("The file is empty.")]
    Empty,
    #[error("The file could not be read as UTF-8 text.")]
    Unreadable,
    #[error("The file is too large: {size} bytes, the limit is {max} bytes.")]
    TooLarge { size: u32, max: u32 },
}

/// Validates the file metadata, so nothing is downloaded for files we would reject anyway.
pub fn check_document(
    file_name: Option<&str>,
    mime_type: Option<&str>,
    size: u32,
    max_bytes: u32,
) -> Result<(), ValidationError> {
    let mime_ok = mime_type.map_or(false, |mime| ACCEPTED_MIME_TYPES.contains(&mime));
    let extension_ok = file_name.map_or(false, |name| {
        let name = name.to_lowercase();
        ACCEPTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    });

    if !mime_ok && !extension_ok {
        return Err(ValidationError::UnsupportedType);
    }
    if size == 0 {
        return Err(ValidationError::Empty);
    }
    if size > max_bytes {
        return Err(ValidationError::TooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

pub fn decode_document(bytes: Vec<u8>) -> Result<String, ValidationError> {
    let text = String::from_utf8(bytes).map_err(|_| ValidationError::Unreadable)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    if text.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(text.to_string())
}
