use crate::errors::ApiError;

/// Longest bookmark content accepted, counted in Unicode scalar values
/// (`char`s), so an emoji outside the BMP counts once.
pub const MAX_CONTENT_LENGTH: usize = 140;

/// validate_bookmark_content
///
/// Rejects content that is blank after trimming (400) or longer than
/// `MAX_CONTENT_LENGTH` characters (413).
pub fn validate_bookmark_content(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Bookmark content must be at least one character long.".to_string(),
        ));
    }

    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ApiError::PayloadTooLarge(format!(
            "Bookmark content must be no more than {} characters.",
            MAX_CONTENT_LENGTH
        )));
    }

    Ok(())
}

/// validate_author_filter
///
/// The `author` query parameter, when present, must name someone.
pub fn validate_author_filter(author: &str) -> Result<(), ApiError> {
    if author.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Provided author username must be nonempty.".to_string(),
        ));
    }
    Ok(())
}
