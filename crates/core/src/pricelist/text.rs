//! PDF text extraction. Everything downstream works on per-page plain
//! text, so layout parsing stays testable without a document in front of
//! it.

use crate::errors::ParseError;

/// Extract per-page text from raw PDF bytes. Fails fast on malformed
/// documents instead of returning a partial preview.
pub fn extract_pages(document: &[u8]) -> Result<Vec<String>, ParseError> {
    if document.is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(document)
        .map_err(|error| ParseError::Unreadable(error.to_string()))?;

    if pages.iter().all(|page| page.trim().is_empty()) {
        return Err(ParseError::EmptyDocument);
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use crate::errors::ParseError;

    use super::extract_pages;

    #[test]
    fn empty_input_is_rejected_before_extraction() {
        assert_eq!(extract_pages(&[]), Err(ParseError::EmptyDocument));
    }

    #[test]
    fn garbage_bytes_fail_fast_as_unreadable() {
        let result = extract_pages(b"definitely not a pdf document");
        assert!(matches!(result, Err(ParseError::Unreadable(_))));
    }
}
