use rust_decimal::Decimal;
use thiserror::Error;

/// Fatal parse failures. The parser either returns a complete preview or
/// one of these; it never returns a partial result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("price list document is unreadable: {0}")]
    Unreadable(String),
    #[error("price list document contains no text pages")]
    EmptyDocument,
    #[error("price list document exceeds the maximum accepted size of {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("discount percent {0} is outside the 0-100 range")]
    DiscountOutOfRange(Decimal),
    #[error("exchange rate must be positive, got {0}")]
    NonPositiveRate(Decimal),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{DomainError, ParseError};

    #[test]
    fn parse_error_messages_identify_the_document_problem() {
        assert_eq!(
            ParseError::Unreadable("bad xref table".to_string()).to_string(),
            "price list document is unreadable: bad xref table"
        );
        assert!(ParseError::TooLarge { limit: 1024 }.to_string().contains("1024"));
    }

    #[test]
    fn domain_error_reports_offending_value() {
        let error = DomainError::DiscountOutOfRange(Decimal::new(1500, 1));
        assert!(error.to_string().contains("150.0"));
    }
}
