use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Currencies a catalog price can be tagged with. Amounts are never
/// converted between them; totals are computed in whatever currency each
/// price carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Ars,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usd => f.write_str("USD"),
            Self::Ars => f.write_str("ARS"),
        }
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "ARS" => Ok(Self::Ars),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported currency `{other}` (expected USD|ARS)"
            ))),
        }
    }
}

/// A sellable unit of the catalog. Machines are never hard-deleted;
/// `active = false` retires them while preserving quotation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub model_name: String,
    pub product_title: String,
    pub category: String,
    /// `None` means "price unknown, consultar" and must be resolved
    /// before the machine can be quoted.
    pub price: Option<Decimal>,
    pub price_currency: Currency,
    pub description: String,
    pub specs: Vec<String>,
    pub active: bool,
    pub options: Vec<MachineOption>,
}

/// An add-on purchasable together with a machine. Shared globally and
/// linked many-to-many to machines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineOption {
    pub id: i64,
    pub name: String,
    pub price: Option<Decimal>,
    pub description: String,
    pub active: bool,
}

/// Write-side shape for creating or updating a machine by `code`.
/// The option list replaces the machine's linked option set; options are
/// resolved against the global set by exact name, creating missing ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineDraft {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub product_title: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub price_currency: Currency,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub options: Vec<OptionDraft>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionDraft {
    pub name: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub description: String,
}

impl MachineDraft {
    /// A draft is committable once it carries a non-blank code. A missing
    /// price is allowed; it stays `None` until an operator resolves it.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.code.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "machine draft `{}` has no code",
                self.name
            )));
        }
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                return Err(DomainError::InvariantViolation(format!(
                    "machine `{}` has a negative price",
                    self.code
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Currency, MachineDraft};

    fn draft(code: &str) -> MachineDraft {
        MachineDraft {
            code: code.to_string(),
            name: "Acoplado volcador".to_string(),
            model_name: String::new(),
            product_title: String::new(),
            category: String::new(),
            price: Some(Decimal::new(6_087, 0)),
            price_currency: Currency::Usd,
            description: String::new(),
            specs: vec![],
            options: vec![],
        }
    }

    #[test]
    fn currency_round_trips_through_display_and_parse() {
        assert_eq!("ARS".parse::<Currency>().expect("parse"), Currency::Ars);
        assert_eq!(Currency::Ars.to_string(), "ARS");
        assert_eq!("usd".parse::<Currency>().expect("parse"), Currency::Usd);
    }

    #[test]
    fn unknown_currency_is_rejected() {
        assert!("EUR".parse::<Currency>().is_err());
    }

    #[test]
    fn draft_without_code_fails_validation() {
        let mut invalid = draft("  ");
        invalid.name = "Tolva".to_string();
        let error = invalid.validate().expect_err("blank code");
        assert!(error.to_string().contains("Tolva"));
    }

    #[test]
    fn draft_with_unknown_price_is_valid() {
        let mut unknown_price = draft("AVA4000");
        unknown_price.price = None;
        assert!(unknown_price.validate().is_ok());
    }

    #[test]
    fn draft_with_negative_price_fails_validation() {
        let mut negative = draft("AVA4000");
        negative.price = Some(Decimal::new(-1, 0));
        assert!(negative.validate().is_err());
    }
}
