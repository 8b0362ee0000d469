use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bank in the interbank network. Monetary figures are in EUR billions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: Uuid,
    pub name: String,
    /// CET1 ratio in percent.
    #[serde(with = "rust_decimal::serde::float")]
    pub cet1_ratio: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_assets: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interbank_assets: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interbank_liabilities: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub capital_buffer: Decimal,
}

impl Bank {
    /// Interbank assets minus interbank liabilities.
    #[must_use]
    pub fn net_interbank_position(&self) -> Decimal {
        self.interbank_assets - self.interbank_liabilities
    }
}

/// Create/update body for a bank.
///
/// Every field is optional so the same type serves partial updates; creation
/// additionally requires the fields listed in [`BankInput::REQUIRED_ON_CREATE`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BankInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cet1_ratio: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_assets: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub interbank_assets: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub interbank_liabilities: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub capital_buffer: Option<Decimal>,
}

impl BankInput {
    pub const REQUIRED_ON_CREATE: [&'static str; 5] = [
        "name",
        "cet1_ratio",
        "total_assets",
        "interbank_assets",
        "interbank_liabilities",
    ];

    /// Validates a create request.
    ///
    /// # Errors
    /// Returns the first missing or out-of-range field.
    pub fn validate_for_create(&self) -> Result<(), ValidationError> {
        for field in Self::REQUIRED_ON_CREATE {
            let present = match field {
                "name" => self.name.as_ref().is_some_and(|n| !n.trim().is_empty()),
                "cet1_ratio" => self.cet1_ratio.is_some(),
                "total_assets" => self.total_assets.is_some(),
                "interbank_assets" => self.interbank_assets.is_some(),
                _ => self.interbank_liabilities.is_some(),
            };
            if !present {
                return Err(ValidationError::missing(field));
            }
        }
        self.validate_for_update()
    }

    /// Validates the fields that are present.
    ///
    /// # Errors
    /// Returns the first out-of-range field.
    pub fn validate_for_update(&self) -> Result<(), ValidationError> {
        let numeric = [
            ("cet1_ratio", self.cet1_ratio),
            ("total_assets", self.total_assets),
            ("interbank_assets", self.interbank_assets),
            ("interbank_liabilities", self.interbank_liabilities),
            ("capital_buffer", self.capital_buffer),
        ];
        for (field, value) in numeric {
            if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
                return Err(ValidationError::new(
                    field,
                    format!("{field} cannot be negative"),
                ));
            }
        }

        if self.cet1_ratio.is_some_and(|r| r > Decimal::ONE_HUNDRED) {
            return Err(ValidationError::new(
                "cet1_ratio",
                "CET1 ratio cannot exceed 100%",
            ));
        }

        if let (Some(interbank), Some(total)) = (self.interbank_assets, self.total_assets)
            && interbank > total
        {
            return Err(ValidationError::new(
                "interbank_assets",
                "Interbank assets cannot exceed total assets",
            ));
        }

        Ok(())
    }

    /// Capital buffer sent on create: the explicit value, or CET1% of total assets.
    #[must_use]
    pub fn effective_capital_buffer(&self) -> Option<Decimal> {
        self.capital_buffer.or_else(|| {
            let ratio = self.cet1_ratio?;
            let total = self.total_assets?;
            Some(ratio * total * Decimal::new(1, 2))
        })
    }
}

/// Outcome of a CSV bulk import. Rows are upserted by bank name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankImportReport {
    #[serde(default)]
    pub message: String,
    pub created: u32,
    pub updated: u32,
    /// One entry per rejected row.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl BankImportReport {
    /// Checks the name of the file to upload.
    ///
    /// # Errors
    /// Rejects an empty name and anything without a `.csv` extension.
    pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::new("file", "No file selected"));
        }
        if !name.to_ascii_lowercase().ends_with(".csv") {
            return Err(ValidationError::new("file", "Only CSV files are supported"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_input() -> BankInput {
        BankInput {
            name: Some("Alpha Bank".to_string()),
            cet1_ratio: Some(dec!(14.5)),
            total_assets: Some(dec!(820)),
            interbank_assets: Some(dec!(95.2)),
            interbank_liabilities: Some(dec!(88.1)),
            capital_buffer: None,
        }
    }

    #[test]
    fn test_valid_create() {
        assert!(valid_input().validate_for_create().is_ok());
    }

    #[test]
    fn test_missing_field_on_create() {
        let input = BankInput {
            interbank_liabilities: None,
            ..valid_input()
        };
        let err = input.validate_for_create().unwrap_err();
        assert_eq!(err.message, "Missing required field: interbank_liabilities");
    }

    #[test]
    fn test_update_allows_partial_input() {
        let input = BankInput {
            cet1_ratio: Some(dec!(12)),
            ..Default::default()
        };
        assert!(input.validate_for_update().is_ok());
        assert!(input.validate_for_create().is_err());
    }

    #[test]
    fn test_negative_and_range_checks() {
        let input = BankInput {
            total_assets: Some(dec!(-1)),
            ..valid_input()
        };
        assert_eq!(
            input.validate_for_update().unwrap_err().message,
            "total_assets cannot be negative"
        );

        let input = BankInput {
            cet1_ratio: Some(dec!(100.5)),
            ..valid_input()
        };
        assert_eq!(
            input.validate_for_update().unwrap_err().message,
            "CET1 ratio cannot exceed 100%"
        );

        let input = BankInput {
            interbank_assets: Some(dec!(900)),
            ..valid_input()
        };
        assert_eq!(
            input.validate_for_update().unwrap_err().field,
            "interbank_assets"
        );
    }

    #[test]
    fn test_default_capital_buffer() {
        assert_eq!(valid_input().effective_capital_buffer(), Some(dec!(118.9)));
        let explicit = BankInput {
            capital_buffer: Some(dec!(50)),
            ..valid_input()
        };
        assert_eq!(explicit.effective_capital_buffer(), Some(dec!(50)));
    }

    #[test]
    fn test_bank_figures_round_trip_as_numbers() {
        let json = serde_json::json!({
            "id": "7d3c1d44-1f7a-4a5e-9a43-0c4a9d52b1aa",
            "name": "Alpha Bank",
            "cet1_ratio": 14.5,
            "total_assets": 820.0,
            "interbank_assets": 95.2,
            "interbank_liabilities": 88.1,
            "capital_buffer": 118.9
        });
        let bank: Bank = serde_json::from_value(json).unwrap();
        assert_eq!(bank.net_interbank_position(), dec!(7.1));
        let back = serde_json::to_value(&bank).unwrap();
        assert!(back["cet1_ratio"].is_number());
    }

    #[test]
    fn test_import_file_name_checks() {
        assert!(BankImportReport::validate_file_name("banks.CSV").is_ok());
        assert_eq!(
            BankImportReport::validate_file_name("").unwrap_err().message,
            "No file selected"
        );
        assert_eq!(
            BankImportReport::validate_file_name("banks.xlsx").unwrap_err().message,
            "Only CSV files are supported"
        );
    }

    #[test]
    fn test_import_report_tolerates_missing_errors() {
        let report: BankImportReport =
            serde_json::from_value(serde_json::json!({ "created": 2, "updated": 1 })).unwrap();
        assert_eq!((report.created, report.updated), (2, 1));
        assert!(report.errors.is_empty());
    }
}
