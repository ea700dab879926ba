use crate::error::{PaymentError, Result};
use crate::transaction::Category;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of a batch request file. Only `category` is mandatory; the
/// other columns apply per category and may be left empty.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RequestRecord {
    pub category: Category,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
}

/// Streams batch requests from a CSV source. Trims whitespace and
/// tolerates short rows, so hand-written files work as-is.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes requests, streaming large files
    /// without loading them whole.
    pub fn requests(self) -> impl Iterator<Item = Result<RequestRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "category, target, product, amount\n\
                    pulsa, 081234567890, PLS10,\n\
                    withdrawal, , , 100000";
        let reader = RequestReader::new(data.as_bytes());
        let records: Vec<_> = reader.requests().collect();

        assert_eq!(records.len(), 2);
        let first = records[0].as_ref().unwrap();
        assert_eq!(first.category, Category::Pulsa);
        assert_eq!(first.target.as_deref(), Some("081234567890"));
        assert_eq!(first.product.as_deref(), Some("PLS10"));
        assert_eq!(first.amount, None);

        let second = records[1].as_ref().unwrap();
        assert_eq!(second.category, Category::Withdrawal);
        assert_eq!(second.target, None);
        assert_eq!(second.amount, Some(dec!(100000)));
    }

    #[test]
    fn test_reader_unknown_category_is_an_error() {
        let data = "category, target\nlottery, 12345";
        let reader = RequestReader::new(data.as_bytes());
        let records: Vec<_> = reader.requests().collect();
        assert!(records[0].is_err());
    }

    #[test]
    fn test_reader_short_rows_are_tolerated() {
        let data = "category, target, product, amount, provider, region, zone, destination, bank, account\n\
                    token, 14012345678, TKN50";
        let reader = RequestReader::new(data.as_bytes());
        let records: Vec<_> = reader.requests().collect();
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.category, Category::ElectricityToken);
        assert_eq!(record.provider, None);
    }
}
