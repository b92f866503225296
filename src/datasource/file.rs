//! Offline inputs: a CSV export of operations and a JSON reference document.
//!
//! Operations CSV header:
//! `account_id,kind,date,instrument_uid,figi,currency,quantity_done,price,payment,commission,accrued_interest`
//! with RFC 3339 dates and empty amount cells read as zero.

use super::memory::MemoryDataSource;
use super::DataSourceError;
use crate::domain::{
    AccountId, Currency, Decimal, Figi, FxRate, InstrumentMetadata, InstrumentUid, MarketSnapshot,
    Operation, OperationKind,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct OperationRow {
    account_id: String,
    kind: i32,
    date: String,
    instrument_uid: String,
    #[serde(default)]
    figi: String,
    currency: String,
    #[serde(default)]
    quantity_done: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    payment: String,
    #[serde(default)]
    commission: String,
    #[serde(default)]
    accrued_interest: String,
}

/// One instrument entry of the reference document.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentEntry {
    pub instrument_uid: InstrumentUid,
    #[serde(flatten)]
    pub metadata: InstrumentMetadata,
}

/// Reference data document consumed by the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceDocument {
    #[serde(default)]
    pub instruments: Vec<InstrumentEntry>,
    /// Percent of nominal, keyed by instrument uid.
    #[serde(default)]
    pub last_prices: HashMap<InstrumentUid, Decimal>,
    #[serde(default)]
    pub snapshots: Vec<MarketSnapshot>,
    #[serde(default)]
    pub fx_rates: Vec<FxRate>,
}

/// Read operations from a CSV export, keeping file order.
pub fn read_operations<R: Read>(reader: R) -> Result<Vec<(AccountId, Operation)>, DataSourceError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut operations = Vec::new();

    for (index, record) in csv_reader.deserialize::<OperationRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = record.map_err(|e| DataSourceError::ParseError(format!("line {}: {}", line, e)))?;
        operations.push(parse_row(row, line)?);
    }

    Ok(operations)
}

fn parse_row(row: OperationRow, line: usize) -> Result<(AccountId, Operation), DataSourceError> {
    let date = DateTime::parse_from_rfc3339(&row.date)
        .map_err(|_| DataSourceError::ParseError(format!("line {}: invalid date '{}'", line, row.date)))?
        .with_timezone(&Utc);

    let operation = Operation::new(
        OperationKind::from(row.kind),
        date,
        InstrumentUid::new(row.instrument_uid),
    )
    .with_figi(Figi::new(row.figi))
    .with_currency(Currency::new(&row.currency))
    .with_quantity(amount(&row.quantity_done, "quantity_done", line)?)
    .with_price(amount(&row.price, "price", line)?)
    .with_payment(amount(&row.payment, "payment", line)?)
    .with_commission(amount(&row.commission, "commission", line)?)
    .with_accrued_interest(amount(&row.accrued_interest, "accrued_interest", line)?);

    Ok((AccountId::new(row.account_id), operation))
}

fn amount(value: &str, column: &'static str, line: usize) -> Result<Decimal, DataSourceError> {
    if value.is_empty() {
        return Ok(Decimal::zero());
    }
    Decimal::from_str_canonical(value).map_err(|_| {
        DataSourceError::ParseError(format!(
            "line {}: invalid number '{}' in column '{}'",
            line, value, column
        ))
    })
}

pub fn read_reference<R: Read>(reader: R) -> Result<ReferenceDocument, DataSourceError> {
    serde_json::from_reader(reader).map_err(|e| DataSourceError::ParseError(e.to_string()))
}

impl MemoryDataSource {
    /// Fill a source from parsed inputs.
    pub fn from_inputs(operations: Vec<(AccountId, Operation)>, reference: ReferenceDocument) -> Self {
        let mut source = MemoryDataSource::new();
        for (account_id, operation) in operations {
            source = source.with_operation(account_id, operation);
        }
        for entry in reference.instruments {
            source = source.with_instrument(entry.instrument_uid, entry.metadata);
        }
        for (uid, price) in reference.last_prices {
            source = source.with_last_price(uid, price);
        }
        for snapshot in reference.snapshots {
            source = source.with_snapshot(snapshot);
        }
        for rate in reference.fx_rates {
            source = source.with_fx_rate(rate);
        }
        source
    }

    /// Load the CSV operations export and the JSON reference document.
    pub fn from_files(
        operations_path: impl AsRef<Path>,
        reference_path: impl AsRef<Path>,
    ) -> Result<Self, DataSourceError> {
        let operations = read_operations(open(operations_path.as_ref())?)?;
        let reference = read_reference(open(reference_path.as_ref())?)?;
        Ok(Self::from_inputs(operations, reference))
    }
}

fn open(path: &Path) -> Result<File, DataSourceError> {
    File::open(path).map_err(|e| DataSourceError::Other(format!("{}: {}", path.display(), e)))
}
