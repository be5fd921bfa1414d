use async_trait::async_trait;
use bigdecimal::BigDecimal;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use super::error::Error;
use common::error::Error as ArbCoreError;
use common::types::{AssetPair, RateQuote, ReserveSnapshot};
use cycle_arb_core::traits::RateProvider;

// Helper struct for CSV parsing. Reserves stay strings: 18-decimal tokens overflow u64.
#[derive(Debug, Deserialize)]
struct ReserveRecord {
    asset_a: String,
    asset_b: String,
    reserve_a: String,
    reserve_b: String,
    decimals_a: u32,
    decimals_b: u32,
}

/// Serves rates from reserve snapshots loaded from a CSV file.
///
/// A pair can be requested in either orientation; a later row for the same pair
/// replaces an earlier one.
#[derive(Debug, Default)]
pub struct CsvRateProvider {
    snapshots: HashMap<AssetPair, ReserveSnapshot>,
}

impl CsvRateProvider {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let provider = Self::from_reader(file)?;
        info!(path = %path.display(), pools = provider.len(), "Loaded reserve snapshots");
        Ok(provider)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let mut snapshots = HashMap::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let row: ReserveRecord = record.deserialize(Some(&headers))?;

            let pair = AssetPair::new(row.asset_a, row.asset_b);
            if pair.is_self_pair() {
                return Err(Error::InvalidReserveRecord {
                    line,
                    reason: format!("{} is paired with itself", pair.base),
                });
            }

            let snapshot = ReserveSnapshot {
                reserve_base: parse_reserve(&row.reserve_a, line)?,
                reserve_quote: parse_reserve(&row.reserve_b, line)?,
                decimals_base: row.decimals_a,
                decimals_quote: row.decimals_b,
            };

            // Keep one entry per unordered pair so either orientation finds the latest row.
            if snapshots.contains_key(&pair.reversed()) {
                snapshots.insert(pair.reversed(), snapshot.reversed());
            } else {
                snapshots.insert(pair, snapshot);
            }
        }

        Ok(CsvRateProvider { snapshots })
    }

    fn len(&self) -> usize {
        self.snapshots.len()
    }
}

fn parse_reserve(raw: &str, line: u64) -> Result<BigDecimal, Error> {
    BigDecimal::from_str(raw).map_err(|e| Error::InvalidReserveRecord {
        line,
        reason: format!("reserve {raw:?} is not a number: {e}"),
    })
}

#[async_trait]
impl RateProvider for CsvRateProvider {
    async fn fetch_rates(&self, pair: &AssetPair) -> Result<RateQuote, ArbCoreError> {
        if let Some(snapshot) = self.snapshots.get(pair) {
            return snapshot.rates(pair);
        }
        if let Some(snapshot) = self.snapshots.get(&pair.reversed()) {
            return snapshot.reversed().rates(pair);
        }
        Err(ArbCoreError::RateUnavailable {
            pair: pair.clone(),
            reason: "no reserves recorded for this pair".to_string(),
        })
    }
}
