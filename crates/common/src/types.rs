use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::Error;
use crate::numeric_kernel::{divide, fixed_point, is_valid_rate, scale_down};

/// Opaque identifier of a tradable asset, e.g. a token contract address.
///
/// Ordering is plain string ordering; it drives the deterministic traversal
/// order of the rate graph and the rotation chosen for a cycle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        AssetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        AssetId(s.to_string())
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        AssetId(s)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pair of assets whose mutual rates are requested from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct AssetPair {
    pub base: AssetId,
    pub quote: AssetId,
}

impl AssetPair {
    pub fn new(base: impl Into<AssetId>, quote: impl Into<AssetId>) -> Self {
        AssetPair {
            base: base.into(),
            quote: quote.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        AssetPair {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }

    pub fn is_self_pair(&self) -> bool {
        self.base == self.quote
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Both directional rates of a pair, read from a single snapshot.
///
/// - `forward`: units of `quote` received per unit of `base`.
/// - `backward`: units of `base` received per unit of `quote`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub forward: BigDecimal,
    pub backward: BigDecimal,
}

impl RateQuote {
    pub fn new(forward: BigDecimal, backward: BigDecimal) -> Self {
        RateQuote { forward, backward }
    }
}

/// Raw pool reserves of a pair at one instant, in on-chain integer units.
#[derive(Debug, Clone, PartialEq)]
pub struct ReserveSnapshot {
    pub reserve_base: BigDecimal,
    pub reserve_quote: BigDecimal,
    pub decimals_base: u32,
    pub decimals_quote: u32,
}

impl ReserveSnapshot {
    pub fn reversed(&self) -> Self {
        ReserveSnapshot {
            reserve_base: self.reserve_quote.clone(),
            reserve_quote: self.reserve_base.clone(),
            decimals_base: self.decimals_quote,
            decimals_quote: self.decimals_base,
        }
    }

    /// Derives both spot rates of `pair` from these reserves.
    ///
    /// Reserves are first scaled to whole units by their token decimals, then
    /// `forward = quote_units / base_units` and `backward = base_units / quote_units`,
    /// each rounded to `DIVISION_PRECISION` significant digits.
    ///
    /// # Errors
    /// `Error::InvalidRate` if either reserve is zero or negative.
    pub fn rates(&self, pair: &AssetPair) -> Result<RateQuote, Error> {
        let base_units = scale_down(&self.reserve_base, self.decimals_base);
        let quote_units = scale_down(&self.reserve_quote, self.decimals_quote);

        if !is_valid_rate(&base_units) || !is_valid_rate(&quote_units) {
            return Err(Error::InvalidRate {
                from: pair.base.clone(),
                to: pair.quote.clone(),
                rate: format!("reserves {}/{}", self.reserve_base, self.reserve_quote),
            });
        }

        Ok(RateQuote {
            forward: divide(&quote_units, &base_units),
            backward: divide(&base_units, &quote_units),
        })
    }
}

/// A closed walk through the rate graph: `[A, B, C, A]`.
///
/// The last asset equals the first and no other asset repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle(Vec<AssetId>);

impl Cycle {
    /// Closes an open path `[B, C, A]` into a cycle rotated to start at its smallest
    /// asset: `[A, B, C, A]`. Rotations of the same loop therefore compare equal.
    ///
    /// Returns `None` for an empty path.
    pub fn from_open_path(path: impl IntoIterator<Item = AssetId>) -> Option<Self> {
        let mut assets: Vec<AssetId> = path.into_iter().collect();
        let start = assets
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(idx, _)| idx)?;

        assets.rotate_left(start);
        assets.push(assets[0].clone());
        Some(Cycle(assets))
    }

    /// Accepts an already closed sequence as-is, after checking its shape.
    ///
    /// # Errors
    /// `Error::MalformedCycle` if the sequence is shorter than two, is not closed, or
    /// repeats an intermediate asset.
    pub fn from_closed(assets: Vec<AssetId>) -> Result<Self, Error> {
        if assets.len() < 2 {
            return Err(Error::MalformedCycle(format!(
                "expected at least 2 assets, got {}",
                assets.len()
            )));
        }
        if assets.first() != assets.last() {
            return Err(Error::MalformedCycle(format!(
                "{} does not return to its start",
                join_path(&assets)
            )));
        }

        let mut seen = HashSet::new();
        if let Some(repeated) = assets[..assets.len() - 1]
            .iter()
            .find(|asset| !seen.insert(*asset))
        {
            return Err(Error::MalformedCycle(format!(
                "{} visits {} twice",
                join_path(&assets),
                repeated
            )));
        }

        Ok(Cycle(assets))
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.0
    }

    pub fn start(&self) -> &AssetId {
        &self.0[0]
    }

    /// Number of conversions needed to walk the cycle.
    pub fn hops(&self) -> usize {
        self.0.len() - 1
    }

    /// Consecutive `(from, to)` steps, including the closing step back to the start.
    pub fn edges(&self) -> impl Iterator<Item = (&AssetId, &AssetId)> + '_ {
        self.0.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_path(&self.0))
    }
}

fn join_path(assets: &[AssetId]) -> String {
    assets
        .iter()
        .map(AssetId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A cycle and the net multiplicative gain of walking it once.
///
/// `ratio = product_of_rates - 1`, so `0.03` is a 3% gain and a negative ratio a loss.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitResult {
    pub cycle: Cycle,
    pub ratio: BigDecimal,
}

impl ProfitResult {
    pub fn new(cycle: Cycle, ratio: BigDecimal) -> Self {
        ProfitResult { cycle, ratio }
    }

    /// Strictly positive on the unrounded ratio.
    pub fn is_opportunity(&self) -> bool {
        self.ratio > BigDecimal::zero()
    }

    /// Ratio with exactly `decimals` places, for display only.
    pub fn display_ratio(&self, decimals: i64) -> String {
        fixed_point(&self.ratio, decimals)
    }

    /// Ratio as a percentage rounded to `decimals` places, for display only.
    pub fn percent(&self, decimals: i64) -> BigDecimal {
        (&self.ratio * &BigDecimal::from(100)).round(decimals)
    }

    /// Percentage with exactly `decimals` places, for display only.
    pub fn display_percent(&self, decimals: i64) -> String {
        fixed_point(&self.percent(decimals), decimals)
    }
}

impl fmt::Display for ProfitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}%", self.cycle, self.display_percent(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric_kernel::{DIVISION_PRECISION, approx_eq};
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn ids(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|n| AssetId::from(*n)).collect()
    }

    #[test]
    fn open_path_rotates_to_smallest_asset() {
        let cycle = Cycle::from_open_path(ids(&["C", "A", "B"])).unwrap();
        assert_eq!(cycle.assets(), ids(&["A", "B", "C", "A"]).as_slice());
        assert_eq!(cycle.hops(), 3);
        assert_eq!(cycle.start(), &AssetId::from("A"));
    }

    #[test]
    fn rotations_compare_equal_reversals_do_not() {
        let a = Cycle::from_open_path(ids(&["A", "B", "C"])).unwrap();
        let b = Cycle::from_open_path(ids(&["B", "C", "A"])).unwrap();
        let reverse = Cycle::from_open_path(ids(&["A", "C", "B"])).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, reverse);
    }

    #[test]
    fn empty_open_path_is_not_a_cycle() {
        assert!(Cycle::from_open_path(Vec::new()).is_none());
    }

    #[test]
    fn closed_cycle_validation() {
        assert!(Cycle::from_closed(ids(&["A", "B", "A"])).is_ok());
        assert!(matches!(
            Cycle::from_closed(ids(&["A"])),
            Err(Error::MalformedCycle(_))
        ));
        assert!(matches!(
            Cycle::from_closed(ids(&["A", "B", "C"])),
            Err(Error::MalformedCycle(_))
        ));
        assert!(matches!(
            Cycle::from_closed(ids(&["A", "B", "C", "B", "A"])),
            Err(Error::MalformedCycle(_))
        ));
    }

    #[test]
    fn cycle_edges_include_closing_step() {
        let cycle = Cycle::from_closed(ids(&["A", "B", "C", "A"])).unwrap();
        let edges: Vec<(&str, &str)> = cycle
            .edges()
            .map(|(f, t)| (f.as_str(), t.as_str()))
            .collect();
        assert_eq!(edges, vec![("A", "B"), ("B", "C"), ("C", "A")]);
    }

    #[test]
    fn cycle_display_uses_arrows() {
        let cycle = Cycle::from_closed(ids(&["WETH", "USDC", "DAI", "WETH"])).unwrap();
        assert_eq!(cycle.to_string(), "WETH -> USDC -> DAI -> WETH");
    }

    #[test]
    fn reserve_snapshot_rates_account_for_decimals() {
        // 10 WETH (18 decimals) against 30_000 USDC (6 decimals).
        let snapshot = ReserveSnapshot {
            reserve_base: dec("10000000000000000000"),
            reserve_quote: dec("30000000000"),
            decimals_base: 18,
            decimals_quote: 6,
        };
        let pair = AssetPair::new("WETH", "USDC");

        let quote = snapshot.rates(&pair).unwrap();
        assert_eq!(quote.forward, dec("3000"));
        assert!(approx_eq(
            &quote.backward,
            &dec("0.000333333333333333333333"),
            &dec("1e-20")
        ));
        assert!(approx_eq(
            &(&quote.forward * &quote.backward),
            &dec("1"),
            &dec("1e-30")
        ));
    }

    #[test]
    fn reserve_snapshot_rejects_empty_reserve() {
        let snapshot = ReserveSnapshot {
            reserve_base: dec("0"),
            reserve_quote: dec("100"),
            decimals_base: 0,
            decimals_quote: 0,
        };
        let err = snapshot.rates(&AssetPair::new("A", "B")).unwrap_err();
        assert!(matches!(err, Error::InvalidRate { .. }));
    }

    #[test]
    fn reversed_snapshot_swaps_rates() {
        let snapshot = ReserveSnapshot {
            reserve_base: dec("4"),
            reserve_quote: dec("8"),
            decimals_base: 0,
            decimals_quote: 0,
        };
        let pair = AssetPair::new("A", "B");
        let quote = snapshot.rates(&pair).unwrap();
        let reversed = snapshot.reversed().rates(&pair.reversed()).unwrap();

        assert_eq!(quote.forward, reversed.backward);
        assert_eq!(quote.backward, reversed.forward);
        assert_eq!(quote.forward, dec("2"));
        assert_eq!(quote.backward, dec("0.5"));
    }

    #[test]
    fn profit_result_rounding_is_display_only() {
        let cycle = Cycle::from_closed(ids(&["A", "B", "A"])).unwrap();
        let tiny_gain = ProfitResult::new(cycle.clone(), dec("0.00000001"));

        assert!(tiny_gain.is_opportunity());
        assert_eq!(tiny_gain.display_ratio(4), "0.0000");
        assert_eq!(tiny_gain.display_ratio(8), "0.00000001");

        let loss = ProfitResult::new(cycle, dec("-0.025"));
        assert!(!loss.is_opportunity());
        assert_eq!(loss.percent(2), dec("-2.5"));
    }

    #[test]
    fn profit_result_display() {
        let cycle = Cycle::from_closed(ids(&["A", "B", "C", "A"])).unwrap();
        let result = ProfitResult::new(cycle, dec("0.2"));
        assert_eq!(result.to_string(), "A -> B -> C -> A: 20.00%");
    }

    #[test]
    fn profit_result_display_keeps_two_places_at_zero() {
        let cycle = Cycle::from_closed(ids(&["A", "B", "C", "A"])).unwrap();

        let flat = ProfitResult::new(cycle.clone(), dec("0"));
        assert_eq!(flat.to_string(), "A -> B -> C -> A: 0.00%");

        let dust = ProfitResult::new(cycle.clone(), dec("0.00001"));
        assert_eq!(dust.to_string(), "A -> B -> C -> A: 0.00%");

        let loss = ProfitResult::new(cycle, dec("-0.025"));
        assert_eq!(loss.to_string(), "A -> B -> C -> A: -2.50%");
    }

    #[test]
    fn non_terminating_reserves_keep_fixed_precision() {
        let snapshot = ReserveSnapshot {
            reserve_base: dec("3"),
            reserve_quote: dec("1"),
            decimals_base: 0,
            decimals_quote: 0,
        };
        let quote = snapshot.rates(&AssetPair::new("A", "B")).unwrap();

        assert_eq!(quote.forward.digits(), DIVISION_PRECISION);
        assert_eq!(quote.backward, dec("3"));
    }

    #[test]
    fn pair_helpers() {
        let pair = AssetPair::new("WETH", "USDC");
        assert_eq!(pair.reversed(), AssetPair::new("USDC", "WETH"));
        assert!(!pair.is_self_pair());
        assert!(AssetPair::new("X", "X").is_self_pair());
        assert_eq!(pair.to_string(), "WETH/USDC");
    }
}
