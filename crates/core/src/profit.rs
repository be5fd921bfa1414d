use bigdecimal::BigDecimal;
use tracing::debug;

use super::graph::RateGraph;
use common::{
    error::Error,
    numeric_kernel::{compound, net_gain},
    types::{AssetId, Cycle, ProfitResult},
};

/// Scores cycles against the rates of one graph snapshot.
///
/// Products are exact. A gain within `break_even_tolerance()` of zero, left over
/// from rounded reserve ratios, counts as break-even.
#[derive(Debug, Clone, Copy)]
pub struct ProfitEvaluator<'g> {
    graph: &'g RateGraph,
}

impl<'g> ProfitEvaluator<'g> {
    pub fn new(graph: &'g RateGraph) -> Self {
        ProfitEvaluator { graph }
    }

    /// Product of the rates along every step of `cycle`.
    ///
    /// # Errors
    /// `Error::EdgeNotFound` if a step has no edge in the graph.
    pub fn compound_rate(&self, cycle: &Cycle) -> Result<BigDecimal, Error> {
        let rates = cycle
            .edges()
            .map(|(from, to)| {
                self.graph.rate(from, to).ok_or_else(|| Error::EdgeNotFound {
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(compound(rates))
    }

    /// Net gain of walking `cycle` once: `compound_rate - 1`.
    pub fn evaluate(&self, cycle: &Cycle) -> Result<ProfitResult, Error> {
        let ratio = net_gain(&self.compound_rate(cycle)?);
        debug!(cycle = %cycle, ratio = %ratio, "Cycle evaluated");
        Ok(ProfitResult::new(cycle.clone(), ratio))
    }

    /// Evaluates a raw closed sequence such as `[A, B, C, A]`.
    ///
    /// # Errors
    /// - `Error::MalformedCycle` if the sequence is too short, not closed, or repeats
    ///   an asset.
    /// - `Error::EdgeNotFound` if a step has no edge in the graph.
    pub fn evaluate_path(&self, assets: &[AssetId]) -> Result<ProfitResult, Error> {
        let cycle = Cycle::from_closed(assets.to_vec())?;
        self.evaluate(&cycle)
    }

    /// Evaluates every cycle, keeping input order.
    ///
    /// Fails on the first cycle that references a missing edge. Cycles produced by a
    /// finder over the same graph never do.
    pub fn evaluate_all<'c, I>(&self, cycles: I) -> Result<Vec<ProfitResult>, Error>
    where
        I: IntoIterator<Item = &'c Cycle>,
    {
        cycles.into_iter().map(|cycle| self.evaluate(cycle)).collect()
    }

    /// Evaluates every cycle and keeps the strictly profitable ones, in input order.
    pub fn opportunities<'c, I>(&self, cycles: I) -> Result<Vec<ProfitResult>, Error>
    where
        I: IntoIterator<Item = &'c Cycle>,
    {
        let results = self.evaluate_all(cycles)?;
        let evaluated = results.len();
        let profitable: Vec<ProfitResult> = results
            .into_iter()
            .filter(ProfitResult::is_opportunity)
            .collect();

        debug!(evaluated, profitable = profitable.len(), "Cycles evaluated");
        Ok(profitable)
    }
}
