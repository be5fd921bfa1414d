use async_trait::async_trait;
use bigdecimal::BigDecimal;
use common::error::Error;
use common::types::{AssetId, AssetPair, RateQuote, ReserveSnapshot};
use cycle_arb_core::{DfsCycleFinder, ProfitEvaluator, RateGraphBuilder, traits::CycleFinder};
use cycle_arb_core::traits::RateProvider;
use std::collections::HashMap;

/// Serves quotes derived from fixed pool reserves, like an on-chain reader would.
struct ReservePools {
    pools: HashMap<AssetPair, ReserveSnapshot>,
}

impl ReservePools {
    fn new(pools: &[(&str, &str, u64, u64)]) -> Self {
        let pools = pools
            .iter()
            .map(|(a, b, ra, rb)| {
                (
                    AssetPair::new(*a, *b),
                    ReserveSnapshot {
                        reserve_base: BigDecimal::from(*ra),
                        reserve_quote: BigDecimal::from(*rb),
                        decimals_base: 0,
                        decimals_quote: 0,
                    },
                )
            })
            .collect();
        ReservePools { pools }
    }
}

#[async_trait]
impl RateProvider for ReservePools {
    async fn fetch_rates(&self, pair: &AssetPair) -> Result<RateQuote, Error> {
        if let Some(snapshot) = self.pools.get(pair) {
            return snapshot.rates(pair);
        }
        if let Some(snapshot) = self.pools.get(&pair.reversed()) {
            return snapshot.reversed().rates(pair);
        }
        Err(Error::RateUnavailable {
            pair: pair.clone(),
            reason: "pool not found".to_string(),
        })
    }
}

fn pairs(names: &[(&str, &str)]) -> Vec<AssetPair> {
    names.iter().map(|(a, b)| AssetPair::new(*a, *b)).collect()
}

#[tokio::test]
async fn finds_mispriced_triangle_end_to_end() {
    // A/B prices B at 2 A, B/C prices C at 2 B, but C/A prices A at 1/0.3 C.
    let provider = ReservePools::new(&[
        ("A", "B", 100, 200),
        ("B", "C", 100, 200),
        ("C", "A", 1000, 300),
        ("C", "D", 10, 10),
    ]);
    let pairs = pairs(&[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D"), ("D", "E")]);

    let build = RateGraphBuilder::new(3).build(&provider, &pairs).await;
    assert_eq!(build.failures.len(), 1);
    assert_eq!(build.failures[0].pair, AssetPair::new("D", "E"));

    let cycles = DfsCycleFinder::default().find_cycles(&build.graph);
    let opportunities = ProfitEvaluator::new(&build.graph)
        .opportunities(&cycles)
        .unwrap();

    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0].to_string(), "A -> B -> C -> A: 20.00%");
    assert_eq!(
        opportunities[0].cycle.start(),
        &AssetId::from("A")
    );
}

#[tokio::test]
async fn consistent_prices_leave_no_opportunity() {
    // Every pool prices A:B:C as 1:2:4.
    let provider = ReservePools::new(&[("A", "B", 100, 200), ("B", "C", 100, 200), ("A", "C", 50, 200)]);
    let pairs = pairs(&[("A", "B"), ("B", "C"), ("A", "C")]);

    let build = RateGraphBuilder::default().build(&provider, &pairs).await;
    let cycles = DfsCycleFinder::default().find_cycles(&build.graph);
    let results = ProfitEvaluator::new(&build.graph).evaluate_all(&cycles).unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.is_opportunity()));
}

#[tokio::test]
async fn repeated_runs_over_unchanged_rates_agree() {
    let provider = ReservePools::new(&[
        ("A", "B", 100, 210),
        ("B", "C", 100, 190),
        ("C", "A", 1000, 260),
        ("A", "D", 30, 70),
        ("D", "C", 50, 90),
    ]);
    let pairs = pairs(&[("A", "B"), ("B", "C"), ("C", "A"), ("A", "D"), ("D", "C")]);
    let builder = RateGraphBuilder::new(2);
    let finder = DfsCycleFinder::default();

    let mut runs = Vec::new();
    for _ in 0..3 {
        let build = builder.build(&provider, &pairs).await;
        let cycles = finder.find_cycles(&build.graph);
        runs.push(ProfitEvaluator::new(&build.graph).evaluate_all(&cycles).unwrap());
    }

    assert!(!runs[0].is_empty());
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}
