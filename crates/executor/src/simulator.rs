use async_trait::async_trait;
use bigdecimal::BigDecimal;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::config::{SimulatedAsset, SimulatorConfig};
use common::error::Error;
use common::numeric_kernel::{decimal_from_f64, pow10};
use common::types::{AssetId, AssetPair, RateQuote, ReserveSnapshot};
use cycle_arb_core::traits::RateProvider;

/// USD value held on each side of every simulated pool.
const POOL_DEPTH_USD: f64 = 1_000_000.0;

/// Produces synthetic pool reserves for simulation purposes.
///
/// Each pool holds `POOL_DEPTH_USD` of both assets at the configured USD prices,
/// with every side independently skewed by up to `fluctuation_bps`. The skew is
/// drawn from an RNG seeded by `(seed, round, pair)`, so a pair quotes the same
/// rates for the whole round and a run can be replayed exactly. Independent skews
/// are what leave room for arbitrage between pools.
pub struct SimulatedRateProvider {
    assets: HashMap<AssetId, SimulatedAsset>,
    seed: u64,
    fluctuation_bps: u32,
    unavailable_probability: f64,
    round: AtomicU64,
}

impl SimulatedRateProvider {
    pub fn new(config: &SimulatorConfig) -> Self {
        SimulatedRateProvider {
            assets: config
                .assets
                .iter()
                .map(|asset| (asset.id.clone(), asset.clone()))
                .collect(),
            seed: config.seed,
            fluctuation_bps: config.fluctuation_bps,
            unavailable_probability: config.unavailable_probability.clamp(0.0, 1.0),
            round: AtomicU64::new(0),
        }
    }

    pub fn round(&self) -> u64 {
        self.round.load(Ordering::SeqCst)
    }

    fn rng_for(&self, pair: &AssetPair, round: u64) -> SmallRng {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        round.hash(&mut hasher);
        pair.hash(&mut hasher);
        SmallRng::seed_from_u64(hasher.finish())
    }

    fn asset(&self, pair: &AssetPair, id: &AssetId) -> Result<&SimulatedAsset, Error> {
        self.assets.get(id).ok_or_else(|| Error::RateUnavailable {
            pair: pair.clone(),
            reason: format!("asset {id} is not simulated"),
        })
    }

    /// Raw on-chain reserve worth `POOL_DEPTH_USD` at a skewed price.
    fn reserve(
        &self,
        pair: &AssetPair,
        asset: &SimulatedAsset,
        rng: &mut SmallRng,
    ) -> Result<BigDecimal, Error> {
        let spread = f64::from(self.fluctuation_bps) / 10_000.0;
        let price = asset.usd_price * (1.0 + rng.random_range(-spread..=spread));

        let units = decimal_from_f64(POOL_DEPTH_USD / price).ok_or_else(|| Error::InvalidRate {
            from: pair.base.clone(),
            to: pair.quote.clone(),
            rate: format!("{} priced at {price} USD", asset.id),
        })?;

        Ok((units * pow10(asset.decimals)).round(0))
    }
}

#[async_trait]
impl RateProvider for SimulatedRateProvider {
    async fn fetch_rates(&self, pair: &AssetPair) -> Result<RateQuote, Error> {
        let round = self.round();
        let mut rng = self.rng_for(pair, round);

        if rng.random_bool(self.unavailable_probability) {
            return Err(Error::RateUnavailable {
                pair: pair.clone(),
                reason: format!("simulated outage in round {round}"),
            });
        }

        let base = self.asset(pair, &pair.base)?;
        let quote = self.asset(pair, &pair.quote)?;
        let snapshot = ReserveSnapshot {
            reserve_base: self.reserve(pair, base, &mut rng)?,
            reserve_quote: self.reserve(pair, quote, &mut rng)?,
            decimals_base: base.decimals,
            decimals_quote: quote.decimals,
        };

        snapshot.rates(pair)
    }

    fn advance(&self) {
        let next = self.round.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(round = next, "Simulator advanced");
    }
}
