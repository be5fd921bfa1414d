use bigdecimal::BigDecimal;
use std::collections::BTreeMap;

use common::error::Error;
use common::numeric_kernel::is_valid_rate;
use common::types::{AssetId, AssetPair, RateQuote};

/// Directed exchange-rate graph keyed by asset.
///
/// `edges[a][b]` holds the number of `b` units received for one unit of `a`.
/// Both levels are ordered maps, so every traversal visits assets in ascending
/// order and repeated runs over the same rates are reproducible.
///
/// Every asset that appears as an edge target also has an entry of its own
/// (possibly without outgoing edges), so `assets()` lists all vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateGraph {
    edges: BTreeMap<AssetId, BTreeMap<AssetId, BigDecimal>>,
}

impl RateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the two directed edges of `pair` from one quote.
    ///
    /// Both rates are validated before either edge is written, so the graph never
    /// holds only one direction of a pair. An existing edge is overwritten.
    ///
    /// # Errors
    /// - `Error::SelfPair` if both sides are the same asset.
    /// - `Error::InvalidRate` if either rate is not strictly positive.
    pub fn insert_pair(&mut self, pair: &AssetPair, quote: RateQuote) -> Result<(), Error> {
        if pair.is_self_pair() {
            return Err(Error::SelfPair(pair.base.clone()));
        }
        check_rate(&pair.base, &pair.quote, &quote.forward)?;
        check_rate(&pair.quote, &pair.base, &quote.backward)?;

        self.put(pair.base.clone(), pair.quote.clone(), quote.forward);
        self.put(pair.quote.clone(), pair.base.clone(), quote.backward);
        Ok(())
    }

    /// Inserts a single directed edge.
    ///
    /// # Errors
    /// - `Error::SelfPair` if `from == to`.
    /// - `Error::InvalidRate` if `rate` is not strictly positive.
    pub fn insert_edge(
        &mut self,
        from: AssetId,
        to: AssetId,
        rate: BigDecimal,
    ) -> Result<(), Error> {
        if from == to {
            return Err(Error::SelfPair(from));
        }
        check_rate(&from, &to, &rate)?;
        self.put(from, to, rate);
        Ok(())
    }

    /// Removes a directed edge, returning its rate. Vertices are kept.
    pub fn remove_edge(&mut self, from: &AssetId, to: &AssetId) -> Option<BigDecimal> {
        self.edges.get_mut(from)?.remove(to)
    }

    pub fn rate(&self, from: &AssetId, to: &AssetId) -> Option<&BigDecimal> {
        self.edges.get(from)?.get(to)
    }

    pub fn contains_asset(&self, asset: &AssetId) -> bool {
        self.edges.contains_key(asset)
    }

    /// Outgoing edges of `asset` in ascending target order. Unknown assets have none.
    pub fn neighbors<'g>(
        &'g self,
        asset: &AssetId,
    ) -> impl Iterator<Item = (&'g AssetId, &'g BigDecimal)> + use<'g> {
        self.edges.get(asset).into_iter().flat_map(|targets| targets.iter())
    }

    /// All vertices in ascending order.
    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.edges.keys()
    }

    pub fn asset_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    fn put(&mut self, from: AssetId, to: AssetId, rate: BigDecimal) {
        self.edges.entry(to.clone()).or_default();
        self.edges.entry(from).or_default().insert(to, rate);
    }
}

fn check_rate(from: &AssetId, to: &AssetId, rate: &BigDecimal) -> Result<(), Error> {
    if is_valid_rate(rate) {
        Ok(())
    } else {
        Err(Error::InvalidRate {
            from: from.clone(),
            to: to.clone(),
            rate: rate.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn id(s: &str) -> AssetId {
        AssetId::from(s)
    }

    #[test]
    fn insert_pair_adds_both_directions() {
        let mut graph = RateGraph::new();
        let pair = AssetPair::new("WETH", "USDC");

        graph
            .insert_pair(&pair, RateQuote::new(dec("3000"), dec("0.0003333")))
            .unwrap();

        assert_eq!(graph.asset_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.rate(&id("WETH"), &id("USDC")), Some(&dec("3000")));
        assert_eq!(graph.rate(&id("USDC"), &id("WETH")), Some(&dec("0.0003333")));
    }

    #[test]
    fn invalid_backward_rate_leaves_graph_untouched() {
        let mut graph = RateGraph::new();
        let pair = AssetPair::new("A", "B");

        let err = graph
            .insert_pair(&pair, RateQuote::new(dec("2"), dec("0")))
            .unwrap_err();

        assert_eq!(
            err,
            Error::InvalidRate {
                from: id("B"),
                to: id("A"),
                rate: "0".to_string(),
            }
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn self_pair_is_rejected() {
        let mut graph = RateGraph::new();
        let err = graph
            .insert_pair(&AssetPair::new("A", "A"), RateQuote::new(dec("1"), dec("1")))
            .unwrap_err();
        assert_eq!(err, Error::SelfPair(id("A")));

        let err = graph.insert_edge(id("A"), id("A"), dec("1")).unwrap_err();
        assert_eq!(err, Error::SelfPair(id("A")));
        assert!(graph.is_empty());
    }

    #[test]
    fn duplicate_pair_overwrites_with_latest_quote() {
        let mut graph = RateGraph::new();
        let pair = AssetPair::new("A", "B");

        graph.insert_pair(&pair, RateQuote::new(dec("2"), dec("0.5"))).unwrap();
        graph.insert_pair(&pair, RateQuote::new(dec("4"), dec("0.25"))).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.rate(&id("A"), &id("B")), Some(&dec("4")));
        assert_eq!(graph.rate(&id("B"), &id("A")), Some(&dec("0.25")));
    }

    #[test]
    fn target_only_assets_are_vertices() {
        let mut graph = RateGraph::new();
        graph.insert_edge(id("B"), id("A"), dec("1.5")).unwrap();

        let assets: Vec<&str> = graph.assets().map(AssetId::as_str).collect();
        assert_eq!(assets, vec!["A", "B"]);
        assert!(graph.contains_asset(&id("A")));
        assert_eq!(graph.neighbors(&id("A")).count(), 0);
    }

    #[test]
    fn neighbors_are_sorted_and_unknown_assets_have_none() {
        let mut graph = RateGraph::new();
        graph.insert_edge(id("A"), id("C"), dec("1")).unwrap();
        graph.insert_edge(id("A"), id("B"), dec("2")).unwrap();

        let targets: Vec<&str> = graph.neighbors(&id("A")).map(|(t, _)| t.as_str()).collect();
        assert_eq!(targets, vec!["B", "C"]);
        assert_eq!(graph.neighbors(&id("Z")).count(), 0);
    }

    #[test]
    fn remove_edge_keeps_vertices() {
        let mut graph = RateGraph::new();
        graph
            .insert_pair(&AssetPair::new("A", "B"), RateQuote::new(dec("2"), dec("0.5")))
            .unwrap();

        assert_eq!(graph.remove_edge(&id("A"), &id("B")), Some(dec("2")));
        assert_eq!(graph.remove_edge(&id("A"), &id("B")), None);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.asset_count(), 2);
    }

    #[test]
    fn assets_and_neighbors_iterate_in_ascending_order() {
        let mut graph = RateGraph::new();
        graph.insert_edge(id("B"), id("A"), dec("3")).unwrap();
        graph.insert_edge(id("A"), id("C"), dec("2")).unwrap();
        graph.insert_edge(id("A"), id("B"), dec("1")).unwrap();

        let assets: Vec<&str> = graph.assets().map(AssetId::as_str).collect();
        assert_eq!(assets, vec!["A", "B", "C"]);

        let targets: Vec<&str> = graph.neighbors(&id("A")).map(|(t, _)| t.as_str()).collect();
        assert_eq!(targets, vec!["B", "C"]);
    }
}
