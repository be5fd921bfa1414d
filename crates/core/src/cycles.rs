use std::collections::HashSet;

use super::graph::RateGraph;
use super::traits::CycleFinder;
use common::types::{AssetId, Cycle};

/// Smallest cycle reported by default: three distinct assets.
///
/// Every pair inserted from a quote forms the two-asset loop `A -> B -> A`, whose
/// compounded rate is one by construction, so those are skipped unless asked for.
pub const DEFAULT_MIN_ASSETS: usize = 3;

/// Depth-first enumeration of simple cycles with an explicit path stack.
///
/// A search is started from every asset in ascending order. While descending, each
/// asset on the current branch is marked as on-path and unmarked on backtrack, so
/// one asset can take part in many cycles found on different branches. Meeting a
/// neighbour that is already on the path closes the loop formed by the stack from
/// that neighbour up to the current asset.
///
/// The search started at `s` never enters assets ordered before `s`: every cycle
/// through such an asset was already enumerated from it. Cycles are normalised to
/// their smallest rotation and de-duplicated, keeping the order of first discovery.
#[derive(Debug, Clone)]
pub struct DfsCycleFinder {
    /// Cycles through fewer distinct assets are not reported.
    pub min_assets: usize,
    /// Upper bound on distinct assets per cycle; `None` searches without limit.
    pub max_assets: Option<usize>,
}

impl DfsCycleFinder {
    pub fn new(min_assets: usize, max_assets: Option<usize>) -> Self {
        DfsCycleFinder {
            min_assets,
            max_assets,
        }
    }

    fn search<'g>(
        &self,
        graph: &'g RateGraph,
        start: &'g AssetId,
        node: &'g AssetId,
        branch: &mut Branch<'g>,
        found: &mut FoundCycles,
    ) {
        branch.push(node);

        for (next, _) in graph.neighbors(node) {
            if next < start {
                continue;
            }

            if let Some(pos) = branch.position(next) {
                let open = &branch.path[pos..];
                if open.len() >= self.min_assets {
                    found.insert(open.iter().map(|asset| (*asset).clone()));
                }
            } else if self
                .max_assets
                .is_none_or(|max| branch.path.len() < max)
            {
                self.search(graph, start, next, branch, found);
            }
        }

        branch.pop();
    }
}

impl Default for DfsCycleFinder {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_ASSETS, None)
    }
}

impl CycleFinder for DfsCycleFinder {
    fn find_cycles(&self, graph: &RateGraph) -> Vec<Cycle> {
        let mut found = FoundCycles::default();

        for start in graph.assets() {
            let mut branch = Branch::default();
            self.search(graph, start, start, &mut branch, &mut found);
        }

        found.cycles
    }
}

/// Assets of the current DFS branch, in visiting order, plus an on-path index.
#[derive(Default)]
struct Branch<'g> {
    path: Vec<&'g AssetId>,
    on_path: HashSet<&'g AssetId>,
}

impl<'g> Branch<'g> {
    fn push(&mut self, asset: &'g AssetId) {
        self.path.push(asset);
        self.on_path.insert(asset);
    }

    fn pop(&mut self) {
        if let Some(asset) = self.path.pop() {
            self.on_path.remove(asset);
        }
    }

    fn position(&self, asset: &AssetId) -> Option<usize> {
        if !self.on_path.contains(asset) {
            return None;
        }
        self.path.iter().position(|on_path| *on_path == asset)
    }
}

/// Distinct cycles in order of first discovery.
#[derive(Default)]
struct FoundCycles {
    seen: HashSet<Cycle>,
    cycles: Vec<Cycle>,
}

impl FoundCycles {
    fn insert(&mut self, open_path: impl IntoIterator<Item = AssetId>) {
        if let Some(cycle) = Cycle::from_open_path(open_path) {
            if self.seen.insert(cycle.clone()) {
                self.cycles.push(cycle);
            }
        }
    }
}
