use std::collections::{BTreeMap, BTreeSet};

use crate::assets::{AssetKey, AssetsDefinition};
use crate::error::{EltError, Result};

/// Assets of a job with their dependency edges and execution order
#[derive(Debug)]
pub struct AssetGraph {
    definitions: Vec<AssetsDefinition>,
    key_index: BTreeMap<AssetKey, usize>,
    /// Upstream definition indices for each definition
    upstream: Vec<BTreeSet<usize>>,
    external: BTreeSet<AssetKey>,
    order: Vec<usize>,
}

impl AssetGraph {
    pub fn new(definitions: Vec<AssetsDefinition>) -> Result<Self> {
        let mut key_index = BTreeMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            for key in definition.keys() {
                if key_index.insert(key.clone(), index).is_some() {
                    return Err(EltError::validation(format!(
                        "Asset {key} is defined more than once"
                    )));
                }
            }
        }

        let mut external = BTreeSet::new();
        let mut upstream = vec![BTreeSet::new(); definitions.len()];
        for (index, definition) in definitions.iter().enumerate() {
            for dep in definition.dependency_keys() {
                match key_index.get(&dep) {
                    Some(&upstream_index) => {
                        upstream[index].insert(upstream_index);
                    }
                    None => {
                        external.insert(dep);
                    }
                }
            }
        }

        let order = topological_order(&definitions, &upstream)?;

        Ok(Self {
            definitions,
            key_index,
            upstream,
            external,
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.key_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_index.is_empty()
    }

    pub fn asset_keys(&self) -> Vec<&AssetKey> {
        self.key_index.keys().collect()
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.key_index.contains_key(key)
    }

    /// Dependencies on assets that are not part of this job
    pub fn external_dependencies(&self) -> &BTreeSet<AssetKey> {
        &self.external
    }

    /// Definitions in the order they execute
    pub fn execution_order(&self) -> impl Iterator<Item = &AssetsDefinition> {
        self.order.iter().map(|&index| &self.definitions[index])
    }

    pub(crate) fn ordered_indices(&self) -> &[usize] {
        &self.order
    }

    pub(crate) fn definition(&self, index: usize) -> &AssetsDefinition {
        &self.definitions[index]
    }

    pub(crate) fn upstream_of(&self, index: usize) -> &BTreeSet<usize> {
        &self.upstream[index]
    }
}

/// Kahn's algorithm; ready steps are taken in order of their first asset key
fn topological_order(
    definitions: &[AssetsDefinition],
    upstream: &[BTreeSet<usize>],
) -> Result<Vec<usize>> {
    let sort_key = |index: usize| -> String {
        definitions[index]
            .keys()
            .map(AssetKey::to_user_string)
            .min()
            .unwrap_or_default()
    };

    let mut remaining: Vec<usize> = upstream.iter().map(BTreeSet::len).collect();
    let mut downstream = vec![Vec::new(); definitions.len()];
    for (index, ups) in upstream.iter().enumerate() {
        for &up in ups {
            downstream[up].push(index);
        }
    }

    let mut ready: BTreeSet<(String, usize)> = remaining
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(index, _)| (sort_key(index), index))
        .collect();

    let mut order = Vec::with_capacity(definitions.len());
    while let Some(next) = ready.pop_first() {
        let index = next.1;
        order.push(index);
        for &down in &downstream[index] {
            remaining[down] -= 1;
            if remaining[down] == 0 {
                ready.insert((sort_key(down), down));
            }
        }
    }

    if order.len() != definitions.len() {
        let cyclic: Vec<String> = remaining
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .flat_map(|(index, _)| definitions[index].keys().map(AssetKey::to_user_string))
            .collect();
        return Err(EltError::validation(format!(
            "Asset dependencies form a cycle involving {cyclic:?}"
        )));
    }

    Ok(order)
}
