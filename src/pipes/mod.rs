//! # Pipes
//!
//! Results reported by an external process back to the orchestrator.
//!
//! A [`PipesClient`] runs some external environment (here, the sling CLI) on
//! behalf of an asset and returns a [`PipesClientCompletedInvocation`]. For a
//! single-asset step, [`PipesClientCompletedInvocation::get_materialize_result`]
//! coalesces the stream into one [`MaterializeResult`] with any separately
//! reported check results folded in.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::assets::{AssetCheckResult, MaterializeResult};
use crate::error::{EltError, Result};
use crate::execution::AssetExecutionContext;

/// Arbitrary data passed to the external environment
pub type PipesExtras = BTreeMap<String, Value>;

/// One report from the external process
#[derive(Debug, Clone, PartialEq)]
pub enum PipesExecutionResult {
    Materialize(MaterializeResult),
    Check(AssetCheckResult),
}

impl From<MaterializeResult> for PipesExecutionResult {
    fn from(value: MaterializeResult) -> Self {
        Self::Materialize(value)
    }
}

impl From<AssetCheckResult> for PipesExecutionResult {
    fn from(value: AssetCheckResult) -> Self {
        Self::Check(value)
    }
}

/// Runs an external process on behalf of an asset step
#[async_trait::async_trait]
pub trait PipesClient: Send + Sync {
    async fn run(
        &self,
        context: &AssetExecutionContext,
        extras: Option<PipesExtras>,
    ) -> Result<PipesClientCompletedInvocation>;
}

/// Results collected from a finished external invocation
#[derive(Debug, Clone, Default)]
pub struct PipesClientCompletedInvocation {
    results: Vec<PipesExecutionResult>,
}

impl PipesClientCompletedInvocation {
    pub fn new(results: Vec<PipesExecutionResult>) -> Self {
        Self { results }
    }

    /// One entry per report made by the external process
    pub fn get_results(&self) -> &[PipesExecutionResult] {
        &self.results
    }

    /// Single materialization with check results folded in; fails for multi-asset invocations
    pub fn get_materialize_result(&self) -> Result<MaterializeResult> {
        materialize_result_from_pipes_results(&self.results)
    }
}

pub fn materialize_result_from_pipes_results(
    all_results: &[PipesExecutionResult],
) -> Result<MaterializeResult> {
    let mat_results: Vec<&MaterializeResult> = all_results
        .iter()
        .filter_map(|result| match result {
            PipesExecutionResult::Materialize(mat) => Some(mat),
            PipesExecutionResult::Check(_) => None,
        })
        .collect();
    let check_results: Vec<&AssetCheckResult> = all_results
        .iter()
        .filter_map(|result| match result {
            PipesExecutionResult::Check(check) => Some(check),
            PipesExecutionResult::Materialize(_) => None,
        })
        .collect();

    let mat_result = match mat_results.as_slice() {
        [] => {
            return Err(EltError::Pipes(
                "No materialization results received".to_string(),
            ))
        }
        [single] => *single,
        many => {
            let mut keys: Vec<String> = many
                .iter()
                .map(|mat| {
                    mat.asset_key
                        .as_ref()
                        .map(|key| key.to_user_string())
                        .unwrap_or_else(|| "<unkeyed>".to_string())
                })
                .collect();
            keys.sort();
            return Err(EltError::Pipes(format!(
                "Multiple materialize results returned with asset keys {keys:?}. \
                 If you are materializing multiple assets in a pipes invocation, use get_results() instead."
            )));
        }
    };

    for check in &check_results {
        if let Some(check_key) = &check.asset_key {
            if mat_result.asset_key.as_ref() != Some(check_key) {
                return Err(EltError::Pipes(format!(
                    "Check result '{}' specified asset key {check_key} that is not part of the returned materialization",
                    check.check_name
                )));
            }
        }
    }

    let mut coalesced = mat_result.clone();
    coalesced
        .check_results
        .extend(check_results.into_iter().cloned());
    Ok(coalesced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetKey;

    fn mat(key: &str) -> PipesExecutionResult {
        MaterializeResult::for_asset(AssetKey::from(key)).into()
    }

    #[test]
    fn test_single_materialization_passes_through() {
        let result = materialize_result_from_pipes_results(&[mat("main/tbl")]).unwrap();
        assert_eq!(result.asset_key, Some(AssetKey::from("main/tbl")));
        assert!(result.check_results.is_empty());
    }

    #[test]
    fn test_checks_are_folded_in() {
        let invocation = PipesClientCompletedInvocation::new(vec![
            mat("main/tbl"),
            AssetCheckResult::new("not_empty", true)
                .for_asset(AssetKey::from("main/tbl"))
                .into(),
            AssetCheckResult::new("unkeyed", false).into(),
        ]);

        let result = invocation.get_materialize_result().unwrap();
        assert_eq!(result.check_results.len(), 2);
        assert_eq!(invocation.get_results().len(), 3);
    }

    #[test]
    fn test_no_materialization_is_an_error() {
        let err = materialize_result_from_pipes_results(&[
            AssetCheckResult::new("c", true).into()
        ])
        .unwrap_err();
        assert!(err.to_string().contains("No materialization results"));
    }

    #[test]
    fn test_multiple_materializations_name_sorted_keys() {
        let err = materialize_result_from_pipes_results(&[mat("b"), mat("a")]).unwrap_err();
        assert!(err.to_string().contains(r#"["a", "b"]"#), "got: {err}");
    }

    #[test]
    fn test_check_for_other_asset_is_rejected() {
        let err = materialize_result_from_pipes_results(&[
            mat("main/tbl"),
            AssetCheckResult::new("c", true)
                .for_asset(AssetKey::from("other"))
                .into(),
        ])
        .unwrap_err();
        assert!(matches!(err, EltError::Pipes(_)));
    }
}
