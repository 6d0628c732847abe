use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tasker_elt::assets::{AssetCompute, AssetKey, AssetSpec, AssetsDefinition, FnCompute, MaterializeResult};
use tasker_elt::error::EltError;
use tasker_elt::execution::AssetExecutionContext;
use tasker_elt::job::AssetGraph;
use tasker_elt::sling::output::{clean_line, line_level, LineLevel};

fn noop() -> Arc<dyn AssetCompute> {
    Arc::new(FnCompute(|_ctx: AssetExecutionContext| async {
        Ok::<_, EltError>(Vec::<MaterializeResult>::new())
    }))
}

/// Node `i` may only depend on nodes `j < i`, so every generated graph is acyclic
fn dag_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..10).prop_flat_map(|size| {
        (0..size)
            .map(|node| proptest::collection::vec(0..node.max(1), 0..=node.min(3)))
            .collect::<Vec<_>>()
            .prop_map(|deps| {
                deps.into_iter()
                    .enumerate()
                    .map(|(node, deps)| deps.into_iter().filter(|dep| *dep < node).collect())
                    .collect()
            })
    })
}

proptest! {
    /// Property: every asset runs after all of its in-job dependencies
    #[test]
    fn execution_order_respects_dependencies(dag in dag_strategy(), external in any::<bool>()) {
        let definitions: Vec<AssetsDefinition> = dag
            .iter()
            .enumerate()
            .rev()
            .map(|(node, deps)| {
                let mut spec = AssetSpec::new(format!("asset_{node}"));
                for dep in deps {
                    spec = spec.with_dep(format!("asset_{dep}"));
                }
                if external {
                    spec = spec.with_dep("source/raw_feed");
                }
                AssetsDefinition::new(format!("step_{node}"), vec![spec], noop()).unwrap()
            })
            .collect();

        let graph = AssetGraph::new(definitions).unwrap();
        let position: BTreeMap<AssetKey, usize> = graph
            .execution_order()
            .enumerate()
            .flat_map(|(index, definition)| definition.keys().cloned().map(move |key| (key, index)))
            .collect();

        prop_assert_eq!(position.len(), dag.len());
        for (node, deps) in dag.iter().enumerate() {
            let own = position[&AssetKey::from(format!("asset_{node}"))];
            for dep in deps {
                let dep_key = AssetKey::from(format!("asset_{}", dep));
                prop_assert!(position[&dep_key] < own, "{} must run before asset_{}", dep_key, node);
            }
        }
        prop_assert_eq!(graph.external_dependencies().len(), usize::from(external));
    }

    /// Property: cleaned output never carries escape sequences or leading noise before a level marker
    #[test]
    fn cleaned_lines_start_at_level_marker(
        prefix in "[0-9:]{0,8}",
        marker in prop::sample::select(vec!["INF", "WRN", "ERR", "DBG"]),
        body in "[a-z ]{0,20}",
    ) {
        let raw = format!("\x1b[90m{prefix}\x1b[0m \x1b[32m{marker}\x1b[0m {body}");
        let cleaned = clean_line(&raw);
        prop_assert!(!cleaned.contains('\x1b'));
        prop_assert!(cleaned.starts_with(marker));
        prop_assert_ne!(line_level(&cleaned), LineLevel::Unknown);
    }
}
