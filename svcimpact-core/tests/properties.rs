use std::collections::BTreeSet;

use proptest::prelude::*;
use svcimpact_core::adjacency::AdjacencyIndex;
use svcimpact_core::health::{HealthEvaluator, PropagationPolicy};
use svcimpact_core::impact::ImpactPropagator;
use svcimpact_core::model::{
    BindingHealth, BindingSpec, Criticality, DependencySpec, Health, Reason, ServiceSpec,
};
use svcimpact_core::view::ViewMode;
use svcimpact_core::{Engine, SnapshotInput, TopologySnapshot};

const MAX_SERVICES: usize = 8;

fn health_strategy() -> impl Strategy<Value = BindingHealth> {
    prop_oneof![
        3 => Just(BindingHealth::Up),
        1 => Just(BindingHealth::Down),
        1 => Just(BindingHealth::Unknown),
    ]
}

fn criticality_strategy() -> impl Strategy<Value = Criticality> {
    prop_oneof![
        Just(Criticality::Low),
        Just(Criticality::Medium),
        Just(Criticality::High),
        Just(Criticality::Critical),
    ]
}

/// Every policy that passes validation
fn valid_policy_strategy() -> impl Strategy<Value = PropagationPolicy> {
    let levels = [Health::Up, Health::Degraded, Health::Impacted, Health::Down];
    (0..4usize, 0..3usize, 0..2usize)
        .prop_map(move |(down, impacted, degraded)| PropagationPolicy {
            on_child_down: levels[down],
            on_child_impacted: levels[impacted],
            on_child_degraded: levels[degraded],
        })
        .prop_filter("policy must validate", |p| p.validate().is_ok())
}

/// Random topology: self-loops, duplicates and cycles all allowed
fn topology_strategy() -> impl Strategy<Value = SnapshotInput> {
    (1..=MAX_SERVICES).prop_flat_map(|n| {
        (
            prop::collection::vec(criticality_strategy(), n),
            prop::collection::vec((0..n, 0..n, any::<bool>()), 0..n * 2),
            prop::collection::vec((0..n, health_strategy()), 0..n * 2),
        )
            .prop_map(move |(tiers, edges, bindings)| SnapshotInput {
                application: None,
                services: tiers
                    .into_iter()
                    .enumerate()
                    .map(|(i, c)| ServiceSpec::new(format!("s{}", i), c))
                    .collect(),
                dependencies: edges
                    .into_iter()
                    .map(|(p, c, hard)| {
                        let (p, c) = (format!("s{}", p), format!("s{}", c));
                        if hard {
                            DependencySpec::hard(p, c)
                        } else {
                            DependencySpec::soft(p, c)
                        }
                    })
                    .collect(),
                bindings: bindings
                    .into_iter()
                    .enumerate()
                    .map(|(i, (s, h))| BindingSpec::new(format!("s{}", s), "ping", format!("host-{}", i), h))
                    .collect(),
            })
    })
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(input in topology_strategy()) {
        let engine = Engine::default();
        for mode in ViewMode::ALL_MODES {
            let first = engine.evaluate(&input, Some(mode.as_str())).unwrap();
            let second = engine.evaluate(&input, Some(mode.as_str())).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn one_result_per_service(input in topology_strategy()) {
        let report = Engine::default().evaluate(&input, None).unwrap();
        let ids: Vec<_> = report.services.iter().map(|r| r.service_id.clone()).collect();
        let expected: Vec<_> = input.services.iter().map(|s| s.id.clone()).collect();
        prop_assert_eq!(ids, expected);
        prop_assert!(report.converged);
    }

    #[test]
    fn binding_going_down_never_improves_health(
        input in topology_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let up_positions: Vec<usize> = input
            .bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.health == Some(BindingHealth::Up))
            .map(|(i, _)| i)
            .collect();
        prop_assume!(!up_positions.is_empty());
        let flipped_at = up_positions[pick.index(up_positions.len())];

        let mut worse = input.clone();
        worse.bindings[flipped_at].health = Some(BindingHealth::Down);
        let owner = worse.bindings[flipped_at].service.clone();

        let engine = Engine::default();
        let before = engine.evaluate(&input, None).unwrap();
        let after = engine.evaluate(&worse, None).unwrap();

        for (b, a) in before.services.iter().zip(after.services.iter()) {
            prop_assert!(a.health >= b.health, "{} improved", a.service_id);
        }
        prop_assert_eq!(after.service(&owner).unwrap().health, Health::Down);
    }

    #[test]
    fn hard_cycle_with_down_member_never_leaves_members_up(
        n in 2..MAX_SERVICES,
        down in any::<prop::sample::Index>(),
    ) {
        let down = down.index(n);
        let input = SnapshotInput {
            application: None,
            services: (0..n).map(|i| ServiceSpec::new(format!("s{}", i), Criticality::High)).collect(),
            dependencies: (0..n)
                .map(|i| DependencySpec::hard(format!("s{}", i), format!("s{}", (i + 1) % n)))
                .collect(),
            bindings: vec![BindingSpec::new(format!("s{}", down), "ping", "h", BindingHealth::Down)],
        };
        let report = Engine::default().evaluate(&input, None).unwrap();
        prop_assert!(report.converged);
        prop_assert!(report.passes <= n + 1);
        for r in &report.services {
            prop_assert!(matches!(r.health, Health::Impacted | Health::Down));
        }
    }

    #[test]
    fn dependency_reasons_only_reference_hard_children(input in topology_strategy()) {
        let snap = TopologySnapshot::build(&input).unwrap();
        let hard: BTreeSet<(String, String)> = snap
            .edges()
            .iter()
            .filter(|e| e.propagates())
            .map(|e| (e.parent.clone(), e.child.clone()))
            .collect();
        let index = AdjacencyIndex::build(&snap);
        let eval = HealthEvaluator::new(&snap, &index).evaluate();
        for r in &eval.results {
            for reason in &r.reasons {
                if let Reason::Dependency { child_service_id, .. } = reason {
                    prop_assert!(hard.contains(&(r.service_id.clone(), child_service_id.clone())));
                }
            }
        }
    }

    #[test]
    fn soft_only_graph_keeps_direct_health(input in topology_strategy()) {
        let mut soft = input.clone();
        for d in &mut soft.dependencies {
            d.dependency_type = "soft".into();
        }
        let mut isolated = input.clone();
        isolated.dependencies.clear();

        let engine = Engine::default();
        let with_soft = engine.evaluate(&soft, None).unwrap();
        let without = engine.evaluate(&isolated, None).unwrap();
        prop_assert_eq!(with_soft.services, without.services);
    }

    #[test]
    fn duplicate_soft_edges_change_nothing(input in topology_strategy()) {
        let mut duplicated = input.clone();
        for d in &input.dependencies {
            let mut dup = d.clone();
            dup.dependency_type = "soft".into();
            duplicated.dependencies.insert(0, dup);
        }
        let engine = Engine::default();
        let a = engine.evaluate(&input, Some("attention")).unwrap();
        let b = engine.evaluate(&duplicated, Some("attention")).unwrap();
        prop_assert_eq!(a.services, b.services);
        prop_assert_eq!(a.view.visible_service_ids, b.view.visible_service_ids);
    }

    #[test]
    fn empty_start_set_reaches_nothing(input in topology_strategy()) {
        let snap = TopologySnapshot::build(&input).unwrap();
        let index = AdjacencyIndex::build(&snap);
        let propagator = ImpactPropagator::new(&snap, &index);
        let none: Vec<String> = Vec::new();
        prop_assert!(propagator.upstream(&none).is_empty());
        prop_assert!(propagator.downstream(&none).is_empty());
    }

    #[test]
    fn visible_edges_have_visible_endpoints(input in topology_strategy()) {
        let engine = Engine::default();
        for mode in ViewMode::ALL_MODES {
            let report = engine.evaluate(&input, Some(mode.as_str())).unwrap();
            let visible: BTreeSet<_> = report.view.visible_service_ids.iter().collect();
            for e in &report.view.visible_edges {
                prop_assert!(visible.contains(&e.parent) && visible.contains(&e.child));
            }
        }
    }

    #[test]
    fn valid_policies_settle_within_service_count(
        input in topology_strategy(),
        policy in valid_policy_strategy(),
    ) {
        let snap = TopologySnapshot::build(&input).unwrap();
        let index = AdjacencyIndex::build(&snap);
        let eval = HealthEvaluator::new(&snap, &index).with_policy(policy).evaluate();
        prop_assert!(eval.converged);
        prop_assert!(eval.passes <= snap.len());
    }
}
