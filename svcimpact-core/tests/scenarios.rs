use svcimpact_core::impact::Direction;
use svcimpact_core::model::{
    BindingHealth, BindingSpec, Criticality, DependencySpec, Health, Reason, ServiceSpec,
};
use svcimpact_core::view::ViewMode;
use svcimpact_core::{Engine, SnapshotFile, SnapshotInput, ValidationError, Warning};

/// A(critical) -> B(high) -> C(low), all hard; C is DOWN
fn chain() -> SnapshotInput {
    SnapshotInput {
        application: Some("orders".into()),
        services: vec![
            ServiceSpec::new("A", Criticality::Critical),
            ServiceSpec::new("B", Criticality::High),
            ServiceSpec::new("C", Criticality::Low),
        ],
        dependencies: vec![DependencySpec::hard("A", "B"), DependencySpec::hard("B", "C")],
        bindings: vec![
            BindingSpec::new("A", "url", "https://a", BindingHealth::Up),
            BindingSpec::new("B", "port", "b:8080", BindingHealth::Up),
            BindingSpec::new("C", "ping", "c-host", BindingHealth::Down),
        ],
    }
}

#[test]
fn test_chain_health() {
    let report = Engine::default().evaluate(&chain(), None).unwrap();

    let c = report.service("C").unwrap();
    assert_eq!(c.health, Health::Down);
    assert_eq!(c.affected_services, vec!["B"]);
    assert_eq!(
        c.reasons,
        vec![Reason::Binding {
            monitor_type: "ping".into(),
            monitor_ref: "c-host".into(),
            display_name: None,
            health: BindingHealth::Down,
        }]
    );

    let b = report.service("B").unwrap();
    assert_eq!(b.health, Health::Impacted);
    assert_eq!(b.affected_services, vec!["A"]);
    assert_eq!(
        b.reasons,
        vec![Reason::Dependency {
            child_service_id: "C".into(),
            child_health: Health::Down,
        }]
    );

    let a = report.service("A").unwrap();
    assert_eq!(a.health, Health::Impacted);
    assert!(a.affected_services.is_empty());
}

#[test]
fn test_chain_down_only_view() {
    let report = Engine::default().evaluate(&chain(), Some("down_only")).unwrap();
    assert_eq!(report.view.mode, ViewMode::DownOnly);
    assert_eq!(report.view.visible_service_ids, vec!["A", "B", "C"]);
    assert_eq!(report.view.visible_edges.len(), 2);
}

#[test]
fn test_chain_critical_path_adds_healthy_critical_service() {
    let mut input = chain();
    input.services.push(ServiceSpec::new("D", Criticality::Critical));
    input.services.push(ServiceSpec::new("E", Criticality::High));

    let report = Engine::default().evaluate(&input, Some("critical_path")).unwrap();
    assert_eq!(report.service("D").unwrap().health, Health::Up);
    assert_eq!(report.view.visible_service_ids, vec!["A", "B", "C", "D"]);
}

#[test]
fn test_duplicate_edges_behave_like_single_hard_edge() {
    let single = SnapshotInput {
        services: vec![
            ServiceSpec::new("A", Criticality::High),
            ServiceSpec::new("B", Criticality::High),
        ],
        dependencies: vec![DependencySpec::hard("A", "B")],
        bindings: vec![BindingSpec::new("B", "ping", "b", BindingHealth::Down)],
        ..Default::default()
    };
    let mut doubled = single.clone();
    doubled.dependencies = vec![DependencySpec::soft("A", "B"), DependencySpec::hard("A", "B")];

    let engine = Engine::default();
    let a = engine.evaluate(&single, Some("all")).unwrap();
    let b = engine.evaluate(&doubled, Some("all")).unwrap();
    assert_eq!(a.services, b.services);
    assert_eq!(a.view.visible_edges, b.view.visible_edges);
    assert_eq!(b.warnings.len(), 1);
}

#[test]
fn test_dangling_dependency_is_rejected() {
    let mut input = chain();
    input.dependencies.push(DependencySpec::hard("B", "Z"));
    let err = Engine::default().evaluate(&input, None).unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownDependencyService {
            parent: "B".into(),
            child: "Z".into(),
            missing: "Z".into(),
        }
    );
}

#[test]
fn test_suggested_edges_are_display_only() {
    let yaml = r#"
application: storefront
services:
  - id: web
    criticality: critical
  - id: search
  - id: index
    criticality: low
dependencies:
  - parent: web
    child: search
    type: soft
bindings:
  - service: index
    monitor_type: server
    monitor_ref: idx-01
suggested_dependencies:
  - parent: search
    child: index
    type: hard
    confidence: 95
    source: itam
active_alerts:
  - "server:idx-01|disk|/data"
"#;
    let file = SnapshotFile::from_yaml_str(yaml).unwrap();
    let engine = Engine::for_file(&file).unwrap();
    let report = engine
        .evaluate_prepared(&file.prepare(), Some("down_only"))
        .unwrap();

    assert_eq!(report.service("index").unwrap().health, Health::Down);
    // suggested hard edge does not propagate
    assert_eq!(report.service("search").unwrap().health, Health::Up);
    // but participates in visibility
    assert_eq!(report.view.visible_service_ids, vec!["web", "search", "index"]);
    assert_eq!(report.view.visible_edges.len(), 2);
}

#[test]
fn test_impact_directions() {
    let engine = Engine::default();
    let up = engine.impact(&chain(), &["B"], Direction::Upstream).unwrap();
    assert_eq!(up.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
    let down = engine.impact(&chain(), &["B"], Direction::Downstream).unwrap();
    assert_eq!(down.into_iter().collect::<Vec<_>>(), vec!["B", "C"]);
    let none: [&str; 0] = [];
    assert!(engine.impact(&chain(), &none, Direction::Upstream).unwrap().is_empty());
}

#[test]
fn test_stale_suggestion_does_not_fail_snapshot() {
    let yaml = r#"
services:
  - id: api
  - id: db
dependencies:
  - parent: api
    child: db
bindings:
  - service: db
    monitor_type: sqlserver
    monitor_ref: sql-01
    health: down
suggested_dependencies:
  - parent: api
    child: decommissioned-host
    confidence: 95
"#;
    let file = SnapshotFile::from_yaml_str(yaml).unwrap();
    let report = Engine::for_file(&file)
        .unwrap()
        .evaluate_prepared(&file.prepare(), None)
        .unwrap();

    assert_eq!(report.service("api").unwrap().health, Health::Impacted);
    assert!(report.warnings.contains(&Warning::SuggestionUnknownService {
        parent: "api".into(),
        child: "decommissioned-host".into(),
        missing: "decommissioned-host".into(),
    }));
}
