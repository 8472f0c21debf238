use docgraph_core::graph::{EdgeType, NodeType};
use docgraph_core::store::{CrossReference, ValidityRange};
use docgraph_core::store::{LookupMethod, VariableRole};
use docgraph_core::{
    ConceptRegistry, DataDependency, DependencyDetector, DetectionReport, DetectorConfig, Equation, FactorWeights,
    KnowledgeGraphBuilder, Table, ValidationStatus,
};

fn conductivity_table() -> Table {
    Table::new("3", &["Material", "Thermal Conductivity (k), W/m·K"])
        .on_page(12, Some("2.2"))
        .with_caption("Thermal conductivity of selected solids")
        .with_row(vec!["Copper".into(), 401.0.into()])
        .with_row(vec!["Aluminum".into(), 237.0.into()])
        .with_row(vec!["Carbon steel".into(), 60.5.into()])
        .with_row(vec!["Stainless steel".into(), 14.9.into()])
        .with_row(vec!["Glass".into(), 1.4.into()])
}

fn material_table() -> Table {
    Table::new("7", &["Material"])
        .with_row(vec!["Polished aluminum".into()])
        .with_row(vec!["Oxidized steel".into()])
        .with_row(vec!["Brick".into()])
}

fn temperature_table() -> Table {
    Table::new("5", &["Temperature (T), °C"])
        .with_validity(ValidityRange::new(0.0, 100.0, Some("°C")))
        .with_row(vec![0.0.into()])
        .with_row(vec![20.0.into()])
        .with_row(vec![40.0.into()])
        .with_row(vec![60.0.into()])
        .with_row(vec![80.0.into()])
}

fn fourier() -> Equation {
    Equation::new("9", "q = -k dT/dx").on_page(11, Some("2.1"))
}

fn radiation() -> Equation {
    Equation::new("14", "q'' = ε σ (T_s^4 - T_sur^4)").on_page(30, Some("3.4"))
}

fn convection() -> Equation {
    Equation::new("6", "q = h A (T_s - T)").with_variable_unit("T", "K")
}

fn detect(equations: &[Equation], tables: &[Table]) -> DetectionReport {
    let registry = ConceptRegistry::standard();
    let detector = DependencyDetector::new(&registry, DetectorConfig::default()).unwrap();
    detector.detect(equations, tables)
}

#[test]
fn test_conductivity_column_is_linked_for_interpolation() {
    let report = detect(&[fourier()], &[conductivity_table()]);

    assert_eq!(report.dependencies.len(), 1);
    let dependency = &report.dependencies[0];
    assert_eq!(dependency.confidence.factors.symbol_exact_match, 1.0);

    let linkage = &dependency.variable_linkage[0];
    assert_eq!(linkage.symbol, "k");
    assert_eq!(linkage.units.table_units.as_deref(), Some("W/m·K"));
    assert_eq!(linkage.lookup_method, LookupMethod::LinearInterpolate);
    assert_eq!(linkage.lookup_key_column.as_deref(), Some("Material"));
    assert_eq!(linkage.equation_role, VariableRole::Parameter);
}

#[test]
fn test_emissivity_is_not_linked_to_material_names() {
    let report = detect(&[radiation()], &[material_table()]);

    assert!(report.dependencies.is_empty());
    let epsilon = report.candidates.iter().find(|c| c.symbol == "ε").unwrap();
    assert!(epsilon.confidence.factors.dimensional_consistency <= 0.5);
    assert!(epsilon.confidence.score() < 0.75);
    assert!(!epsilon.accepted);
}

#[test]
fn test_celsius_table_feeds_kelvin_equation() {
    let report = detect(&[convection()], &[temperature_table()]);

    assert_eq!(report.dependencies.len(), 1);
    let dependency = &report.dependencies[0];
    assert_eq!(dependency.relationship_id, "rel:6:5:T");
    assert_eq!(dependency.status(), ValidationStatus::Pass);

    let units = &dependency.variable_linkage[0].units;
    assert_eq!(units.equation_units.as_deref(), Some("K"));
    assert_eq!(units.table_units.as_deref(), Some("°C"));
    assert!(units.conversion_needed);
    assert!((units.conversion_factor.unwrap() - 1.0).abs() < 1e-12);
    assert!((units.conversion_offset.unwrap() - 273.15).abs() < 1e-9);
}

#[test]
fn test_dangling_reference_is_named() {
    let mut builder = KnowledgeGraphBuilder::new();
    builder.register_equation(&fourier());
    builder.add_cross_reference(&CrossReference {
        source: "eq:9".to_string(),
        target: "tbl:99".to_string(),
        page: Some(11),
        section: None,
        context: Some("values are listed in Table 99".to_string()),
    });

    let err = builder.build().unwrap_err();
    assert_eq!(err.missing_nodes(), vec!["tbl:99"]);
    assert!(err.to_string().contains("tbl:99"));
}

#[test]
fn test_accepted_relationships_hold_their_invariants() {
    let equations = [fourier(), radiation(), convection(), Equation::new("20", "R = L / (k A)")];
    let tables = [conductivity_table(), material_table(), temperature_table()];
    let report = detect(&equations, &tables);
    let weights = FactorWeights::default();

    assert!(!report.dependencies.is_empty());
    for dependency in &report.dependencies {
        assert_ne!(dependency.status(), ValidationStatus::Fail);
        assert!(dependency.confidence.score() >= 0.75);
        assert!(dependency.confidence.is_consistent_with(&weights));
        assert_eq!(dependency.edge_type, EdgeType::RequiresDataFrom);
    }
    for rejection in &report.rejected {
        assert_eq!(rejection.validation.overall_status, ValidationStatus::Fail);
    }
    let counted: usize = report.statistics.by_validation_status.values().sum();
    assert_eq!(counted, report.dependencies.len() + report.rejected.len());
    assert_eq!(report.statistics.by_confidence["<0.75"], 0);
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let equations = [fourier(), radiation(), convection()];
    let tables = [conductivity_table(), material_table(), temperature_table()];
    let first = detect(&equations, &tables).to_json().unwrap();
    let second = detect(&equations, &tables).to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_score_tie_goes_to_first_column() {
    let table = Table::new("8", &["Material", "Thermal Conductivity (k), W/m·K", "Thermal Conductivity (k), W/m·K"])
        .with_row(vec!["Copper".into(), 401.0.into(), 401.0.into()])
        .with_row(vec!["Aluminum".into(), 237.0.into(), 237.0.into()])
        .with_row(vec!["Glass".into(), 1.4.into(), 1.4.into()]);
    let report = detect(&[fourier()], &[table]);

    assert_eq!(report.dependencies.len(), 1);
    assert_eq!(report.dependencies[0].variable_linkage[0].table_column_index, 1);
    let k: Vec<_> = report.candidates.iter().filter(|c| c.symbol == "k").collect();
    assert_eq!(k.len(), 3);
    assert_eq!(k[1].confidence.score(), k[2].confidence.score());
    assert!(k[1].accepted && !k[2].accepted);
}

#[test]
fn test_detected_dependencies_build_a_consistent_graph() {
    let equations = [fourier(), convection()];
    let tables = [conductivity_table(), temperature_table()];
    let report = detect(&equations, &tables);

    let mut builder = KnowledgeGraphBuilder::new();
    for equation in &equations {
        builder.register_equation(equation);
    }
    for table in &tables {
        builder.register_table(table);
    }
    assert_eq!(builder.add_dependencies(&report.dependencies), report.dependencies.len());
    let graph = builder.build().unwrap();

    for edge in graph.edges() {
        assert!(graph.contains(&edge.source));
        assert!(graph.contains(&edge.target));
    }
    let metrics = graph.metrics();
    assert_eq!(metrics.nodes_by_type[&NodeType::Equation], 2);
    assert_eq!(metrics.edges_by_type[&EdgeType::RequiresDataFrom], report.dependencies.len());
    assert_eq!(metrics.edges_by_type[&EdgeType::ProvidesDataFor], report.dependencies.len());
    assert_eq!(graph.node("tbl:3").unwrap().metadata.page, Some(12));
}

#[test]
fn test_removing_a_linked_table_breaks_integrity() {
    let report = detect(&[fourier()], &[conductivity_table()]);
    let mut builder = KnowledgeGraphBuilder::new();
    builder.add_dependencies(&report.dependencies);
    assert!(builder.remove_node("tbl:3").is_some());

    let err = builder.build().unwrap_err();
    assert_eq!(err.missing_nodes(), vec!["tbl:3"]);
}

#[test]
fn test_counting_caption_is_not_a_validity_range() {
    let table = conductivity_table().with_caption("Thermal conductivity for 12 metals and 4 alloys");
    let report = detect(&[fourier()], &[table]);

    assert_eq!(report.dependencies.len(), 1);
    let validation = &report.dependencies[0].validation;
    assert_eq!(validation.check("range_applicability").unwrap().status, ValidationStatus::Warn);
    assert_eq!(validation.overall_status, ValidationStatus::Warn);
}

#[test]
fn test_reversed_json_range_is_read_in_order() {
    let table: Table = serde_json::from_str(
        r#"{
            "table_id": "5",
            "headers": ["Temperature (T), K"],
            "data": [[300.0], [500.0], [700.0], [1000.0]],
            "validity": {"min": 1000, "max": 300, "units": "K"}
        }"#,
    )
    .unwrap();
    let equation = convection().with_operating_range(ValidityRange::new(400.0, 600.0, Some("K")));
    let report = detect(&[equation], &[table]);

    assert!(report.rejected.is_empty());
    assert_eq!(report.dependencies.len(), 1);
    let check = report.dependencies[0].validation.check("range_applicability").unwrap();
    assert_eq!(check.status, ValidationStatus::Pass);
}

#[test]
fn test_tampered_score_is_caught_after_deserializing() {
    let report = detect(&[fourier()], &[conductivity_table()]);
    let weights = FactorWeights::default();
    let original = &report.dependencies[0];
    assert!(original.check_confidence(&weights).is_ok());

    let mut json = serde_json::to_value(original).unwrap();
    json["confidence"]["score"] = serde_json::json!(0.5);
    let tampered: DataDependency = serde_json::from_value(json).unwrap();
    let err = tampered.check_confidence(&weights).unwrap_err();
    assert_eq!(err.relationship_id, "rel:9:3:k");
    assert_eq!(err.score, 0.5);
}
