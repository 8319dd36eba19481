#[cfg(test)]
mod tests {
    use lantern::model::{Diagnostic, DuplicatePolicy, Report, ReportOptions, UsageState};
    use lantern::LayoutError;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Layout document with the given sections and model-extension
    /// entities, with the config embedded as a JSON string the way the
    /// real documents carry it.
    fn layout(sections: Vec<Value>, entities: Value) -> Value {
        json!({
            "sections": sections,
            "config": json!({"modelExtensions": [{"entities": entities}]}).to_string(),
            "filters": "[]",
        })
    }

    fn section(name: &str, display_name: &str, ordinal: i64, visuals: Vec<Value>) -> Value {
        json!({
            "name": name,
            "displayName": display_name,
            "ordinal": ordinal,
            "displayOption": 1,
            "visualContainers": visuals,
        })
    }

    /// A visual projecting a single query reference.
    fn visual_projecting(query_ref: &str) -> Value {
        json!({
            "x": 0.0, "y": 0.0, "width": 100.0, "height": 100.0,
            "config": json!({
                "name": "vc1",
                "singleVisual": {
                    "visualType": "barChart",
                    "projections": {"Values": [{"queryRef": query_ref}]}
                }
            }).to_string(),
        })
    }

    fn measure(name: &str, expression: &str) -> Value {
        json!({"name": name, "expression": expression})
    }

    #[test]
    fn test_directly_used_measure_links_to_page() {
        let layout = layout(
            vec![section(
                "ReportSection1",
                "Overview",
                0,
                vec![visual_projecting("Sales.Total")],
            )],
            json!([{"name": "Sales", "measures": [measure("Total", "SUM(Sales.Revenue)")]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        let total = report.measure("Sales[Total]").unwrap();
        assert_eq!(total.usage_state, UsageState::DirectlyUsed);

        let page = &report.pages[0];
        assert!(page.used_measures.contains("Sales[Total]"));
        assert!(total.used_in_pages.contains(&page.key()));
    }

    #[test]
    fn test_unused_chain_is_dangling_or_unreferenced() {
        // A references B[X]; nothing references A; no page uses either.
        let layout = layout(
            vec![section("s1", "Empty", 0, vec![])],
            json!([
                {"name": "Sales", "measures": [measure("A", "DIVIDE(B[X], 2)")]},
                {"name": "B", "measures": [measure("X", "SUM(B.Val)")]}
            ]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        let a = report.measure("Sales[A]").unwrap();
        let x = report.measure("B[X]").unwrap();
        assert_eq!(a.usage_state, UsageState::Unreferenced);
        assert_eq!(x.usage_state, UsageState::Dangling);
        assert!(x.referenced_by.contains("Sales[A]"));
        assert!(a.referenced_by.is_empty());
    }

    #[test]
    fn test_indirect_usage_propagates_through_chain() {
        // C is on a page; C references D; D references E.
        let layout = layout(
            vec![section(
                "s1",
                "Overview",
                0,
                vec![visual_projecting("Sales.C")],
            )],
            json!([{"name": "Sales", "measures": [
                measure("C", "Sales[D] * 2"),
                measure("D", "Sales[E] + 1"),
                measure("E", "SUM(Sales.Revenue)")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        assert_eq!(
            report.measure("Sales[C]").unwrap().usage_state,
            UsageState::DirectlyUsed
        );
        assert_eq!(
            report.measure("Sales[D]").unwrap().usage_state,
            UsageState::IndirectlyUsed
        );
        assert_eq!(
            report.measure("Sales[E]").unwrap().usage_state,
            UsageState::IndirectlyUsed
        );
    }

    #[test]
    fn test_cyclic_dependencies_terminate() {
        // A and B reference each other; A is on a page.
        let layout = layout(
            vec![section(
                "s1",
                "Overview",
                0,
                vec![visual_projecting("Sales.A")],
            )],
            json!([{"name": "Sales", "measures": [
                measure("A", "Sales[B] + 1"),
                measure("B", "Sales[A] + 1")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        assert_eq!(
            report.measure("Sales[A]").unwrap().usage_state,
            UsageState::DirectlyUsed
        );
        assert_eq!(
            report.measure("Sales[B]").unwrap().usage_state,
            UsageState::IndirectlyUsed
        );
    }

    #[test]
    fn test_dangling_requires_no_used_referrer() {
        // Dangling measures must only be referenced by unused measures.
        let layout = layout(
            vec![section("s1", "Empty", 0, vec![])],
            json!([{"name": "Sales", "measures": [
                measure("Parent", "Sales[Child] * 2"),
                measure("Child", "SUM(Sales.Revenue)")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        let child = report.measure("Sales[Child]").unwrap();
        assert_eq!(child.usage_state, UsageState::Dangling);
        for referrer in &child.referenced_by {
            let state = report.measure(referrer).unwrap().usage_state;
            assert_ne!(state, UsageState::DirectlyUsed);
            assert_ne!(state, UsageState::IndirectlyUsed);
        }
    }

    #[test]
    fn test_structured_references_are_unioned() {
        // The expression hides the entity ("[Base]"), but the structured
        // reference block names it.
        let layout = layout(
            vec![section("s1", "Empty", 0, vec![])],
            json!([{"name": "Sales", "measures": [
                {
                    "name": "Derived",
                    "expression": "DIVIDE([Base], 100)",
                    "references": {"measures": [{"entity": "Sales", "name": "Base"}]}
                },
                measure("Base", "SUM(Sales.Revenue)")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        let derived = report.measure("Sales[Derived]").unwrap();
        assert!(derived.referenced_measures.contains("Sales[Base]"));
        assert_eq!(
            report.measure("Sales[Base]").unwrap().usage_state,
            UsageState::Dangling
        );
    }

    #[test]
    fn test_unresolved_reference_is_a_diagnostic_not_an_edge() {
        let layout = layout(
            vec![section("s1", "Empty", 0, vec![])],
            json!([{"name": "Sales", "measures": [
                measure("A", "Other[Missing] + 1")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        assert_eq!(report.graph().edge_count(), 0);
        assert!(report.diagnostics.iter().any(|diagnostic| matches!(
            diagnostic,
            Diagnostic::UnresolvedReference { measure, reference }
                if measure == "Sales[A]" && reference == "Other[Missing]"
        )));
    }

    #[test]
    fn test_graph_queries() {
        let layout = layout(
            vec![section("s1", "Empty", 0, vec![])],
            json!([{"name": "Sales", "measures": [
                measure("A", "Sales[B] + Sales[C]"),
                measure("B", "1"),
                measure("C", "1")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        assert_eq!(
            report.graph().dependencies_of("Sales[A]"),
            vec!["Sales[B]", "Sales[C]"]
        );
        assert_eq!(report.graph().dependents_of("Sales[B]"), vec!["Sales[A]"]);
    }

    #[test]
    fn test_no_model_extension_means_no_measures() {
        let layout = json!({
            "sections": [section("s1", "Overview", 0, vec![])],
        });
        let report = Report::from_value("demo", layout).unwrap();
        assert!(report.measures.is_empty());
        assert_eq!(report.pages.len(), 1);
    }

    #[test]
    fn test_duplicate_measures_last_write_wins_by_default() {
        let layout = layout(
            vec![],
            json!([{"name": "Sales", "measures": [
                measure("Total", "1"),
                measure("Total", "2")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        assert_eq!(report.measure("Sales[Total]").unwrap().expression, "2");
        assert!(report.diagnostics.iter().any(|diagnostic| matches!(
            diagnostic,
            Diagnostic::DuplicateMeasure { full_name } if full_name == "Sales[Total]"
        )));
    }

    #[test]
    fn test_duplicate_measures_reject_policy_fails_construction() {
        let layout = layout(
            vec![],
            json!([{"name": "Sales", "measures": [
                measure("Total", "1"),
                measure("Total", "2")
            ]}]),
        );
        let options = ReportOptions {
            duplicate_measures: DuplicatePolicy::Reject,
        };
        let result = Report::from_value_with_options("demo", layout, options);
        assert!(matches!(
            result,
            Err(LayoutError::DuplicateMeasure(name)) if name == "Sales[Total]"
        ));
    }

    #[test]
    fn test_undecodable_report_aborts_only_that_report() {
        let good = layout(vec![section("s1", "Overview", 0, vec![])], json!([]));
        let bad = json!({"sections": [], "config": "{broken json"});

        let reports: Vec<Report> = [("good", good), ("bad", bad)]
            .into_iter()
            .filter_map(|(name, document)| Report::from_value(name, document).ok())
            .collect();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].name, "good");
    }

    #[test]
    fn test_comment_metadata_lands_on_measure() {
        let expression =
            "/*\n* Author: Jane Doe\n* Description: Net sales\n* Last change: 2025-06-01\n*/\nSUM(Sales.Revenue)";
        let layout = layout(
            vec![],
            json!([{"name": "Sales", "measures": [measure("Net", expression)]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        let net = report.measure("Sales[Net]").unwrap();
        assert_eq!(net.author.as_deref(), Some("Jane Doe"));
        assert_eq!(net.description.as_deref(), Some("Net sales"));
        assert_eq!(net.last_change.as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn test_description_backfill_round_trip() {
        let layout = layout(
            vec![],
            json!([{"name": "Sales", "measures": [
                measure("A", "1"),
                measure("B", "2")
            ]}]),
        );
        let mut report = Report::from_value("demo", layout).unwrap();

        let pending = report.measures_without_description();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].name, "Sales[A]");

        let descriptions: HashMap<String, String> = [
            ("Sales[A]".to_string(), "Counts things".to_string()),
            ("Sales[Unknown]".to_string(), "Ignored".to_string()),
        ]
        .into();
        assert_eq!(report.apply_measure_descriptions(&descriptions), 1);
        assert_eq!(
            report.measure("Sales[A]").unwrap().description.as_deref(),
            Some("Counts things")
        );
        assert_eq!(report.measures_without_description().len(), 1);
    }

    #[test]
    fn test_every_measure_has_exactly_one_state() {
        let layout = layout(
            vec![section(
                "s1",
                "Overview",
                0,
                vec![visual_projecting("Sales.C")],
            )],
            json!([{"name": "Sales", "measures": [
                measure("C", "Sales[D]"),
                measure("D", "1"),
                measure("Lonely", "1"),
                measure("Dead", "Sales[Deader]"),
                measure("Deader", "1")
            ]}]),
        );
        let report = Report::from_value("demo", layout).unwrap();

        for page in &report.pages {
            for full_name in &page.used_measures {
                assert_eq!(
                    report.measure(full_name).unwrap().usage_state,
                    UsageState::DirectlyUsed
                );
            }
        }
        assert_eq!(
            report.measure("Sales[Lonely]").unwrap().usage_state,
            UsageState::Unreferenced
        );
        assert_eq!(
            report.measure("Sales[Dead]").unwrap().usage_state,
            UsageState::Unreferenced
        );
        assert_eq!(
            report.measure("Sales[Deader]").unwrap().usage_state,
            UsageState::Dangling
        );
    }
}
