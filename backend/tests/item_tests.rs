//! Item master tests
//!
//! Covers the unit-inference heuristic, override merging, and the row
//! coercions used by the CSV bulk import.

use proptest::prelude::*;

use shared::{UnitInference, UnitOverrides, UnitRule};

fn rule(base: &str, purchase: Option<&str>) -> UnitRule {
    UnitRule {
        base_unit: base.to_string(),
        purchase_unit: purchase.map(str::to_string),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Name keywords carry more signal than the category
    #[test]
    fn test_name_keyword_beats_category() {
        let inference = UnitInference::builtin();
        assert_eq!(
            inference.infer("Whole Milk", Some("bakery")),
            rule("ltr", Some("carton"))
        );
    }

    /// Keyword matching is case-insensitive and substring-based
    #[test]
    fn test_keyword_matching_is_loose() {
        let inference = UnitInference::builtin();
        assert_eq!(
            inference.infer("SUNFLOWER OIL (5L)", None),
            rule("ltr", Some("bottle"))
        );
        assert_eq!(
            inference.infer("Basmati Rice Premium", None),
            rule("kg", Some("bag"))
        );
    }

    /// Category is the fallback signal when no keyword matches
    #[test]
    fn test_category_fallback() {
        let inference = UnitInference::builtin();
        assert_eq!(inference.infer("Paneer", Some("Dairy")), rule("ltr", Some("carton")));
        assert_eq!(inference.infer("Okra", Some("vegetables")), rule("kg", None));
    }

    /// Unknown items default to pieces with no purchase unit
    #[test]
    fn test_generic_fallback() {
        let inference = UnitInference::builtin();
        assert_eq!(inference.infer("Widget", None), rule("pcs", None));
        assert_eq!(inference.infer("", Some("unknown")), rule("pcs", None));
    }

    /// Overrides shadow built-ins and add new entries without erasing the
    /// rest of the defaults
    #[test]
    fn test_override_merging() {
        let yaml = r#"
name_keywords:
  milk:
    base_unit: ml
    purchase_unit: pouch
  saffron:
    base_unit: g
    purchase_unit: tin
categories:
  spices:
    base_unit: g
"#;
        let overrides: UnitOverrides = serde_yaml::from_str(yaml).unwrap();
        let inference = UnitInference::with_overrides(&overrides);

        // Shadowed built-in
        assert_eq!(inference.infer("Skim Milk", None), rule("ml", Some("pouch")));
        // New keyword
        assert_eq!(inference.infer("Saffron Threads", None), rule("g", Some("tin")));
        // New category
        assert_eq!(inference.infer("Star Anise", Some("Spices")), rule("g", None));
        // Untouched built-ins still apply
        assert_eq!(inference.infer("Bread Rolls", None), rule("pcs", Some("loaf")));
    }

    /// An empty override file changes nothing
    #[test]
    fn test_empty_overrides_are_noop() {
        let overrides: UnitOverrides = serde_yaml::from_str("{}").unwrap();
        let merged = UnitInference::with_overrides(&overrides);
        let builtin = UnitInference::builtin();
        for name in ["Whole Milk", "Flour", "Eggs", "Widget"] {
            assert_eq!(merged.infer(name, None), builtin.infer(name, None));
        }
    }

    /// The bulk import header the service expects
    #[test]
    fn test_import_columns() {
        let header = "name,base_unit,purchase_unit,category,sub_category,permitted_departments,reorder_point,current_stock,notes,is_active";
        assert_eq!(header.split(',').count(), 10);
        assert!(header.starts_with("name,"));
        assert!(header.ends_with(",is_active"));
    }

    /// The truthy coercions accepted in import files
    #[test]
    fn test_is_active_coercions() {
        let truthy = ["true", "1", "yes", "y", "TRUE", " Yes "];
        let falsy = ["false", "0", "no", "n", "FALSE"];
        for v in truthy {
            let norm = v.trim().to_lowercase();
            assert!(matches!(norm.as_str(), "true" | "1" | "yes" | "y"));
        }
        for v in falsy {
            let norm = v.trim().to_lowercase();
            assert!(matches!(norm.as_str(), "false" | "0" | "no" | "n"));
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn name_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z ]{0,30}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Inference is total: every input yields a non-empty base unit
        #[test]
        fn prop_inference_total(name in name_strategy(), category in name_strategy()) {
            let inference = UnitInference::builtin();
            let rule = inference.infer(&name, Some(&category));
            prop_assert!(!rule.base_unit.is_empty());
        }

        /// Inference is deterministic
        #[test]
        fn prop_inference_deterministic(name in name_strategy()) {
            let inference = UnitInference::builtin();
            prop_assert_eq!(inference.infer(&name, None), inference.infer(&name, None));
        }

        /// Case never changes the outcome
        #[test]
        fn prop_inference_case_insensitive(name in name_strategy()) {
            let inference = UnitInference::builtin();
            prop_assert_eq!(
                inference.infer(&name.to_uppercase(), None),
                inference.infer(&name.to_lowercase(), None)
            );
        }
    }
}
