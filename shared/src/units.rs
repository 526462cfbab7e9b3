//! Unit inference heuristic for inventory items
//!
//! Guesses a sensible base unit (and optional purchase unit) from an item's
//! name or category so staff can add items without filling in units every
//! time. A couple of keyword lookups with fallbacks, intentionally small
//! and deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A `(base_unit, purchase_unit)` suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRule {
    pub base_unit: String,
    #[serde(default)]
    pub purchase_unit: Option<String>,
}

impl UnitRule {
    fn new(base: &str, purchase: Option<&str>) -> Self {
        Self {
            base_unit: base.to_string(),
            purchase_unit: purchase.map(str::to_string),
        }
    }
}

/// Optional override file contents, merged over the built-in defaults.
///
/// Two named sections: `name_keywords` maps a keyword found in the item
/// name to a rule; `categories` maps an exact category to a rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitOverrides {
    #[serde(default)]
    pub name_keywords: BTreeMap<String, UnitRule>,
    #[serde(default)]
    pub categories: BTreeMap<String, UnitRule>,
}

/// Keyword tables used by [`UnitInference::infer`].
#[derive(Debug, Clone)]
pub struct UnitInference {
    name_keywords: Vec<(String, UnitRule)>,
    categories: BTreeMap<String, UnitRule>,
}

impl Default for UnitInference {
    fn default() -> Self {
        Self::builtin()
    }
}

impl UnitInference {
    /// The built-in defaults.
    pub fn builtin() -> Self {
        let name_keywords = [
            // Liquids
            ("milk", UnitRule::new("ltr", Some("carton"))),
            ("water", UnitRule::new("ltr", Some("bottle"))),
            ("oil", UnitRule::new("ltr", Some("bottle"))),
            // Dry goods
            ("flour", UnitRule::new("kg", Some("bag"))),
            ("rice", UnitRule::new("kg", Some("bag"))),
            ("sugar", UnitRule::new("kg", Some("bag"))),
            // Proteins / others
            ("egg", UnitRule::new("pcs", Some("dozen"))),
            ("bread", UnitRule::new("pcs", Some("loaf"))),
            ("apple", UnitRule::new("kg", Some("crate"))),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let categories = [
            ("dairy", UnitRule::new("ltr", Some("carton"))),
            ("beverage", UnitRule::new("ltr", Some("bottle"))),
            ("beverages", UnitRule::new("ltr", Some("bottle"))),
            ("produce", UnitRule::new("kg", None)),
            ("vegetable", UnitRule::new("kg", None)),
            ("vegetables", UnitRule::new("kg", None)),
            ("baking", UnitRule::new("kg", Some("bag"))),
            ("bakery", UnitRule::new("pcs", Some("loaf"))),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            name_keywords,
            categories,
        }
    }

    /// Built-in defaults with `overrides` merged on top.
    ///
    /// An override for an existing keyword or category replaces its rule;
    /// new keywords take precedence over the built-ins.
    pub fn with_overrides(overrides: &UnitOverrides) -> Self {
        let mut merged = Self::builtin();
        merged
            .name_keywords
            .retain(|(k, _)| !overrides.name_keywords.contains_key(k));
        let mut keywords: Vec<(String, UnitRule)> = overrides
            .name_keywords
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        keywords.append(&mut merged.name_keywords);
        merged.name_keywords = keywords;

        for (cat, rule) in &overrides.categories {
            merged.categories.insert(cat.to_lowercase(), rule.clone());
        }
        merged
    }

    /// Infer base and purchase units for an item.
    ///
    /// Keyword matches on the lowercase name win; the category is a
    /// secondary signal; the fallback is `("pcs", None)`.
    pub fn infer(&self, name: &str, category: Option<&str>) -> UnitRule {
        let name_l = name.to_lowercase();
        let category_l = category.unwrap_or("").to_lowercase();

        for (keyword, rule) in &self.name_keywords {
            if name_l.contains(keyword.as_str()) {
                return rule.clone();
            }
        }

        if let Some(rule) = self.categories.get(&category_l) {
            return rule.clone();
        }

        UnitRule::new("pcs", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_beats_category() {
        let inference = UnitInference::builtin();
        let rule = inference.infer("Whole Milk", Some("bakery"));
        assert_eq!(rule, UnitRule::new("ltr", Some("carton")));
    }

    #[test]
    fn category_used_when_no_keyword_matches() {
        let inference = UnitInference::builtin();
        let rule = inference.infer("Paneer", Some("Dairy"));
        assert_eq!(rule, UnitRule::new("ltr", Some("carton")));
    }

    #[test]
    fn fallback_is_pieces() {
        let inference = UnitInference::builtin();
        let rule = inference.infer("Widget", None);
        assert_eq!(rule, UnitRule::new("pcs", None));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut overrides = UnitOverrides::default();
        overrides
            .name_keywords
            .insert("milk".to_string(), UnitRule::new("ml", Some("pouch")));
        overrides
            .name_keywords
            .insert("saffron".to_string(), UnitRule::new("g", Some("tin")));
        overrides
            .categories
            .insert("spices".to_string(), UnitRule::new("g", None));

        let inference = UnitInference::with_overrides(&overrides);
        assert_eq!(
            inference.infer("Skim Milk", None),
            UnitRule::new("ml", Some("pouch"))
        );
        assert_eq!(
            inference.infer("Saffron Threads", None),
            UnitRule::new("g", Some("tin"))
        );
        assert_eq!(inference.infer("Star Anise", Some("Spices")), UnitRule::new("g", None));
        // Untouched built-ins survive the merge.
        assert_eq!(
            inference.infer("Basmati Rice", None),
            UnitRule::new("kg", Some("bag"))
        );
    }
}
