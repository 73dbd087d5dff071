//! Answer Store — per-session mapping from field id to its current value.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::form::catalog::StepCatalog;
use crate::form::errors::FormError;
use crate::form::fields::FieldValue;

/// Immutable copy of every field id → value pair, ordered by field id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerSnapshot(BTreeMap<String, FieldValue>);

impl AnswerSnapshot {
    /// Text value of `id`, or the empty string for list-valued or absent fields.
    pub fn text(&self, id: &str) -> &str {
        self.0.get(id).map(FieldValue::as_text).unwrap_or("")
    }

    pub fn choices(&self, id: &str) -> &[String] {
        self.0.get(id).map(FieldValue::as_choices).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone)]
pub struct AnswerStore {
    catalog: Arc<StepCatalog>,
    values: BTreeMap<String, FieldValue>,
}

impl AnswerStore {
    /// Creates a store with every declared field set to its type default.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        let values = catalog
            .fields()
            .map(|f| (f.id.clone(), f.default_value()))
            .collect();
        Self { catalog, values }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn get(&self, id: &str) -> Result<&FieldValue, FormError> {
        self.values
            .get(id)
            .ok_or_else(|| FormError::UnknownField(id.to_string()))
    }

    /// Overwrites the value of `id` after validating it against the field's declaration.
    /// A rejected value leaves the previous one in place.
    pub fn set(&mut self, id: &str, value: FieldValue) -> Result<(), FormError> {
        let (decl, _) = self
            .catalog
            .field(id)
            .ok_or_else(|| FormError::UnknownField(id.to_string()))?;
        decl.validate(&value)?;
        self.values.insert(id.to_string(), value);
        Ok(())
    }

    pub fn snapshot(&self) -> AnswerSnapshot {
        AnswerSnapshot(self.values.clone())
    }

    /// Checks every minimum-selection constraint declared by step `ordinal`.
    pub fn check_step(&self, ordinal: usize) -> Result<(), FormError> {
        let Some(step) = self.catalog.step(ordinal) else {
            return Ok(());
        };
        for field in &step.fields {
            field.check_minimum(self.get(&field.id)?)?;
        }
        Ok(())
    }

    /// Checks the minimum-selection constraints of every step.
    pub fn check_all_steps(&self) -> Result<(), FormError> {
        (1..=self.catalog.len()).try_for_each(|s| self.check_step(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::catalog::{CORE_VALUES, HOLLAND, VALUES};

    fn store() -> AnswerStore {
        AnswerStore::new(Arc::new(StepCatalog::holland_bridge(4).unwrap()))
    }

    fn choices(items: &[&str]) -> FieldValue {
        FieldValue::Choices(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_every_field_has_a_default() {
        let s = store();
        assert_eq!(s.get(HOLLAND).unwrap(), &FieldValue::Choices(vec![]));
        assert_eq!(s.get("admire_2").unwrap(), &FieldValue::Text(String::new()));
        assert_eq!(
            s.get("interpersonal").unwrap(),
            &FieldValue::Text("Introvert".to_string())
        );
        assert_eq!(s.snapshot().len(), s.catalog().fields().count());
    }

    #[test]
    fn test_get_unknown_field() {
        assert_eq!(
            store().get("favourite_color"),
            Err(FormError::UnknownField("favourite_color".to_string()))
        );
    }

    #[test]
    fn test_set_exactly_at_max_succeeds() {
        let mut s = store();
        s.set(HOLLAND, choices(&["Realistic", "Artistic", "Social"]))
            .unwrap();
        assert_eq!(s.get(HOLLAND).unwrap().as_choices().len(), 3);
    }

    #[test]
    fn test_set_over_max_fails_and_keeps_previous_value() {
        let mut s = store();
        s.set(HOLLAND, choices(&["Social"])).unwrap();
        let err = s
            .set(
                HOLLAND,
                choices(&["Realistic", "Artistic", "Social", "Conventional"]),
            )
            .unwrap_err();
        assert!(matches!(err, FormError::ConstraintViolation { .. }));
        assert_eq!(s.get(HOLLAND).unwrap(), &choices(&["Social"]));
    }

    #[test]
    fn test_selections_stay_structured() {
        let mut s = store();
        s.set(HOLLAND, choices(&["Investigative", "Artistic"]))
            .unwrap();
        assert_eq!(
            s.snapshot().choices(HOLLAND),
            &["Investigative".to_string(), "Artistic".to_string()]
        );
    }

    #[test]
    fn test_check_step_enforces_minimum() {
        let mut s = store();
        s.set(VALUES, choices(&CORE_VALUES[..4])).unwrap();
        assert!(s.check_step(2).is_err());
        s.set(VALUES, choices(&CORE_VALUES[..5])).unwrap();
        assert!(s.check_step(2).is_ok());
        assert!(s.check_all_steps().is_ok());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut s = store();
        let before = s.snapshot();
        s.set("industry_avoid", FieldValue::Text("Tobacco".to_string()))
            .unwrap();
        assert_eq!(before.text("industry_avoid"), "");
        assert_eq!(s.snapshot().text("industry_avoid"), "Tobacco");
    }
}
