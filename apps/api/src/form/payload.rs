//! Payload Assembler — turns a finished session into the report-generation input.
//!
//! `assemble` is a pure function of the answer snapshot and the identity: no clocks,
//! counters or ids are read, so repeated calls yield identical payloads.

use lettre::message::Mailbox;
use serde::Serialize;

use crate::form::answers::AnswerStore;
use crate::form::catalog::{
    admired_admire_id, admired_name_id, admired_reject_id, EMAIL, FIRST_NAME, HOLLAND,
    INDUSTRY_AVOID, LAST_NAME, TRAITS, VALUES,
};
use crate::form::errors::FormError;
use crate::form::AnswerSnapshot;

/// Separator used when joining multi-choice selections for display.
pub const DISPLAY_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Identity {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            email: email.into().trim().to_string(),
        }
    }

    /// Reads the contact fields collected on the final step.
    pub fn from_answers(snapshot: &AnswerSnapshot) -> Self {
        Self::new(
            snapshot.text(FIRST_NAME),
            snapshot.text(LAST_NAME),
            snapshot.text(EMAIL),
        )
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.first_name.is_empty() {
            return Err(FormError::IncompleteIdentity(
                "first name is required".to_string(),
            ));
        }
        if self.last_name.is_empty() {
            return Err(FormError::IncompleteIdentity(
                "last name is required".to_string(),
            ));
        }
        if self.email.is_empty() {
            return Err(FormError::IncompleteIdentity("email is required".to_string()));
        }
        // The mailer parses the recipient as a mailbox; refuse here what it would refuse later.
        if !is_basic_email(&self.email) || self.email.parse::<Mailbox>().is_err() {
            return Err(FormError::IncompleteIdentity(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        Ok(())
    }
}

/// `local@domain` with exactly one `@`, both sides non-empty, no whitespace.
fn is_basic_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Multi-choice selections, kept as a list plus a display-ready joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub items: Vec<String>,
    pub display: String,
}

impl Selection {
    fn from_items(items: &[String]) -> Self {
        Self {
            items: items.to_vec(),
            display: items.join(DISPLAY_SEPARATOR),
        }
    }
}

/// One admired-life slot. Unfilled parts are empty strings, never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmiredLife {
    pub slot: usize,
    pub name: String,
    pub admire: String,
    pub reject: String,
}

impl AdmiredLife {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.admire.is_empty() && self.reject.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitSelection {
    pub id: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    pub identity: Identity,
    pub holland: Selection,
    pub values: Selection,
    pub admired_lives: Vec<AdmiredLife>,
    pub traits: Vec<TraitSelection>,
    pub industries_to_avoid: String,
}

/// Builds the submission payload. Identity is checked first so nothing downstream
/// ever sees an incomplete contact.
pub fn assemble(store: &AnswerStore, identity: &Identity) -> Result<SubmissionPayload, FormError> {
    identity.validate()?;

    let snapshot = store.snapshot();

    let admired_lives = (1..=store.catalog().admired_life_slots())
        .map(|slot| AdmiredLife {
            slot,
            name: snapshot.text(&admired_name_id(slot)).to_string(),
            admire: snapshot.text(&admired_admire_id(slot)).to_string(),
            reject: snapshot.text(&admired_reject_id(slot)).to_string(),
        })
        .collect();

    let traits = TRAITS
        .iter()
        .map(|t| TraitSelection {
            id: t.id.to_string(),
            label: t.label.to_string(),
            value: snapshot.text(t.id).to_string(),
        })
        .collect();

    Ok(SubmissionPayload {
        identity: identity.clone(),
        holland: Selection::from_items(snapshot.choices(HOLLAND)),
        values: Selection::from_items(snapshot.choices(VALUES)),
        admired_lives,
        traits,
        industries_to_avoid: snapshot.text(INDUSTRY_AVOID).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::form::catalog::{StepCatalog, CORE_VALUES};
    use crate::form::fields::FieldValue;

    fn store(slots: usize) -> AnswerStore {
        AnswerStore::new(Arc::new(StepCatalog::holland_bridge(slots).unwrap()))
    }

    fn ada() -> Identity {
        Identity::new("Ada", "Lovelace", "ada@example.com")
    }

    fn choices(items: &[&str]) -> FieldValue {
        FieldValue::Choices(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let mut s = store(4);
        s.set(HOLLAND, choices(&["Social", "Artistic"])).unwrap();
        s.set("name_1", FieldValue::Text("Grace Hopper".to_string()))
            .unwrap();
        let a = serde_json::to_vec(&assemble(&s, &ada()).unwrap()).unwrap();
        let b = serde_json::to_vec(&assemble(&s, &ada()).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_email_is_incomplete() {
        let id = Identity::new("Ada", "Lovelace", "");
        assert!(matches!(
            assemble(&store(4), &id),
            Err(FormError::IncompleteIdentity(_))
        ));
    }

    #[test]
    fn test_email_without_at_is_incomplete() {
        let id = Identity::new("Ada", "Lovelace", "ada.example.com");
        assert!(matches!(
            assemble(&store(4), &id),
            Err(FormError::IncompleteIdentity(_))
        ));
    }

    #[test]
    fn test_address_the_mailer_would_refuse_is_incomplete() {
        let id = Identity::new("Ada", "Lovelace", "ada@exa(mple.com");
        assert!(is_basic_email(&id.email));
        assert!(matches!(
            assemble(&store(4), &id),
            Err(FormError::IncompleteIdentity(_))
        ));
    }

    #[test]
    fn test_missing_names_are_incomplete() {
        for id in [
            Identity::new("", "Lovelace", "ada@example.com"),
            Identity::new("Ada", "   ", "ada@example.com"),
        ] {
            assert!(matches!(
                assemble(&store(4), &id),
                Err(FormError::IncompleteIdentity(_))
            ));
        }
    }

    #[test]
    fn test_basic_email_shape() {
        assert!(is_basic_email("a@b"));
        assert!(!is_basic_email("@example.com"));
        assert!(!is_basic_email("ada@"));
        assert!(!is_basic_email("ada@@example.com"));
        assert!(!is_basic_email("ada lovelace@example.com"));
    }

    #[test]
    fn test_partial_admired_lives_are_preserved() {
        let mut s = store(3);
        s.set("name_2", FieldValue::Text("Marie Curie".to_string()))
            .unwrap();
        let payload = assemble(&s, &ada()).unwrap();
        assert_eq!(payload.admired_lives.len(), 3);
        assert!(payload.admired_lives[0].is_empty());
        assert_eq!(payload.admired_lives[1].name, "Marie Curie");
        assert_eq!(payload.admired_lives[1].admire, "");
        assert!(payload.admired_lives[2].is_empty());
        assert_eq!(payload.admired_lives[2].slot, 3);
    }

    #[test]
    fn test_selections_joined_only_in_payload() {
        let mut s = store(4);
        s.set(VALUES, choices(&CORE_VALUES[..5])).unwrap();
        let payload = assemble(&s, &ada()).unwrap();
        assert_eq!(payload.values.items.len(), 5);
        assert_eq!(
            payload.values.display,
            "Cosmos, Scope, Luminance, Workcentrism, Radius"
        );
        assert_eq!(s.get(VALUES).unwrap().as_choices().len(), 5);
    }

    #[test]
    fn test_traits_in_catalog_order() {
        let payload = assemble(&store(4), &ada()).unwrap();
        let ids: Vec<_> = payload.traits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "interpersonal",
                "timeframe",
                "workstyle",
                "inductive",
                "sequential",
                "spatial",
                "idea",
                "numeric"
            ]
        );
    }

    #[test]
    fn test_every_referenced_field_is_declared_once() {
        let catalog = StepCatalog::holland_bridge(4).unwrap();
        let mut referenced = vec![
            HOLLAND.to_string(),
            VALUES.to_string(),
            INDUSTRY_AVOID.to_string(),
            FIRST_NAME.to_string(),
            LAST_NAME.to_string(),
            EMAIL.to_string(),
        ];
        referenced.extend(TRAITS.iter().map(|t| t.id.to_string()));
        for slot in 1..=4 {
            referenced.push(admired_name_id(slot));
            referenced.push(admired_admire_id(slot));
            referenced.push(admired_reject_id(slot));
        }
        for id in referenced {
            let declared = catalog.fields().filter(|f| f.id == id).count();
            assert_eq!(declared, 1, "field {id}");
        }
    }
}
