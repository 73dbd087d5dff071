//! Field declarations and the values stored against them.
//!
//! Every field has an explicit default so reads never observe a missing key.

use serde::{Deserialize, Serialize};

use crate::form::errors::FormError;

/// Upper bound for single-line inputs (names, email).
pub const SHORT_TEXT_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Exactly one of `options`. Defaults to the first option.
    SingleChoice { options: &'static [&'static str] },
    /// An ordered subset of `options`. `max_selections` is a hard cap checked on
    /// every write; `min_selections` is only checked when leaving the step.
    MultiChoice {
        options: &'static [&'static str],
        max_selections: usize,
        min_selections: usize,
    },
    FreeText,
    ShortText,
}

/// A stored answer. Multi-choice fields keep their selections as a list;
/// joining for display happens only in the payload assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Choices(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Choices(_) => "",
        }
    }

    pub fn as_choices(&self) -> &[String] {
        match self {
            FieldValue::Choices(items) => items,
            FieldValue::Text(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDecl {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    pub fn default_value(&self) -> FieldValue {
        match &self.kind {
            FieldKind::SingleChoice { options } => {
                FieldValue::Text(options.first().map(|o| o.to_string()).unwrap_or_default())
            }
            FieldKind::MultiChoice { .. } => FieldValue::Choices(Vec::new()),
            FieldKind::FreeText | FieldKind::ShortText => FieldValue::Text(String::new()),
        }
    }

    /// Checks a candidate value against this field's type and cardinality.
    pub fn validate(&self, value: &FieldValue) -> Result<(), FormError> {
        match (&self.kind, value) {
            (FieldKind::SingleChoice { options }, FieldValue::Text(choice)) => {
                if !options.contains(&choice.as_str()) {
                    return Err(FormError::violation(
                        &self.id,
                        format!("'{choice}' is not one of {}", options.join(", ")),
                    ));
                }
                Ok(())
            }
            (
                FieldKind::MultiChoice {
                    options,
                    max_selections,
                    ..
                },
                FieldValue::Choices(items),
            ) => {
                if items.len() > *max_selections {
                    return Err(FormError::violation(
                        &self.id,
                        format!(
                            "select at most {max_selections} (got {})",
                            items.len()
                        ),
                    ));
                }
                for (i, item) in items.iter().enumerate() {
                    if !options.contains(&item.as_str()) {
                        return Err(FormError::violation(
                            &self.id,
                            format!("'{item}' is not a valid option"),
                        ));
                    }
                    if items[..i].contains(item) {
                        return Err(FormError::violation(
                            &self.id,
                            format!("'{item}' is selected more than once"),
                        ));
                    }
                }
                Ok(())
            }
            (FieldKind::ShortText, FieldValue::Text(text)) => {
                if text.chars().count() > SHORT_TEXT_MAX_CHARS {
                    return Err(FormError::violation(
                        &self.id,
                        format!("must be at most {SHORT_TEXT_MAX_CHARS} characters"),
                    ));
                }
                if text.contains(['\n', '\r']) {
                    return Err(FormError::violation(&self.id, "must be a single line"));
                }
                Ok(())
            }
            (FieldKind::FreeText, FieldValue::Text(_)) => Ok(()),
            (FieldKind::MultiChoice { .. }, FieldValue::Text(_)) => Err(FormError::violation(
                &self.id,
                "expected a list of selections",
            )),
            (_, FieldValue::Choices(_)) => {
                Err(FormError::violation(&self.id, "expected a single text value"))
            }
        }
    }

    /// Selections still missing before the owning step may be left.
    pub fn check_minimum(&self, value: &FieldValue) -> Result<(), FormError> {
        if let FieldKind::MultiChoice { min_selections, .. } = &self.kind {
            let got = value.as_choices().len();
            if got < *min_selections {
                return Err(FormError::violation(
                    &self.id,
                    format!("select at least {min_selections} (got {got})"),
                ));
            }
        }
        Ok(())
    }
}
