//! Step Definitions — the fixed, ordered field catalog of the Holland Bridge questionnaire.
//!
//! The catalog is plain data built once at startup and shared read-only. The stepper
//! only knows how many steps exist, so adding or removing a step or field here
//! needs no change anywhere else except the payload assembler's field references.
//!
//! Field ids are a compatibility surface: report prompts are built from them.

use std::collections::HashMap;

use serde::Serialize;

use crate::form::errors::FormError;
use crate::form::fields::{FieldDecl, FieldKind};

pub const HOLLAND: &str = "holland";
pub const VALUES: &str = "values";
pub const INDUSTRY_AVOID: &str = "industry_avoid";
pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
pub const EMAIL: &str = "email";

pub const DEFAULT_ADMIRED_LIFE_SLOTS: usize = 4;

pub const HOLLAND_CODES: &[&str] = &[
    "Realistic",
    "Investigative",
    "Artistic",
    "Social",
    "Enterprising",
    "Conventional",
];
pub const MAX_HOLLAND_CODES: usize = 3;

pub const CORE_VALUES: &[&str] = &[
    "Cosmos",
    "Scope",
    "Luminance",
    "Workcentrism",
    "Radius",
    "Non Sibi",
    "Agency",
    "Achievement",
    "Voice",
    "Beholderism",
    "Belonging",
    "Familycentrism",
    "Place",
    "Eudemonia",
    "Affluence",
];
pub const CORE_VALUE_COUNT: usize = 5;

/// One aptitude trait: a fixed three-option assessment.
#[derive(Debug, Clone, Copy)]
pub struct TraitSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub options: &'static [&'static str],
}

pub const TRAITS: &[TraitSpec] = &[
    TraitSpec {
        id: "interpersonal",
        label: "Interpersonal Style",
        options: &["Introvert", "Blended Energizer", "Extrovert"],
    },
    TraitSpec {
        id: "timeframe",
        label: "Timeframe Orientation",
        options: &["Future Focuser", "Balanced Focuser", "Present Focuser"],
    },
    TraitSpec {
        id: "workstyle",
        label: "Work Approach",
        options: &["Generalist", "Liaison", "Specialist"],
    },
    TraitSpec {
        id: "inductive",
        label: "Inductive Reasoning",
        options: &["Diagnostic Problem Solver", "Investigator", "Fact Checker"],
    },
    TraitSpec {
        id: "sequential",
        label: "Sequential Reasoning",
        options: &[
            "Sequential Thinker",
            "Collaborative Planner",
            "Process Supporter",
        ],
    },
    TraitSpec {
        id: "spatial",
        label: "Spatial Visualization",
        options: &["3D Visualizer", "Space Planner", "Abstract Thinker"],
    },
    TraitSpec {
        id: "idea",
        label: "Idea Generation",
        options: &["Brainstormer", "Idea Contributor", "Concentrated Focuser"],
    },
    TraitSpec {
        id: "numeric",
        label: "Numerical Reasoning",
        options: &[
            "Numerical Detective",
            "Numerical Predictor",
            "Numerical Checker",
        ],
    },
];

pub fn admired_name_id(slot: usize) -> String {
    format!("name_{slot}")
}

pub fn admired_admire_id(slot: usize) -> String {
    format!("admire_{slot}")
}

pub fn admired_reject_id(slot: usize) -> String {
    format!("reject_{slot}")
}

#[derive(Debug, Clone, Serialize)]
pub struct StepDef {
    pub ordinal: usize,
    pub title: String,
    pub fields: Vec<FieldDecl>,
}

/// Read-only registry of steps indexed 1..=K.
#[derive(Debug, Clone, Serialize)]
pub struct StepCatalog {
    steps: Vec<StepDef>,
    admired_life_slots: usize,
    #[serde(skip)]
    owners: HashMap<String, usize>,
}

impl StepCatalog {
    /// Builds a catalog, checking that ordinals run 1..=K and that every field id
    /// is declared by exactly one step.
    pub fn new(steps: Vec<StepDef>, admired_life_slots: usize) -> Result<Self, FormError> {
        if steps.is_empty() {
            return Err(FormError::InvalidCatalog("no steps declared".to_string()));
        }

        let mut owners = HashMap::new();
        for (i, step) in steps.iter().enumerate() {
            if step.ordinal != i + 1 {
                return Err(FormError::InvalidCatalog(format!(
                    "step at position {} has ordinal {}",
                    i + 1,
                    step.ordinal
                )));
            }
            for field in &step.fields {
                if let Some(prev) = owners.insert(field.id.clone(), step.ordinal) {
                    return Err(FormError::InvalidCatalog(format!(
                        "field '{}' declared by steps {prev} and {}",
                        field.id, step.ordinal
                    )));
                }
            }
        }

        Ok(Self {
            steps,
            admired_life_slots,
            owners,
        })
    }

    /// The six-step Holland Bridge questionnaire.
    pub fn holland_bridge(admired_life_slots: usize) -> Result<Self, FormError> {
        if admired_life_slots == 0 {
            return Err(FormError::InvalidCatalog(
                "at least one admired-life slot is required".to_string(),
            ));
        }

        let mut admired = Vec::with_capacity(admired_life_slots * 3);
        for slot in 1..=admired_life_slots {
            admired.push(FieldDecl::new(
                admired_name_id(slot),
                format!("Person {slot}: who is the person whose life you admire or desire?"),
                FieldKind::ShortText,
            ));
            admired.push(FieldDecl::new(
                admired_admire_id(slot),
                format!("Person {slot}: what about this person's life appeals to you?"),
                FieldKind::FreeText,
            ));
            admired.push(FieldDecl::new(
                admired_reject_id(slot),
                format!("Person {slot}: what aspects of this person's life do you not want?"),
                FieldKind::FreeText,
            ));
        }

        let steps = vec![
            StepDef {
                ordinal: 1,
                title: "Please select your results from the Holland Codes".to_string(),
                fields: vec![FieldDecl::new(
                    HOLLAND,
                    format!("Pick up to {MAX_HOLLAND_CODES} codes"),
                    FieldKind::MultiChoice {
                        options: HOLLAND_CODES,
                        max_selections: MAX_HOLLAND_CODES,
                        min_selections: 0,
                    },
                )],
            },
            StepDef {
                ordinal: 2,
                title: "Your Top 5 Core Values".to_string(),
                fields: vec![FieldDecl::new(
                    VALUES,
                    "Enter your Top 5 Core Values from the Values Bridge results",
                    FieldKind::MultiChoice {
                        options: CORE_VALUES,
                        max_selections: CORE_VALUE_COUNT,
                        min_selections: CORE_VALUE_COUNT,
                    },
                )],
            },
            StepDef {
                ordinal: 3,
                title: "Whose Life Do You Want Anyway?".to_string(),
                fields: admired,
            },
            StepDef {
                ordinal: 4,
                title: "YouScience Results".to_string(),
                fields: TRAITS
                    .iter()
                    .map(|t| {
                        FieldDecl::new(
                            t.id,
                            t.label,
                            FieldKind::SingleChoice { options: t.options },
                        )
                    })
                    .collect(),
            },
            StepDef {
                ordinal: 5,
                title: "What Industries Do You Want to Avoid?".to_string(),
                fields: vec![FieldDecl::new(
                    INDUSTRY_AVOID,
                    "Industries or sectors you know you would not want to work in",
                    FieldKind::FreeText,
                )],
            },
            StepDef {
                ordinal: 6,
                title: "Contact Information".to_string(),
                fields: vec![
                    FieldDecl::new(FIRST_NAME, "First Name", FieldKind::ShortText),
                    FieldDecl::new(LAST_NAME, "Last Name", FieldKind::ShortText),
                    FieldDecl::new(EMAIL, "Email", FieldKind::ShortText),
                ],
            },
        ];

        Self::new(steps, admired_life_slots)
    }

    /// Number of steps (K).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, ordinal: usize) -> Option<&StepDef> {
        ordinal.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn steps(&self) -> &[StepDef] {
        &self.steps
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    /// Looks up a field declaration together with its owning step ordinal.
    pub fn field(&self, id: &str) -> Option<(&FieldDecl, usize)> {
        let owner = *self.owners.get(id)?;
        self.step(owner)
            .and_then(|s| s.fields.iter().find(|f| f.id == id))
            .map(|f| (f, owner))
    }

    pub fn admired_life_slots(&self) -> usize {
        self.admired_life_slots
    }
}
