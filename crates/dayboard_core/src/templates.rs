//! Seed checklists for users without prior data.
//!
//! # Responsibility
//! - Hold the static default body, skin and study checklists.
//! - Hand out independently owned copies on every call.
//!
//! # Invariants
//! - Template items always start unchecked.
//! - Template ids are unique within their category.

use crate::day_key::DayKey;
use crate::model::user_state::{ChecklistItem, MindSubject, MindUnit, UserState};
use serde::Serialize;

const BODY_TASKS: &[(&str, &str)] = &[
    ("body-1", "Morning stretch (10 min)"),
    ("body-2", "Push-ups 3x15"),
    ("body-3", "Squats 3x20"),
    ("body-4", "Plank 3x45s"),
    ("body-5", "Lunges 3x12 each leg"),
    ("body-6", "Cardio 20 min"),
    ("body-7", "8,000 steps"),
    ("body-8", "Drink 3L water"),
    ("body-9", "Hit protein target"),
    ("body-10", "Evening mobility (10 min)"),
];

const SKIN_TASKS: &[(&str, &str)] = &[
    ("skin-1", "AM cleanser"),
    ("skin-2", "Vitamin C serum"),
    ("skin-3", "Moisturizer"),
    ("skin-4", "Sunscreen SPF 50"),
    ("skin-5", "PM double cleanse"),
    ("skin-6", "Night treatment"),
];

struct SubjectSeed {
    id: &'static str,
    label: &'static str,
    units: &'static [(&'static str, &'static str)],
}

const MIND_SUBJECTS: &[SubjectSeed] = &[
    SubjectSeed {
        id: "math",
        label: "Mathematics",
        units: &[
            ("math-1", "Algebra"),
            ("math-2", "Calculus"),
            ("math-3", "Probability"),
        ],
    },
    SubjectSeed {
        id: "physics",
        label: "Physics",
        units: &[
            ("physics-1", "Mechanics"),
            ("physics-2", "Electromagnetism"),
            ("physics-3", "Optics"),
        ],
    },
    SubjectSeed {
        id: "english",
        label: "English",
        units: &[("english-1", "Reading"), ("english-2", "Writing")],
    },
];

/// Checklist categories that have a seed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateCategory {
    BodyTasks,
    SkinTasks,
    MindSubjects,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 3] = [Self::BodyTasks, Self::SkinTasks, Self::MindSubjects];

    /// Wire name of the field the category seeds.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::BodyTasks => "bodyTasks",
            Self::SkinTasks => "skinTasks",
            Self::MindSubjects => "mindSubjects",
        }
    }
}

/// Owned copy of one category template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Template {
    Checklist(Vec<ChecklistItem>),
    Subjects(Vec<MindSubject>),
}

/// Returns a fresh copy of the template for `category`.
pub fn defaults_for(category: TemplateCategory) -> Template {
    match category {
        TemplateCategory::BodyTasks => Template::Checklist(default_body_tasks()),
        TemplateCategory::SkinTasks => Template::Checklist(default_skin_tasks()),
        TemplateCategory::MindSubjects => Template::Subjects(default_mind_subjects()),
    }
}

pub fn default_body_tasks() -> Vec<ChecklistItem> {
    checklist(BODY_TASKS)
}

pub fn default_skin_tasks() -> Vec<ChecklistItem> {
    checklist(SKIN_TASKS)
}

pub fn default_mind_subjects() -> Vec<MindSubject> {
    MIND_SUBJECTS
        .iter()
        .map(|seed| {
            let units = seed
                .units
                .iter()
                .map(|(id, label)| MindUnit::new(*id, *label))
                .collect();
            MindSubject::new(seed.id, seed.label, units)
        })
        .collect()
}

impl UserState {
    /// Builds a fully seeded record already reset for `day_key`.
    pub fn seeded(user_id: impl Into<String>, day_key: &DayKey) -> Self {
        Self {
            body_tasks: default_body_tasks(),
            skin_tasks: default_skin_tasks(),
            mind_subjects: default_mind_subjects(),
            day_key: day_key.as_str().to_string(),
            ..Self::empty(user_id)
        }
    }
}

fn checklist(seed: &[(&str, &str)]) -> Vec<ChecklistItem> {
    seed.iter()
        .map(|(id, label)| ChecklistItem::new(*id, *label))
        .collect()
}
