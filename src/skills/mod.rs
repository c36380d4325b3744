//! Skill catalog
//!
//! The closed set of action kinds a robot may be commanded to perform.
//! Consumed twice: formatted into the stage-2 prompt as the only legal
//! action vocabulary, and used as the validation/dispatch table by the
//! task executor.

use serde::{Deserialize, Serialize};

/// Unique skill identifier
///
/// The vocabulary is small and statically known, so dispatch is a closed
/// match on this enum rather than open-ended string dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    GoToObject,
    PickObject,
    PlaceObject,
}

impl SkillKind {
    /// Parse a skill name as emitted by the oracle or listed in config.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GoToObject" => Some(Self::GoToObject),
            "PickObject" => Some(Self::PickObject),
            "PlaceObject" => Some(Self::PlaceObject),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GoToObject => "GoToObject",
            Self::PickObject => "PickObject",
            Self::PlaceObject => "PlaceObject",
        }
    }
}

impl std::fmt::Display for SkillKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered permitted skill names for one robot.
#[derive(Debug, Clone)]
pub struct SkillCatalog {
    pub robot_name: String,
    skills: Vec<SkillKind>,
}

impl SkillCatalog {
    /// Build a catalog from configured skill names.
    ///
    /// Unknown names are rejected upstream by config validation; here they
    /// are simply dropped so the catalog only ever holds known kinds.
    pub fn new(robot_name: impl Into<String>, skill_names: &[String]) -> Self {
        let skills = skill_names
            .iter()
            .filter_map(|name| SkillKind::from_name(name))
            .collect();
        Self {
            robot_name: robot_name.into(),
            skills,
        }
    }

    pub fn contains(&self, skill: SkillKind) -> bool {
        self.skills.contains(&skill)
    }

    pub fn skills(&self) -> &[SkillKind] {
        &self.skills
    }

    /// Format the catalog for the stage-2 prompt, import-line style:
    /// `from robot1.skills import GoToObject, PickObject, PlaceObject`
    pub fn skill_text(&self) -> String {
        let names: Vec<&str> = self.skills.iter().map(|s| s.name()).collect();
        format!("from {}.skills import {}", self.robot_name, names.join(", "))
    }
}

/// Join several robots' catalogs into one prompt block, one line per robot.
pub fn combined_skill_text(catalogs: &[SkillCatalog]) -> String {
    catalogs
        .iter()
        .map(|c| c.skill_text())
        .collect::<Vec<_>>()
        .join("\n")
}
