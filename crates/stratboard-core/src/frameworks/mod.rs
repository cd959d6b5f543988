//! Business-framework templates.
//!
//! A framework is a static template of named sections (SWOT has four,
//! PESTEL six, ...). Users contribute free-text lines per section once a
//! framework is placed on a board.

mod diagram;

pub use diagram::DiagramKind;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Frameworks shipped with the application.
const BUILTIN_CATALOG: &str = include_str!("../../assets/frameworks.json");

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid catalog data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate framework id: {0}")]
    DuplicateId(String),
}

/// Which library tab a framework belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameworkCategory {
    General,
    CaseSpecific,
}

impl FrameworkCategory {
    pub fn label(&self) -> &'static str {
        match self {
            FrameworkCategory::General => "general",
            FrameworkCategory::CaseSpecific => "case-specific",
        }
    }
}

impl std::str::FromStr for FrameworkCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(FrameworkCategory::General),
            "case-specific" | "case" => Ok(FrameworkCategory::CaseSpecific),
            other => Err(format!("unknown framework category '{}'", other)),
        }
    }
}

/// A named section of a framework, optionally with nested sub-sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkSection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FrameworkSection>,
}

impl FrameworkSection {
    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    fn find(&self, id: &str) -> Option<&FrameworkSection> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// A business-analysis template.
///
/// Framework nodes embed a full copy of their framework so a saved board
/// stays readable even if the catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Framework {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub category: FrameworkCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub use_case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    pub sections: Vec<FrameworkSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Framework {
    /// Short label for compact displays, falling back to the full name.
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }

    /// All section ids, depth first.
    pub fn section_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for section in &self.sections {
            section.collect_ids(&mut ids);
        }
        ids
    }

    /// Find a section (at any depth) by id.
    pub fn section(&self, id: &str) -> Option<&FrameworkSection> {
        self.sections.iter().find_map(|s| s.find(id))
    }

    /// The diagram layout used to render this framework.
    pub fn diagram(&self) -> DiagramKind {
        DiagramKind::for_framework(&self.id)
    }

    /// File name for exporting this framework, e.g. `swot-analysis.png`.
    pub fn export_filename(&self, ext: &str) -> String {
        let stem = self
            .name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!("{}.{}", stem, ext)
    }
}

/// An ordered collection of frameworks with unique ids.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    frameworks: Vec<Framework>,
}

impl Catalog {
    /// The built-in catalog, parsed once.
    pub fn builtin() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| match Catalog::from_json(BUILTIN_CATALOG) {
            Ok(catalog) => catalog,
            Err(e) => {
                log::error!("Built-in framework catalog is invalid: {}", e);
                Catalog::default()
            }
        })
    }

    /// Parse a catalog from a JSON array of frameworks.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let frameworks: Vec<Framework> = serde_json::from_str(json)?;
        Self::from_frameworks(frameworks)
    }

    /// Build a catalog, rejecting duplicate ids.
    pub fn from_frameworks(frameworks: Vec<Framework>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for framework in &frameworks {
            if !seen.insert(framework.id.as_str()) {
                return Err(CatalogError::DuplicateId(framework.id.clone()));
            }
        }
        Ok(Self { frameworks })
    }

    pub fn all(&self) -> &[Framework] {
        &self.frameworks
    }

    pub fn len(&self) -> usize {
        self.frameworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Framework> {
        self.frameworks.iter().find(|f| f.id == id)
    }

    pub fn by_category(&self, category: FrameworkCategory) -> impl Iterator<Item = &Framework> {
        self.frameworks.iter().filter(move |f| f.category == category)
    }

    /// Case-insensitive search over name, short name and description.
    pub fn search(&self, query: &str) -> Vec<&Framework> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.frameworks.iter().collect();
        }
        self.frameworks
            .iter()
            .filter(|f| {
                f.name.to_lowercase().contains(&needle)
                    || f.short_name
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                    || f.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// The first framework that owns a section with this id.
    pub fn framework_for_section(&self, section_id: &str) -> Option<&Framework> {
        self.frameworks
            .iter()
            .find(|f| f.section(section_id).is_some())
    }
}
