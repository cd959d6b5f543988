//! Framework node payload.

use crate::board::{BoardError, BoardResult};
use crate::frameworks::{Framework, FrameworkSection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Section id to the lines a user entered for that section.
pub type SectionContent = BTreeMap<String, Vec<String>>;

/// A framework placed on the board together with its filled-in content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkNodeData {
    pub framework: Framework,
    #[serde(default)]
    pub content: SectionContent,
}

impl FrameworkNodeData {
    pub fn new(framework: Framework) -> Self {
        Self {
            framework,
            content: SectionContent::new(),
        }
    }

    /// Lines entered for a section (empty if none).
    pub fn lines(&self, section_id: &str) -> &[String] {
        self.content.get(section_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lines of a section followed by those of its sub-sections, depth first.
    pub fn lines_within(&self, section: &FrameworkSection) -> Vec<String> {
        let mut lines = self.lines(&section.id).to_vec();
        for child in &section.children {
            lines.extend(self.lines_within(child));
        }
        lines
    }

    /// Replace a section's lines. Blank lines are dropped; an empty result
    /// removes the section entry.
    pub fn set_section(&mut self, section_id: &str, lines: Vec<String>) -> BoardResult<()> {
        if self.framework.section(section_id).is_none() {
            return Err(BoardError::UnknownSection {
                framework: self.framework.id.clone(),
                section: section_id.to_string(),
            });
        }
        let lines: Vec<String> = lines
            .into_iter()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            self.content.remove(section_id);
        } else {
            self.content.insert(section_id.to_string(), lines);
        }
        Ok(())
    }

    /// Number of sections that have at least one line.
    pub fn filled_sections(&self) -> usize {
        self.content.values().filter(|v| !v.is_empty()).count()
    }
}

/// Split textarea input into section lines.
pub fn lines_from_text(text: &str) -> Vec<String> {
    text.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frameworks::Catalog;

    fn swot() -> FrameworkNodeData {
        FrameworkNodeData::new(Catalog::builtin().get("swot").unwrap().clone())
    }

    #[test]
    fn test_set_section() {
        let mut data = swot();
        data.set_section("strengths", lines_from_text("Brand\n\nLoyal customers\r\n"))
            .unwrap();
        assert_eq!(data.lines("strengths"), ["Brand", "Loyal customers"]);
        assert_eq!(data.filled_sections(), 1);
    }

    #[test]
    fn test_empty_section_removed() {
        let mut data = swot();
        data.set_section("threats", vec!["Competition".into()]).unwrap();
        data.set_section("threats", vec!["  ".into()]).unwrap();
        assert!(data.content.get("threats").is_none());
        assert!(data.lines("threats").is_empty());
    }

    #[test]
    fn test_dashboard_slots_are_sections() {
        let catalog = Catalog::builtin();
        let mut profit = FrameworkNodeData::new(catalog.get("profitability").unwrap().clone());
        for slot in ["rev-price", "rev-units", "rev-mix", "dem-amt", "dem-freq"] {
            profit.set_section(slot, vec![format!("{} note", slot)]).unwrap();
        }
        let revenue = profit.framework.section("revenue").unwrap();
        assert_eq!(
            profit.lines_within(revenue),
            ["rev-price note", "rev-units note", "dem-amt note", "dem-freq note", "rev-mix note"]
        );

        let mut entry = FrameworkNodeData::new(catalog.get("market-entry").unwrap().clone());
        for slot in ["risk-internal", "risk-industry", "risk-macro", "feas-size", "feas-share"] {
            entry.set_section(slot, vec!["x".into()]).unwrap();
        }
        assert_eq!(entry.filled_sections(), 5);
    }

    #[test]
    fn test_unknown_section() {
        let mut data = swot();
        let err = data.set_section("revenue", vec!["x".into()]).unwrap_err();
        assert!(matches!(err, BoardError::UnknownSection { .. }));
    }
}
