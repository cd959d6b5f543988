//! Framework id to diagram layout dispatch.

use serde::{Deserialize, Serialize};

/// The hand-built diagram layout a framework is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramKind {
    ProfitabilityDashboard,
    MarketEntryDashboard,
    GrowthDashboard,
    Swot,
    Porters,
    SevenS,
    AnsoffCircle,
    Concentric,
    Pestel,
    FiveC,
    Amo,
    FourM,
    BcgMatrix,
    CustomerJourney,
    Tree,
    Marketing4Ps,
    Generic,
}

impl DiagramKind {
    /// Look up the layout for a framework id. Unknown ids get the generic
    /// section grid.
    pub fn for_framework(id: &str) -> Self {
        match id {
            "profitability" => DiagramKind::ProfitabilityDashboard,
            "market-entry" => DiagramKind::MarketEntryDashboard,
            "growth-strategy" => DiagramKind::GrowthDashboard,
            "swot" => DiagramKind::Swot,
            "porters" | "porter" | "porter-5" => DiagramKind::Porters,
            "7s" => DiagramKind::SevenS,
            "ansoff" | "ansoff-matrix" => DiagramKind::AnsoffCircle,
            "tam-sam-som" => DiagramKind::Concentric,
            "pestel" => DiagramKind::Pestel,
            "5c" => DiagramKind::FiveC,
            "amo" => DiagramKind::Amo,
            "4m" => DiagramKind::FourM,
            "bcg" => DiagramKind::BcgMatrix,
            "customer-journey" => DiagramKind::CustomerJourney,
            "issue-tree" | "pricing" | "ma-pe" => DiagramKind::Tree,
            "4p" => DiagramKind::Marketing4Ps,
            _ => DiagramKind::Generic,
        }
    }

    /// Bespoke dashboards used by the case-specific frameworks.
    pub fn is_dashboard(&self) -> bool {
        matches!(
            self,
            DiagramKind::ProfitabilityDashboard
                | DiagramKind::MarketEntryDashboard
                | DiagramKind::GrowthDashboard
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiagramKind::ProfitabilityDashboard => "Profitability dashboard",
            DiagramKind::MarketEntryDashboard => "Market entry dashboard",
            DiagramKind::GrowthDashboard => "Growth dashboard",
            DiagramKind::Swot => "SWOT quadrants",
            DiagramKind::Porters => "Five forces",
            DiagramKind::SevenS => "7S network",
            DiagramKind::AnsoffCircle => "Ansoff circle",
            DiagramKind::Concentric => "Concentric circles",
            DiagramKind::Pestel => "PESTEL grid",
            DiagramKind::FiveC => "5C ring",
            DiagramKind::Amo => "AMO triangle",
            DiagramKind::FourM => "4M fishbone",
            DiagramKind::BcgMatrix => "BCG matrix",
            DiagramKind::CustomerJourney => "Journey stages",
            DiagramKind::Tree => "Issue tree",
            DiagramKind::Marketing4Ps => "4P grid",
            DiagramKind::Generic => "Section grid",
        }
    }
}
