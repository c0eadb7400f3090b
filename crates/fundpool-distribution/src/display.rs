//! Presentation rounding
//!
//! The calculator keeps full precision. Values are rounded to display
//! precision here, once, on the way out.

use serde::{Deserialize, Serialize};

use fundpool_core::ProjectId;

use crate::{Distribution, DistributionEntry};

/// Decimal places shown for amounts and percentages
pub const DISPLAY_DECIMALS: usize = 2;

/// A distribution entry rendered for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub project_id: ProjectId,
    pub project_name: String,
    pub votes: String,
    pub amount: String,
    /// With a trailing `%`
    pub percentage: String,
}

/// Format a decimal to display precision
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return format!("{:.*}", DISPLAY_DECIMALS, 0.0);
    }
    let rendered = format!("{:.*}", DISPLAY_DECIMALS, value);
    // "-0.00" reads as a loss
    if rendered.starts_with('-') && rendered.trim_start_matches(['-', '0', '.']).is_empty() {
        return rendered[1..].to_string();
    }
    rendered
}

impl DistributionEntry {
    pub fn display(&self) -> DisplayEntry {
        DisplayEntry {
            project_id: self.project_id,
            project_name: self.project_name.clone(),
            votes: format_decimal(self.vote_count),
            amount: format_decimal(self.amount),
            percentage: format!("{}%", format_decimal(self.percentage)),
        }
    }
}

impl Distribution {
    pub fn display(&self) -> Vec<DisplayEntry> {
        self.entries.iter().map(DistributionEntry::display).collect()
    }
}
