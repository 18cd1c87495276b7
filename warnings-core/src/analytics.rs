use crate::models::WarningRecord;
use crate::render::format_month;

/// Label used for records with an empty grouping value
const UNSPECIFIED: &str = "غير محدد";

/// Warning counts for the analytics section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analytics {
    pub total: usize,
    /// Counts per warning type, in order of first appearance
    pub by_type: Vec<(String, usize)>,
    /// Counts per severity, in order of first appearance
    pub by_severity: Vec<(String, usize)>,
    /// Counts per month of the warning date, in order of first appearance
    pub by_month: Vec<(String, usize)>,
}

impl Analytics {
    pub fn compute(warnings: &[WarningRecord]) -> Self {
        let mut analytics = Analytics {
            total: warnings.len(),
            ..Default::default()
        };

        for warning in warnings {
            let f = &warning.fields;
            bump(&mut analytics.by_type, &f.warning_type);
            bump(&mut analytics.by_severity, &f.severity);
            if let Some(month) = format_month(&f.warning_date) {
                bump(&mut analytics.by_month, &month);
            }
        }

        analytics
    }

    /// The most frequent warning type, if any warnings exist
    pub fn top_type(&self) -> Option<&(String, usize)> {
        // max_by_key keeps the last maximum; reverse so ties go to the first seen
        self.by_type.iter().rev().max_by_key(|(_, count)| *count)
    }
}

fn bump(counts: &mut Vec<(String, usize)>, key: &str) {
    let key = if key.trim().is_empty() { UNSPECIFIED } else { key };
    match counts.iter_mut().find(|(k, _)| k == key) {
        Some((_, count)) => *count += 1,
        None => counts.push((key.to_string(), 1)),
    }
}
