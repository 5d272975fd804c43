//! Alarm classifier. Maps an alarm name to one remediation.
//!
//! Case-insensitive substring match against an ordered rule table. The
//! first matching rule wins; no match yields `ActionTag::NoAction`.

use mend_core::ActionTag;

/// One classification rule: any of `patterns` selects `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub patterns: &'static [&'static str],
    pub action: ActionTag,
}

impl Rule {
    /// `name` must already be lowercased.
    fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| name.contains(p))
    }
}

/// Rules in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        patterns: &["status-check-failed"],
        action: ActionTag::TerminateUnhealthyInstance,
    },
    Rule {
        patterns: &["pod-restart"],
        action: ActionTag::AdvisoryOnly,
    },
    Rule {
        // Alarm templates name this one both ways round.
        patterns: &["node-count-low", "low-node-count"],
        action: ActionTag::ScaleUpNodeGroup,
    },
    Rule {
        patterns: &["cpu-high", "memory-high"],
        action: ActionTag::AdvisoryWithRecommendation,
    },
    Rule {
        patterns: &["unhealthy-hosts"],
        action: ActionTag::AdvisoryInvestigate,
    },
];

/// Select the remediation for an alarm name.
pub fn classify(alarm_name: &str) -> ActionTag {
    let name = alarm_name.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&name))
        .map(|rule| rule.action)
        .unwrap_or(ActionTag::NoAction)
}
