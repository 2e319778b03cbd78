use serde::Serialize;

/// Tab switches tolerated before the candidate is blocked.
pub const BLOCK_AFTER_WARNINGS: u32 = 2;

pub const BLOCK_REASON: &str = "Security violation: Multiple tab switches during assessment.";

/// Response to a reported focus loss during an active assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntegrityOutcome {
    Warning { warnings: u32, message: String },
    Blocked { warnings: u32, message: String },
}

pub fn judge_tab_switch(warnings: u32) -> IntegrityOutcome {
    if warnings >= BLOCK_AFTER_WARNINGS {
        IntegrityOutcome::Blocked {
            warnings,
            message: "Security violation detected. You have been permanently blocked. Any \
                      further access is denied."
                .to_string(),
        }
    } else {
        IntegrityOutcome::Warning {
            warnings,
            message: "Final warning: Tab switching is strictly prohibited. Your next attempt \
                      will result in a permanent ban."
                .to_string(),
        }
    }
}
