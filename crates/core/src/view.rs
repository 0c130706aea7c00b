//! What the page shows for a given state.

use serde::{Deserialize, Serialize};

use crate::state::{DemoState, InsightTrack, VerificationTrack};

/// Button label before any policy exists.
pub const GENERATE_LABEL: &str = "Generate Privacy Policy";
/// Button label once a policy is shown.
pub const REGENERATE_LABEL: &str = "Regenerate Policy";

/// Right-hand side of the live demo section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum DemoPanel {
    /// The verification widget is mounted and waiting.
    Widget,
    /// Result card with the insight below it.
    Verified {
        /// Claim document URL, exactly as delivered.
        url: String,
        /// Insight area.
        insight: InsightPanel,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum InsightPanel {
    /// Loading indicator.
    Loading,
    /// Explanation text.
    Text {
        /// Shown verbatim.
        text: String,
    },
    /// The request failed.
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum PolicyPanel {
    /// No document yet.
    Placeholder,
    /// The generated policy.
    Document {
        /// Markdown, shown verbatim.
        text: String,
    },
}

/// The policy trigger control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyButton {
    /// Generate or regenerate.
    pub label: String,
    /// Set while a request is outstanding.
    pub disabled: bool,
    /// Loading indicator next to the label.
    pub spinning: bool,
}

/// Serializable snapshot of the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    /// Live demo panel.
    pub demo: DemoPanel,
    /// Privacy policy panel.
    pub policy: PolicyPanel,
    /// Policy trigger.
    pub policy_button: PolicyButton,
}

impl ViewModel {
    /// Derives the view from the current state.
    pub fn from_state(state: &DemoState) -> Self {
        let demo = match &state.verification {
            VerificationTrack::Idle => DemoPanel::Widget,
            VerificationTrack::Verified {
                result, insight, ..
            } => DemoPanel::Verified {
                url: result.url.clone(),
                insight: match insight {
                    InsightTrack::Pending => InsightPanel::Loading,
                    InsightTrack::Ready(t) => InsightPanel::Text {
                        text: t.text.clone(),
                    },
                    InsightTrack::Empty => InsightPanel::Empty,
                },
            },
        };

        let shown = state.policy();
        let policy = match shown {
            Some(doc) => PolicyPanel::Document {
                text: doc.text.clone(),
            },
            None => PolicyPanel::Placeholder,
        };

        let generating = state.is_generating_policy();
        let policy_button = PolicyButton {
            label: if shown.is_some() {
                REGENERATE_LABEL
            } else {
                GENERATE_LABEL
            }
            .to_string(),
            disabled: generating,
            spinning: generating,
        };

        Self {
            demo,
            policy,
            policy_button,
        }
    }

    /// True while some asynchronous result is still expected.
    pub fn is_pending(&self) -> bool {
        self.policy_button.spinning || self.is_analyzing()
    }

    /// Whether the widget is on the page waiting for the user.
    pub fn widget_mounted(&self) -> bool {
        matches!(self.demo, DemoPanel::Widget)
    }

    /// A pending result can be picked up by reloading the whole page. Never
    /// true while the widget is mounted: a reload would restart it.
    pub fn reload_while_pending(&self) -> bool {
        self.is_pending() && !self.widget_mounted()
    }

    /// A policy is outstanding but the page must not reload, so only the
    /// policy panel may be refreshed in place.
    pub fn poll_policy_in_place(&self) -> bool {
        self.policy_button.spinning && self.widget_mounted()
    }

    fn is_analyzing(&self) -> bool {
        matches!(
            self.demo,
            DemoPanel::Verified {
                insight: InsightPanel::Loading,
                ..
            }
        )
    }
}
