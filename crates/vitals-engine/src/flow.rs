use crate::backend::WaitState;
use crate::config::VerifyConfig;
use crate::locator::Locator;
use std::time::Duration;

/// A contract check on an element's attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Attribute must equal `expected` exactly.
    AttributeEquals { name: String, expected: String },
    /// Attribute must be present and non-empty. The value itself is not parsed.
    AttributePresent { name: String },
}

impl Expectation {
    pub fn attribute(&self) -> &str {
        match self {
            Expectation::AttributeEquals { name, .. }
            | Expectation::AttributePresent { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    WaitFor {
        locator: Locator,
        state: WaitState,
        timeout: Duration,
    },
    Click {
        locator: Locator,
        timeout: Duration,
    },
    /// Read every attribute the expectations name, report them, then check
    /// the expectations in order.
    Inspect {
        locator: Locator,
        expectations: Vec<Expectation>,
    },
}

/// A step plus the progress line printed before it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStep {
    pub message: String,
    pub step: Step,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub name: String,
    /// Printed when every step passed.
    pub success_message: String,
    pub steps: Vec<FlowStep>,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            success_message: format!("{} checks passed.", name),
            name,
            steps: Vec::new(),
        }
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    pub fn step(mut self, message: impl Into<String>, step: Step) -> Self {
        self.steps.push(FlowStep {
            message: message.into(),
            step,
        });
        self
    }

    /// Main menu -> CPC exam start screen -> running exam, then check the
    /// exam timer's progress bar.
    pub fn progressbar(config: &VerifyConfig) -> Self {
        let progressbar = Locator::role("progressbar");

        Flow::new("progressbar")
            .success_message("ProgressBar has correct role and attributes.")
            .step(
                "Waiting for Main Menu...",
                Step::WaitFor {
                    locator: Locator::text("CODE BLUE"),
                    state: WaitState::Visible,
                    timeout: config.selector_timeout(),
                },
            )
            .step(
                "Clicking CPC EXAM MODE...",
                Step::Click {
                    locator: Locator::text("CPC EXAM MODE"),
                    timeout: config.action_timeout(),
                },
            )
            .step(
                "Waiting for CPC EXAM title...",
                Step::WaitFor {
                    locator: Locator::css_has_text("h1", "CPC EXAM MODE"),
                    state: WaitState::Visible,
                    timeout: config.selector_timeout(),
                },
            )
            .step(
                "Clicking START EXAM...",
                Step::Click {
                    locator: Locator::text("START EXAM"),
                    timeout: config.action_timeout(),
                },
            )
            .step(
                "Locating ProgressBar by role='progressbar'...",
                Step::WaitFor {
                    locator: progressbar.clone(),
                    state: WaitState::Visible,
                    timeout: config.visible_timeout(),
                },
            )
            .step(
                "Verifying ProgressBar attributes...",
                Step::Inspect {
                    locator: progressbar,
                    expectations: vec![
                        Expectation::AttributeEquals {
                            name: "aria-label".into(),
                            expected: "Time Remaining".into(),
                        },
                        Expectation::AttributePresent {
                            name: "aria-valuenow".into(),
                        },
                    ],
                },
            )
    }
}
