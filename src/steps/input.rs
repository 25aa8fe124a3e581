//! Free-text input steps.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::ui::{InputPrompt, PromptButton};

use super::buttons::StepButton;

/// Verdict of an input validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub message: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Checks a candidate value before it is accepted.
pub type Validator = Rc<dyn Fn(&str) -> Result<Validation>>;

/// Everything needed to build an [`InputStep`].
#[derive(Default)]
pub struct InputStepConfig {
    pub title: String,
    pub prompt: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub buttons: Vec<StepButton>,
    pub validate: Option<Validator>,
    pub disallow_back: bool,
}

/// A prompt for a single line of text.
pub struct InputStep {
    pub title: String,
    pub prompt: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub buttons: Vec<StepButton>,
    pub validate: Option<Validator>,
    pub disallow_back: bool,
}

impl fmt::Debug for InputStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStep")
            .field("title", &self.title)
            .field("prompt", &self.prompt)
            .field("value", &self.value)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

impl InputStep {
    /// Run the validator, if any.
    pub fn validate(&self, value: &str) -> Result<Validation> {
        match &self.validate {
            Some(validate) => validate(value),
            None => Ok(Validation::ok()),
        }
    }

    /// The view handed to the UI.
    pub fn prompt(&self, value: Option<&str>, validation_message: Option<&str>) -> InputPrompt {
        InputPrompt {
            title: self.title.clone(),
            prompt: self.prompt.clone(),
            placeholder: self.placeholder.clone(),
            value: value.map(String::from),
            validation_message: validation_message.map(String::from),
            buttons: self
                .buttons
                .iter()
                .map(|b| PromptButton {
                    kind: b.kind,
                    tooltip: b.tooltip.clone(),
                })
                .collect(),
            can_go_back: !self.disallow_back,
        }
    }
}

pub fn create_input_step(config: InputStepConfig) -> InputStep {
    InputStep {
        title: config.title,
        prompt: config.prompt,
        placeholder: config.placeholder,
        value: config.value,
        buttons: config.buttons,
        validate: config.validate,
        disallow_back: config.disallow_back,
    }
}
