//! Host-side collaborators: the prompt, the link opener and the analytics sink.
//!
//! The notifier only sees these traits. The implementations here cover
//! terminal apps and tests; GUI hosts supply their own.

use dialoguer::{Confirm, Select};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Everything needed to render the update prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDialogOptions {
    pub buttons: [String; 2],
    /// Button chosen by default (Enter)
    pub default_index: usize,
    /// Button reported when the dialog is dismissed
    pub cancel_index: usize,
    pub title: String,
    pub message: String,
    pub checkbox_label: String,
    pub checkbox_default: bool,
}

/// The user's answer to the update prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceDialogResponse {
    pub selected_index: usize,
    pub checkbox_checked: bool,
}

/// Displays a two-button dialog with a checkbox and waits for the answer.
pub trait PromptCollaborator: Send + Sync {
    /// Blocks until the user answers. Fails with
    /// [`Error::PromptUnavailable`] when no UI can be shown.
    fn show_choice_dialog(&self, options: &ChoiceDialogOptions) -> Result<ChoiceDialogResponse>;
}

/// Opens a URL outside the application.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Receives analytics events.
pub trait AnalyticsSink: Send + Sync {
    fn log_event(&self, name: &str, properties: Map<String, Value>);
}

/// Prompt rendered in the terminal.
///
/// Esc or `q` on the button list counts as choosing the cancel button.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl PromptCollaborator for ConsolePrompt {
    fn show_choice_dialog(&self, options: &ChoiceDialogOptions) -> Result<ChoiceDialogResponse> {
        if !console_is_interactive() {
            return Err(Error::PromptUnavailable("stdin is not a terminal".to_string()));
        }

        println!("{}", options.title);
        let selected_index = Select::new()
            .with_prompt(&options.message)
            .items(options.buttons.as_slice())
            .default(options.default_index)
            .interact_opt()
            .map_err(map_dialoguer_err)?
            .unwrap_or(options.cancel_index);

        let checkbox_checked = Confirm::new()
            .with_prompt(&options.checkbox_label)
            .default(options.checkbox_default)
            .interact()
            .map_err(map_dialoguer_err)?;

        Ok(ChoiceDialogResponse {
            selected_index,
            checkbox_checked,
        })
    }
}

fn console_is_interactive() -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

fn map_dialoguer_err(e: dialoguer::Error) -> Error {
    Error::PromptUnavailable(e.to_string())
}

/// Opens links with the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinkOpener;

impl LinkOpener for SystemLinkOpener {
    fn open(&self, url: &str) {
        if let Err(e) = open::that(url) {
            tracing::warn!(url, "could not open link: {e}");
        }
    }
}

/// Writes analytics events as tracing records under the `analytics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn log_event(&self, name: &str, properties: Map<String, Value>) {
        let properties = serde_json::Value::Object(properties);
        tracing::info!(
            target: "analytics",
            event = name,
            properties = %properties,
            "analytics event"
        );
    }
}
