use owo_colors::{OwoColorize, Stream};
use rb_core::{Console, UsageError};

/// Console on the controlling terminal.
pub struct TerminalConsole;

fn prompt_failed(err: dialoguer::Error) -> UsageError {
    UsageError::PromptFailed {
        reason: err.to_string(),
    }
}

impl Console for TerminalConsole {
    fn status(&self, message: &str) {
        println!("{message}");
    }

    fn success(&self, message: &str) {
        println!(
            "{}",
            message.if_supports_color(Stream::Stdout, |text| text.green())
        );
    }

    fn prompt(&self, message: &str, default: Option<&str>) -> Result<String, UsageError> {
        let mut input = dialoguer::Input::<String>::new()
            .with_prompt(message)
            .allow_empty(true);
        if let Some(default) = default.filter(|default| !default.is_empty()) {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(prompt_failed)
    }

    fn prompt_password(&self, message: &str) -> Result<String, UsageError> {
        dialoguer::Password::new()
            .with_prompt(message)
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_failed)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, UsageError> {
        dialoguer::Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(prompt_failed)
    }

    fn launch_browser(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}
