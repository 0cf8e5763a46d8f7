use crate::error::UsageError;

/// User-facing I/O: status lines, prompts and the browser.
pub trait Console {
    fn status(&self, message: &str);

    /// Final outcome line, e.g. the request URL.
    fn success(&self, message: &str);

    /// Ask for a line of text. An empty answer returns `default` when given.
    fn prompt(&self, message: &str, default: Option<&str>) -> Result<String, UsageError>;

    fn prompt_password(&self, message: &str) -> Result<String, UsageError>;

    fn confirm(&self, message: &str, default: bool) -> Result<bool, UsageError>;

    fn launch_browser(&self, url: &str) -> std::io::Result<()>;
}
