pub mod changesets;
pub mod console;
pub mod context;
pub mod error;
pub mod fields;
pub mod options;
pub mod postreview;
pub mod repo_id;
pub mod resolve;
pub mod settings;
pub mod validation;

#[cfg(test)]
mod testing;

pub use crate::console::Console;
pub use crate::context::ResolutionContext;
pub use crate::error::{PostReviewError, ResolutionError, SettingsError, UsageError};
pub use crate::options::PostReviewOptions;
pub use crate::postreview::{HttpConnector, PostReview, PostedReview, ServerConnector};
pub use crate::settings::Settings;
