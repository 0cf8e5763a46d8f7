use crate::console::Console;
use crate::error::UsageError;
use crate::options::RequestOptions;
use crate::settings::Settings;
use rb_client::{ReviewField, ReviewFields};
use rb_vcs::Revision;

/// Build the draft fields for `target`.
///
/// `changesets` is the rendered changeset list used as the default
/// description.
pub fn build_fields(
    target: &Revision,
    changesets: &str,
    request: &RequestOptions,
    settings: &Settings,
    console: &dyn Console,
) -> Result<ReviewFields, UsageError> {
    let mut fields = ReviewFields::new();

    if request.rewrites_description() {
        let default_summary = request
            .summary
            .clone()
            .unwrap_or_else(|| target.summary().to_string());

        let (summary, description) = if request.interactive {
            console.status(&format!("default summary: {default_summary}"));
            let summary = console.prompt("summary", Some(&default_summary))?;
            let summary = match summary.trim() {
                "" => default_summary,
                text => text.to_string(),
            };
            let mut description = console.prompt("description", Some(""))?.trim().to_string();
            if console.confirm("append changesets to description?", true)? {
                if !description.is_empty() {
                    description.push_str("\n\n");
                }
                description.push_str(changesets);
            }
            (summary, description)
        } else {
            (default_summary, changesets.to_string())
        };

        fields.set(ReviewField::Summary, summary);
        fields.set(ReviewField::Description, description);
        fields.set(ReviewField::Branch, target.branch.clone());
    }

    let overrides = [
        (ReviewField::TargetGroups, &request.target_groups),
        (ReviewField::TargetPeople, &request.target_people),
        (ReviewField::BugsClosed, &request.bugs_closed),
    ];
    for (field, flag) in overrides {
        let value = flag
            .as_deref()
            .filter(|value| !value.is_empty())
            .or_else(|| settings.get(field.as_str()));
        if let Some(value) = value {
            fields.set(field, value);
        }
    }

    Ok(fields)
}
