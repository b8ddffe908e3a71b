use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    escape::escape_url,
    hooks::Hooks,
    notice::{Notice, NoticeQueue},
    record::StoredRecord,
    request::RequestContext,
    store::{OptionStore, StoreError},
};

/// Channel every settings notice is queued on.
pub const NOTICE_CHANNEL: &str = "settings_notice";
/// Query parameter appended to the redirect after a successful save.
pub const UPDATED_QUERY_ARG: &str = "settings-updated";
pub const UPDATED_NOTICE_CODE: &str = "settings_updated";

/// Result of running one request through the persistence pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    /// The request did not submit this option's form.
    Idle,
    /// The validator reported errors; nothing was written. `submitted` is the
    /// raw input, returned so hosts may re-display it.
    Rejected {
        errors: Vec<Notice>,
        submitted: Value,
    },
    /// The record was replaced; the request must end with a redirect.
    Committed {
        location: String,
        record: StoredRecord,
    },
}

impl PersistOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, PersistOutcome::Committed { .. })
    }
}

/// Sanitize, validate and store a submission for `option_name`.
///
/// The validator sees the raw submission. Any notice it reports is queued on
/// [`NOTICE_CHANNEL`]; error-severity notices reject the submission. On
/// success the sanitized data, passed once through the post-sanitize filter,
/// replaces the stored record wholesale. Store failures are returned as-is.
pub fn persist<S>(
    option_name: &str,
    request: &RequestContext,
    store: &mut S,
    hooks: &Hooks,
    notices: &mut NoticeQueue,
) -> Result<PersistOutcome, StoreError>
where
    S: OptionStore + ?Sized,
{
    if !request.has_submission(option_name) {
        debug!(option = option_name, "no submission for option");
        return Ok(PersistOutcome::Idle);
    }

    let submitted = request.submitted_data(option_name);
    let sanitizer = hooks.sanitizer();
    let sanitized = sanitizer(&submitted);

    let reported = hooks.validate(&submitted);
    let errors: Vec<Notice> = reported.iter().filter(|n| n.is_error()).cloned().collect();
    for notice in reported {
        notices.enqueue(NOTICE_CHANNEL, notice);
    }
    if !errors.is_empty() {
        warn!(
            option = option_name,
            errors = errors.len(),
            "submission rejected by validator"
        );
        return Ok(PersistOutcome::Rejected { errors, submitted });
    }

    let filtered = hooks.post_sanitize(sanitized);
    if !filtered.is_object() {
        warn!(
            option = option_name,
            "sanitized submission is not an object; storing an empty record"
        );
    }
    let record = StoredRecord::coerce(filtered);
    store.write(option_name, &record)?;

    let location = escape_url(&request.with_query_arg(UPDATED_QUERY_ARG, "true"));
    info!(option = option_name, fields = record.len(), "settings saved");
    Ok(PersistOutcome::Committed { location, record })
}

/// On the request that follows a successful save, queue the success notice
/// once. Returns whether a notice was queued.
pub fn announce_success(request: &RequestContext, notices: &mut NoticeQueue, message: &str) -> bool {
    if request.query_param(UPDATED_QUERY_ARG) != Some("true") {
        return false;
    }
    notices.enqueue(NOTICE_CHANNEL, Notice::updated(UPDATED_NOTICE_CODE, message));
    true
}
