//! The "current time" tool
//!
//! Resolves an IANA time zone name and renders the current instant in it.

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Tool name as published in `tools/list`
pub const TOOL_NAME: &str = "current time";

/// Tool description as published in `tools/list`
pub const TOOL_DESCRIPTION: &str = "Get current time with timezone";

const INVALID_TIMEZONE: &str = "timezone must be a string";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CurrentTimeArgs {
    #[schemars(description = "current time timezone")]
    pub timezone: String,
}

impl CurrentTimeArgs {
    /// Validate raw tool arguments against the declared schema.
    ///
    /// Any shape other than an object with a string `timezone` is rejected
    /// with the same message, so callers cannot tell a missing key from a
    /// wrongly typed one.
    pub fn from_arguments(arguments: Value) -> Result<Self, ToolError> {
        serde_json::from_value(arguments).map_err(|_| ToolError::InvalidArgument {
            message: INVALID_TIMEZONE.to_string(),
        })
    }
}

/// JSON schema for [`CurrentTimeArgs`], without the root metadata keys
pub fn input_schema() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(CurrentTimeArgs))
        .unwrap_or_else(|_| Value::Object(Default::default()));

    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }

    schema
}

/// Zone an invocation is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// IANA database zone
    Named(Tz),
    /// Zone of the host running the server
    Local,
}

impl Zone {
    /// RFC 3339 rendering of `now` in this zone
    pub fn render(&self, now: DateTime<Utc>) -> String {
        match self {
            Zone::Named(tz) => now.with_timezone(tz).to_rfc3339(),
            Zone::Local => now.with_timezone(&Local).to_rfc3339(),
        }
    }
}

/// Resolve a zone name.
///
/// `""` means UTC and `"Local"` means the host zone; anything else must be
/// an IANA identifier.
pub fn resolve_timezone(name: &str) -> Result<Zone, ToolError> {
    match name {
        "" => Ok(Zone::Named(Tz::UTC)),
        "Local" => Ok(Zone::Local),
        _ => name
            .parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| ToolError::Resolution(format!("unknown time zone {}", name))),
    }
}

/// Render `now` in the requested zone
pub fn current_time_at(args: &CurrentTimeArgs, now: DateTime<Utc>) -> Result<String, ToolError> {
    let zone = resolve_timezone(&args.timezone)?;
    Ok(format!("current time is {}", zone.render(now)))
}

/// Handle a raw invocation using the system clock
pub fn current_time(arguments: Value) -> Result<String, ToolError> {
    let args = CurrentTimeArgs::from_arguments(arguments)?;
    current_time_at(&args, Utc::now())
}
