//! Placeholder substitution over earlier step outputs.

use super::ExecutionContext;
use regex::Regex;
use std::sync::LazyLock;

/// Token replaced with the most recent entry of the run's results.
pub const PREVIOUS_RESULT_PLACEHOLDER: &str = "{previous_result}";

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_\-]+)\}").expect("valid placeholder pattern"));

/// Renders a template against the context.
///
/// `{previous_result}` becomes the last result (empty when there is none).
/// `{key}` becomes the output stored under `key`. Unknown placeholders are
/// left untouched so literal braces in prompts survive.
#[must_use]
pub fn render_template(template: &str, ctx: &ExecutionContext) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            if name == "previous_result" {
                return ctx.previous_result().unwrap_or_default().to_string();
            }
            ctx.output(name)
                .map_or_else(|| caps[0].to_string(), str::to_string)
        })
        .into_owned()
}
