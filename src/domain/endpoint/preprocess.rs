// Shorthand macro expansion for endpoint templates

use once_cell::sync::Lazy;
use regex::Regex;

static OPTIONAL_REPEAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\?([\w$]+)\}\}").expect("valid optional repeat pattern"));

static REPEAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([\w$]+)\}\}").expect("valid repeat pattern"));

/// Expand `{{?name}}` and `{{name}}` in one template region.
///
/// `{{?name}}` becomes `[?name:{{name}}]`, then `{{name}}` becomes `name/{name}` in the
/// path region or `name={name}` in the query region. Anything else passes through.
pub fn expand(template: &str, is_query_params: bool) -> String {
    let optionals = OPTIONAL_REPEAT.replace_all(template, "[?${1}:{{${1}}}]");
    let replacement = if is_query_params {
        "${1}={${1}}"
    } else {
        "${1}/{${1}}"
    };
    REPEAT.replace_all(&optionals, replacement).into_owned()
}
