use std::sync::LazyLock;

use regex::{Captures, Regex};

static SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("slot pattern is valid"));

/// Fills `{name}` slots from `vars`. Unknown slots stay as written.
pub fn render_template(template: &str, vars: &[(&str, String)]) -> String {
    SLOT.replace_all(template, |caps: &Captures<'_>| {
        let key = &caps[1];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => value.clone(),
            None => {
                tracing::warn!(slot = key, "Template slot has no value");
                caps[0].to_string()
            }
        }
    })
    .into_owned()
}
