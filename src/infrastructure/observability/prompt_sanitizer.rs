const MAX_VISIBLE_CHARS: usize = 100;

const SECRET_MARKERS: [&str; 6] = [
    "Bearer ",
    "api_key=",
    "password=",
    "secret=",
    "token=",
    "sk-",
];

/// Shortens prompt or model text for logs and masks anything that looks
/// like a credential.
pub fn sanitize_prompt(prompt: &str) -> String {
    let trimmed = prompt.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let total = trimmed.chars().count();
    let visible = match trimmed.char_indices().nth(MAX_VISIBLE_CHARS) {
        Some((cut, _)) => format!("{}... ({} chars total)", &trimmed[..cut], total),
        None => trimmed.to_string(),
    };

    redact_secrets(&visible)
}

fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for marker in SECRET_MARKERS {
        let mut search_from = 0;
        while let Some(found) = result[search_from..].find(marker) {
            let start = search_from + found + marker.len();
            let end = result[start..]
                .find(|c: char| c.is_whitespace() || matches!(c, '&' | '"' | '\'' | ','))
                .map(|i| start + i)
                .unwrap_or(result.len());
            result.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }
    result
}
