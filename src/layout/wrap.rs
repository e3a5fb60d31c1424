/// Greedy word wrap of `text` so each line measures at most `max_width`.
///
/// `measure` returns the rendered width of a candidate line. Words are split on whitespace and
/// rejoined with single spaces. A single word wider than `max_width` stays whole on its own line.
/// Empty or whitespace-only input yields no lines; text that already fits is returned untouched.
pub fn wrap(mut measure: impl FnMut(&str) -> f64, text: &str, max_width: f64) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if measure(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/layout/wrap.rs"]
mod tests;
