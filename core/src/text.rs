//! Text formatting for reports and log messages.

/// `"1 cell"`, `"2 cells"`.
pub fn pleural(n: usize, name: &str) -> String {
    format!("{} {}", n, if n == 1 { name.to_string() } else { format!("{}s", name) })
}

/// Choose the singular or plural form without the count.
pub fn pleurals<'a>(n: usize, single: &'a str, plural: &'a str) -> &'a str {
    if n == 1 { single } else { plural }
}

pub fn is_null_or_empty(text: Option<&str>) -> bool {
    text.is_none_or(|t| t.is_empty())
}

/// Lower-case the first character unless the first two characters are upper case
/// (acronyms such as `"URL"` are left alone).
pub fn decapitalise(text: &str) -> String {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let acronym = first.is_uppercase() && text.chars().nth(1).is_some_and(char::is_uppercase);
    if acronym {
        return text.to_string();
    }
    first.to_lowercase().chain(chars).collect()
}

/// Upper-case the first letter of every whitespace-separated word.
pub fn to_title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Greedy word wrap to `width` columns.
///
/// Existing line breaks are kept. A word longer than `width` is placed on a line of
/// its own rather than split.
pub fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let mut current = String::new();
        for word in line.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines.join("\n")
}

fn trim_decimal(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Human-readable duration from nanoseconds, e.g. `"850ns"`, `"1.5µs"`, `"1.235ms"`.
///
/// Durations of a second or more are rendered by [`millis_to_string`].
pub fn nanos_to_string(nanos: u64) -> String {
    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{}µs", trim_decimal(format!("{:.3}", nanos as f64 / 1e3)))
    } else if nanos < 1_000_000_000 {
        format!("{}ms", trim_decimal(format!("{:.3}", nanos as f64 / 1e6)))
    } else {
        millis_to_string((nanos + 500_000) / 1_000_000)
    }
}

/// Human-readable duration from milliseconds, e.g. `"950ms"`, `"1.235s"`,
/// `"2m03.456s"`, `"1h02m03.456s"`.
pub fn millis_to_string(millis: u64) -> String {
    if millis < 1_000 {
        return format!("{}ms", millis);
    }
    if millis < 60_000 {
        return format!(
            "{}s",
            trim_decimal(format!("{}.{:03}", millis / 1_000, millis % 1_000))
        );
    }
    let ms = millis % 1_000;
    let total_seconds = millis / 1_000;
    let seconds = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let minutes = total_minutes % 60;
    let hours = total_minutes / 60;
    if hours > 0 {
        format!("{}h{:02}m{:02}.{:03}s", hours, minutes, seconds, ms)
    } else {
        format!("{}m{:02}.{:03}s", minutes, seconds, ms)
    }
}
