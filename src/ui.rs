use colored::{ColoredString, Colorize};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Reconciliation Reports
// ============================================================================

/// Colorize one line of a reconciliation report by its leading marker
pub fn report_line(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return format!("{indent}{}", trimmed.cyan().bold());
    }

    let Some((marker, rest)) = trimmed.split_once(' ') else {
        return line.to_string();
    };
    let marker: ColoredString = match marker {
        "✓" => marker.green(),
        "+" => marker.green().bold(),
        "!" => marker.yellow(),
        "-" => marker.dimmed(),
        "✗" => marker.red(),
        _ => return line.to_string(),
    };
    format!("{indent}{marker} {rest}")
}

/// Print a whole report, line by line
pub fn report(text: &str) {
    for line in text.lines() {
        println!("{}", report_line(line));
    }
}

/// "1 item" / "2 items"
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Tests
// ============================================================================
