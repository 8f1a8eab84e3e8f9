use owo_colors::OwoColorize;

use crate::VERSION;

/// Characters of Markdown shown by `-vv`.
const PREVIEW_CHARS: usize = 300;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "mdscraper".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Convert web pages to clean Markdown\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the start of a converted page
pub fn print_preview(markdown: &str) {
    let preview: String = markdown.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if markdown.chars().count() > PREVIEW_CHARS { "..." } else { "" };

    eprintln!("{}", "─".repeat(60).dimmed());
    eprintln!("{}{}", preview, ellipsis.dimmed());
    eprintln!("{}", "─".repeat(60).dimmed());
}

/// Print the batch summary, listing every failed page
pub fn print_summary(succeeded: usize, failures: &[(String, String)], elapsed: std::time::Duration) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Succeeded:".dimmed(), succeeded.to_string().bright_green());
    if failures.is_empty() {
        eprintln!("  {} {}", "Failed:".dimmed(), "0".bright_white());
    } else {
        eprintln!("  {} {}", "Failed:".dimmed(), failures.len().to_string().bright_red());
        for (page, reason) in failures {
            eprintln!("    {} {} {}", "✗".red(), page.bright_white(), reason.dimmed());
        }
    }
    eprintln!("  {} {:>.2}s\n", "Elapsed:".dimmed(), elapsed.as_secs_f64());
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
