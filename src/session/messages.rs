use anstyle::{AnsiColor, Reset, Style};

const ACCENT: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Cyan)));
const MUTED: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::BrightBlack)));

fn render_arrow() -> String {
    format!("{ACCENT}❱{Reset}")
}

/// Banner printed above a dispatched command on a surfaced session.
#[must_use]
pub fn format_dispatch_message(session: &str, command: &str) -> String {
    format!(
        "{} {command} {MUTED}[{session}]{Reset}\r\n",
        render_arrow()
    )
}

/// One-line status confirmation for enable/disable and similar actions.
#[must_use]
pub fn format_status_message(message: &str) -> String {
    format!("{} {message}", render_arrow())
}

/// ANSI sequence that clears the console, used by `autoClearConsole`.
pub const CLEAR_CONSOLE: &str = "\x1b[2J\x1b[H";
