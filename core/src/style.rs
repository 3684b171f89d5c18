use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::testing::JudgeCode;

pub const BOLD_LINE: &str = "━";
pub const THIN_LINE: &str = "─";

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for JudgeCode {
    fn color(&self) -> Color {
        use JudgeCode::*;
        match self {
            AC => Color::Green,
            WA => Color::Yellow,
            TLE => Color::Red,
            RE => Color::Magenta,
        }
    }
}

pub fn judge_icon(judge: JudgeCode) -> ColoredString {
    format!(" {} ", judge).on_color(judge.color()).bold().black()
}

/// Terminal width, clamped so rules stay readable in CI logs.
pub fn rule_width() -> usize {
    let (cols, _) = terminal::size().unwrap_or((60, 40));
    (cols as usize).clamp(20, 120)
}

pub fn bold_rule(cols: usize) -> ColoredString {
    BOLD_LINE.repeat(cols).blue().bold()
}

pub fn sub_title(s: &str, cols: usize) -> String {
    let rest = cols.saturating_sub(s.chars().count() + 1);
    format!(
        "{} {}",
        s.cyan().bold(),
        THIN_LINE.repeat(rest).bright_black()
    )
}
