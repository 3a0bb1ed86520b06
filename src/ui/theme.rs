//! Terminal styling for the `serve` and `init` status lines

use owo_colors::Style;
use std::sync::OnceLock;

/// Set to `1` or `true` to silence status lines (errors still print)
pub const QUIET_ENV: &str = "ITEMS_API_QUIET";

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub quiet: bool,
    pub title: Style,
    pub ok: Style,
    pub failure: Style,
    pub caution: Style,
    pub label: Style,
}

impl Theme {
    /// Colors only when stdout is a terminal; quiet from `ITEMS_API_QUIET`
    pub fn detect() -> Self {
        let quiet = std::env::var(QUIET_ENV).map(|v| is_truthy(&v)).unwrap_or(false);
        Self::new(console::Term::stdout().is_term(), quiet)
    }

    pub fn new(colored: bool, quiet: bool) -> Self {
        if !colored {
            return Self {
                quiet,
                title: Style::new(),
                ok: Style::new(),
                failure: Style::new(),
                caution: Style::new(),
                label: Style::new(),
            };
        }
        Self {
            quiet,
            title: Style::new().cyan().bold(),
            ok: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            caution: Style::new().yellow().bold(),
            label: Style::new().white().dimmed(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
