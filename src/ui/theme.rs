//! Output symbols and the prefix color palette

use console::Style;

/// Symbol set used in status and summary lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub check: &'static str,
    pub cross: &'static str,
    pub warn: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
}

/// Unicode symbols (default)
pub const UNICODE: Symbols = Symbols {
    check: "✓",
    cross: "✗",
    warn: "!",
    arrow: "→",
    bullet: "•",
};

/// Plain-text symbols for terminals without unicode support
pub const ASCII: Symbols = Symbols {
    check: "[OK]",
    cross: "[FAIL]",
    warn: "[WARN]",
    arrow: "->",
    bullet: "*",
};

impl Default for Symbols {
    fn default() -> Self {
        UNICODE
    }
}

impl Symbols {
    /// Select a symbol set from the --ascii flag and the WSU_ASCII /
    /// WSU_UNICODE environment variables. The flag wins; WSU_UNICODE
    /// overrides WSU_ASCII when both are set.
    pub fn detect(force_ascii: bool) -> Self {
        if force_ascii {
            return ASCII;
        }
        if std::env::var_os("WSU_UNICODE").is_some() {
            return UNICODE;
        }
        if std::env::var_os("WSU_ASCII").is_some() {
            return ASCII;
        }
        UNICODE
    }
}

/// Number of distinct prefix colors before the palette cycles
pub const PALETTE_SIZE: usize = 5;

/// Style for the n-th package seen by the supervisor. Assignment is by
/// first sight and cycles through the palette.
pub fn prefix_style(index: usize) -> Style {
    match index % PALETTE_SIZE {
        0 => Style::new().cyan(),
        1 => Style::new().magenta(),
        2 => Style::new().green(),
        3 => Style::new().yellow(),
        _ => Style::new().blue(),
    }
}
