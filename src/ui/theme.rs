use crossterm::style::Color;

/// Design tokens for ferry console output.
///
/// - Only 4 semantic colors (`colors::*`)
/// - All status icons are sourced from this module
pub mod colors {
    use super::Color;

    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;
    pub const WARNING: Color = Color::Yellow;
    pub const DIM: Color = Color::DarkGrey;
}

pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const SKIPPED: &str = "○";
    pub const REMOTE: &str = "📡";
}

pub mod icons_ascii {
    pub const SUCCESS: &str = "[OK]";
    pub const ERROR: &str = "[FAIL]";
    pub const SKIPPED: &str = "[SKIP]";
    pub const REMOTE: &str = "[REMOTE]";
}

/// Icon set chosen once per process
#[derive(Debug, Clone, Copy)]
pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub skipped: &'static str,
    pub remote: &'static str,
}

impl Icons {
    pub fn new(unicode: bool) -> Self {
        if unicode {
            Self {
                success: icons::SUCCESS,
                error: icons::ERROR,
                skipped: icons::SKIPPED,
                remote: icons::REMOTE,
            }
        } else {
            Self {
                success: icons_ascii::SUCCESS,
                error: icons_ascii::ERROR,
                skipped: icons_ascii::SKIPPED,
                remote: icons_ascii::REMOTE,
            }
        }
    }
}
