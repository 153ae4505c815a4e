//! GitHub Actions workflow commands
//!
//! `::debug::msg`, `::notice::msg`, `::warning file=..::msg`, `::error::msg`

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationLevel {
    Debug,
    Notice,
    Warning,
    Error,
}

impl AnnotationLevel {
    fn as_str(&self) -> &'static str {
        match self {
            AnnotationLevel::Debug => "debug",
            AnnotationLevel::Notice => "notice",
            AnnotationLevel::Warning => "warning",
            AnnotationLevel::Error => "error",
        }
    }
}

pub fn github_actions_annotation(
    level: AnnotationLevel,
    message: &str,
    file: Option<&str>,
    title: Option<&str>,
) -> String {
    let mut props = Vec::new();
    // debug accepts no properties
    if level != AnnotationLevel::Debug {
        if let Some(file) = file {
            props.push(format!("file={}", escape_property(file)));
        }
        if let Some(title) = title {
            props.push(format!("title={}", escape_property(title)));
        }
    }

    let prop_str = if props.is_empty() {
        String::new()
    } else {
        format!(" {}", props.join(","))
    };

    format!("::{}{}::{}", level.as_str(), prop_str, escape_data(message))
}

/// `::group::title` ... `::endgroup::`
pub fn group_start(title: &str) -> String {
    format!("::group::{}", escape_data(title))
}

pub fn group_end() -> &'static str {
    "::endgroup::"
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
