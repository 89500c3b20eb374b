//! Error types for settings loading and validation.

use std::{
    cmp::{max, min},
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error, Clone)]
/// Errors produced while loading, parsing, validating or saving settings.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem error.
    Read {
        /// Optional path associated with the error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// RON syntax or type error.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// 1-based line number, when the parser reported one.
        line: Option<usize>,
        /// 1-based column number, when the parser reported one.
        col: Option<usize>,
        /// Human-readable error message.
        message: String,
        /// Rendered excerpt including a caret at the error location.
        excerpt: Option<String>,
    },
    #[error("{message}")]
    /// Settings parsed but are not usable.
    Validation {
        /// Optional path associated with the validation error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// Settings could not be written back.
    Write {
        /// Destination path.
        path: PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Build a parse error from a RON error, locating it in `source` when the
    /// message carries a `line:col` prefix.
    pub(crate) fn from_ron(path: Option<&Path>, source: &str, err: &impl ToString) -> Self {
        let message = err.to_string();
        let loc = parse_location(&message);
        Self::Parse {
            path: path.map(Path::to_path_buf),
            line: loc.map(|(l, _)| l),
            col: loc.map(|(_, c)| c),
            excerpt: loc.map(|(l, c)| excerpt_at(source, l, c)),
            message,
        }
    }

    /// Render a human-friendly error message including location and an excerpt when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => {
                let loc = match (line, col) {
                    (Some(l), Some(c)) => format!(":{}:{}", l, c),
                    _ => String::new(),
                };
                let at = match path {
                    Some(p) => format!("{}{}", p.display(), loc),
                    None if !loc.is_empty() => format!("line{}", loc),
                    None => "<input>".to_string(),
                };
                match excerpt {
                    Some(ex) => format!("Config parse error at {}\n{}\n{}", at, message, ex),
                    None => format!("Config parse error at {}\n{}", at, message),
                }
            }
            Self::Validation { path, message } => match path {
                Some(p) => format!("Config validation error at {}\n{}", p.display(), message),
                None => format!("Config validation error\n{}", message),
            },
            Self::Write { path, message } => {
                format!("Failed to save config to {}: {}", path.display(), message)
            }
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
            Self::Write { path, .. } => Some(path),
        }
    }
}

/// Extract a leading `line:col` pair from a RON error message.
fn parse_location(message: &str) -> Option<(usize, usize)> {
    let head = message.split(|c: char| !(c.is_ascii_digit() || c == ':')).next()?;
    let mut parts = head.split(':').filter(|s| !s.is_empty());
    let line = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    Some((line, col))
}

/// Build a small 2–3 line excerpt with a caret at `(line_no, col_no)`.
pub fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let total = lines.len();
    let start = max(1usize, line_no.saturating_sub(2));
    let end = min(total, line_no + 1);

    let mut out = String::new();
    for n in start..=end {
        let text = lines.get(n - 1).copied().unwrap_or("");
        let _ignored = writeln!(out, " {:>4} | {}", n, text);
        if n == line_no {
            let prefix = format!(" {:>4} | ", n);
            let _ignored = writeln!(
                out,
                "{}{}^",
                " ".repeat(prefix.len()),
                " ".repeat(col_no.saturating_sub(1))
            );
        }
    }
    out
}
