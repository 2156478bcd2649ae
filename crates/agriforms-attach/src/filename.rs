//! File name rules

use regex::Regex;
use std::fmt;

/// Longest accepted file name, in characters
pub const MAX_FILENAME_CHARS: usize = 255;

const EXECUTABLE_SUFFIX: &str = r"(?i)\.(exe|bat|cmd|ps1|vbs|js|jar|msi|com|scr)$";

/// Lower-cased text after the last `.`; empty when there is none or the name ends with `.`
pub fn extension_of(filename: &str) -> String {
    match filename.rfind('.') {
        Some(pos) if pos + 1 < filename.len() => filename[pos + 1..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// What is wrong with a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameIssue {
    /// Ends with an executable or script extension (`invoice.pdf.exe`)
    ExecutableSuffix,
    /// Starts with a dot
    Hidden,
    /// Contains a NUL byte
    NullByte,
    /// Longer than [`MAX_FILENAME_CHARS`]
    TooLong,
}

impl fmt::Display for FilenameIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ExecutableSuffix => "executable extension",
            Self::Hidden => "hidden file",
            Self::NullByte => "null byte",
            Self::TooLong => "name too long",
        };
        f.write_str(msg)
    }
}

/// Compiled file name checks
#[derive(Debug, Clone)]
pub struct FilenameRules {
    executable_suffix: Regex,
}

impl FilenameRules {
    /// Compile the rules
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            executable_suffix: Regex::new(EXECUTABLE_SUFFIX)?,
        })
    }

    /// Check a client file name
    pub fn check(&self, filename: &str) -> Result<(), FilenameIssue> {
        if self.executable_suffix.is_match(filename) {
            return Err(FilenameIssue::ExecutableSuffix);
        }
        if filename.starts_with('.') {
            return Err(FilenameIssue::Hidden);
        }
        if memchr::memchr(0, filename.as_bytes()).is_some() {
            return Err(FilenameIssue::NullByte);
        }
        if filename.chars().count() > MAX_FILENAME_CHARS {
            return Err(FilenameIssue::TooLong);
        }
        Ok(())
    }
}
