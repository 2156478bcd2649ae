//! Aho-Corasick scan for active content
//!
//! Only printable ASCII survives decoding, so `<scr\0ipt` reads as `<script`.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Substrings that reject a file, matched case-insensitively
pub const DANGEROUS_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "vbscript:",
    "onclick=",
    "onerror=",
    "eval(",
    "document.write",
    "window.location",
    ".exe",
    ".bat",
    ".cmd",
    "powershell",
    "cmd.exe",
    "base64_decode",
    "<?php",
];

/// Pre-compiled scanner over the leading window of a file
pub struct ContentScanner {
    automaton: AhoCorasick,
    window: usize,
}

impl ContentScanner {
    /// Build a scanner inspecting the first `window` bytes
    pub fn new(window: usize) -> Result<Self, aho_corasick::BuildError> {
        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostFirst)
            .build(DANGEROUS_PATTERNS)?;
        Ok(Self { automaton, window })
    }

    /// First dangerous pattern found, if any
    pub fn scan(&self, content: &[u8]) -> Option<&'static str> {
        let text = printable_ascii(content, self.window);
        self.automaton
            .find(&text)
            .map(|m| DANGEROUS_PATTERNS[m.pattern().as_usize()])
    }

    /// Bytes inspected per file
    pub fn window(&self) -> usize {
        self.window
    }
}

/// Printable ASCII (0x20..=0x7E) from the first `limit` bytes
pub fn printable_ascii(content: &[u8], limit: usize) -> Vec<u8> {
    content
        .iter()
        .take(limit)
        .copied()
        .filter(|b| (0x20..=0x7E).contains(b))
        .collect()
}
