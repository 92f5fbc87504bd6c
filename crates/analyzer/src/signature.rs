//! Line-based detection of exported async function definitions
//!
//! This is a structural scan, not a parse: each configured pattern is tried
//! against every line, and the first capture group is the symbol name.

use endpoint_coverage_common::{CoverageError, Result};
use regex::Regex;

/// Lines after the signature line searched for the body opener
const DECLARATION_LOOKAHEAD: usize = 4;

/// Compiled signature patterns
#[derive(Debug, Clone)]
pub struct SignatureScanner {
    patterns: Vec<Regex>,
}

impl SignatureScanner {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(p).map_err(|e| {
                    CoverageError::Config(format!("invalid signature pattern '{p}': {e}"))
                })?;
                if regex.captures_len() < 2 {
                    return Err(CoverageError::Config(format!(
                        "signature pattern '{p}' has no capture group for the symbol name"
                    )));
                }
                Ok(regex)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Every `(line, symbol, declaration)` in `content`, lines 1-based
    pub fn scan(&self, content: &str) -> Vec<(usize, String, String)> {
        let lines: Vec<&str> = content.lines().collect();
        let mut found = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let symbol = self
                .patterns
                .iter()
                .find_map(|p| p.captures(line).and_then(|c| c.get(1)))
                .map(|m| m.as_str().to_string());

            if let Some(symbol) = symbol {
                found.push((i + 1, symbol, declaration_text(&lines, i)));
            }
        }

        found
    }
}

/// Join the signature line with following lines until the body opens
fn declaration_text(lines: &[&str], start: usize) -> String {
    let mut parts = Vec::new();
    for line in lines.iter().skip(start).take(DECLARATION_LOOKAHEAD + 1) {
        let trimmed = line.trim();
        parts.push(trimmed);
        if trimmed.contains('{') || trimmed.contains("=>") || trimmed.ends_with(';') {
            break;
        }
    }
    parts.join(" ")
}
