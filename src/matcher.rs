//! Assertions over captured output lines.

use regex::Regex;
use std::fmt::{self, Display};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineMatchError {
    #[error("invalid pattern `{pattern}`: `{source}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid regex `{pattern}`: `{source}`")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("remains unmatched: `{pattern}`\n{log}")]
    Unmatched { pattern: String, log: String },

    #[error("unexpected match of `{pattern}` with line `{line}`")]
    UnexpectedMatch { pattern: String, line: String },
}

struct LinePattern {
    regex: Regex,
    verb: &'static str,
}

impl LinePattern {
    fn fnmatch(pattern: &str) -> Result<Self, LineMatchError> {
        Regex::new(&translate_fnmatch(pattern))
            .map(|regex| LinePattern {
                regex,
                verb: "fnmatch",
            })
            .map_err(|source| LineMatchError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    // anchored at the start of the line only
    fn regex(pattern: &str) -> Result<Self, LineMatchError> {
        Regex::new(&format!("^(?:{pattern})"))
            .map(|regex| LinePattern {
                regex,
                verb: "re.match",
            })
            .map_err(|source| LineMatchError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })
    }

    fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Turns a shell-style pattern into a whole-line regex.
///
/// `*` matches anything, `?` a single character, `[seq]` and `[!seq]` a character
/// in or out of `seq`. A `[` without its closing `]` is a literal, as any other
/// character is.
fn translate_fnmatch(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex = String::from(r"(?s)\A");
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                // consecutive stars are a single one
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                regex.push_str(".*");
            }
            '?' => regex.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    regex.push_str(&translate_class(&chars[i..end]));
                    i = end + 1;
                }
                None => regex.push_str(r"\["),
            },
            _ => regex.push_str(&escape_char(c)),
        }
    }
    regex.push_str(r"\z");
    regex
}

// Index of the `]` closing a class that starts at `start`. A `]` right after the
// opening `[` or `[!` belongs to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars[j..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| j + offset)
}

// Members are literal, except `a-z` style ranges. A reversed range matches nothing.
fn translate_class(content: &[char]) -> String {
    let (negated, content) = match content.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, content),
    };
    let mut members = String::new();
    let mut k = 0;
    while k < content.len() {
        let c = content[k];
        let range_end = match content.get(k + 1..k + 3) {
            Some(&['-', end]) if c != '-' && end != '-' => Some(end),
            _ => None,
        };
        match range_end {
            Some(end) => {
                if c <= end {
                    members.push_str(&escape_char(c));
                    members.push('-');
                    members.push_str(&escape_char(end));
                }
                k += 3;
            }
            None => {
                members.push_str(&escape_char(c));
                k += 1;
            }
        }
    }
    match (members.is_empty(), negated) {
        (true, false) => r"\b\B".to_string(),
        (true, true) => ".".to_string(),
        (false, false) => format!("[{members}]"),
        (false, true) => format!("[^{members}]"),
    }
}

fn escape_char(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0; 4]))
}

/// Snapshot of text lines to run ordered pattern assertions against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMatcher {
    lines: Vec<String>,
}

impl LineMatcher {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Checks that each shell-style pattern (`*`, `?`, `[...]`, as `fnmatch`) matches a line, in order.
    ///
    /// Every pattern consumes the lines up to and including the one it matched, so
    /// a line can satisfy only one pattern.
    pub fn fnmatch_lines<S: AsRef<str>>(&self, patterns: &[S]) -> Result<(), LineMatchError> {
        let patterns = patterns
            .iter()
            .map(|p| LinePattern::fnmatch(p.as_ref()).map(|c| (p.as_ref(), c)))
            .collect::<Result<Vec<_>, _>>()?;
        self.match_in_order(&patterns)
    }

    /// Like [`LineMatcher::fnmatch_lines`] with regular expressions matched from the start of each line.
    pub fn re_match_lines<S: AsRef<str>>(&self, patterns: &[S]) -> Result<(), LineMatchError> {
        let patterns = patterns
            .iter()
            .map(|p| LinePattern::regex(p.as_ref()).map(|c| (p.as_ref(), c)))
            .collect::<Result<Vec<_>, _>>()?;
        self.match_in_order(&patterns)
    }

    /// Fails if any line matches the shell-style pattern.
    pub fn no_fnmatch_line(&self, pattern: &str) -> Result<(), LineMatchError> {
        let compiled = LinePattern::fnmatch(pattern)?;
        match self.lines.iter().find(|line| compiled.is_match(line)) {
            Some(line) => Err(LineMatchError::UnexpectedMatch {
                pattern: pattern.to_string(),
                line: line.clone(),
            }),
            None => Ok(()),
        }
    }

    fn match_in_order(&self, patterns: &[(&str, LinePattern)]) -> Result<(), LineMatchError> {
        let mut log = Vec::new();
        let mut remaining = self.lines.iter();

        'patterns: for (raw, pattern) in patterns {
            let mut first = true;
            for line in remaining.by_ref() {
                if pattern.is_match(line) {
                    log.push(format!("{}: '{raw}'", pattern.verb));
                    log.push(format!("   with: '{line}'"));
                    continue 'patterns;
                }
                if first {
                    log.push(format!("nomatch: '{raw}'"));
                    first = false;
                }
                log.push(format!("    and: '{line}'"));
            }
            return Err(LineMatchError::Unmatched {
                pattern: raw.to_string(),
                log: log.join("\n"),
            });
        }
        Ok(())
    }
}

impl Display for LineMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}
