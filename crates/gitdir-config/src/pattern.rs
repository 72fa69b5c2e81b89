//! Repository glob patterns used by organization rules.
//!
//! `*` matches any run of characters except `/`, `**` matches any run
//! including `/`, `?` matches a single non-`/` character. Everything else is
//! literal.

use std::cmp::Ordering;
use std::fmt;

/// Longest pattern accepted, in bytes.
pub const MAX_PATTERN_LEN: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Literal(char),
    Any,
    Star,
    DoubleStar,
}

/// A compiled repository pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// Patterns are relative to the organization: they must be non-empty,
    /// must not start or end with `/` and must not contain empty components.
    pub fn new(source: &str) -> Result<Self, String> {
        if source.is_empty() {
            return Err("pattern must not be empty".into());
        }
        if source.len() > MAX_PATTERN_LEN {
            return Err(format!(
                "pattern is {} bytes long, the limit is {MAX_PATTERN_LEN}",
                source.len()
            ));
        }
        if source.split('/').any(str::is_empty) {
            return Err(format!("pattern {source:?} has an empty path component"));
        }

        let mut tokens = Vec::with_capacity(source.len());
        let mut chars = source.chars().peekable();
        while let Some(ch) = chars.next() {
            let token = match ch {
                '*' => {
                    if chars.peek() == Some(&'*') {
                        while chars.peek() == Some(&'*') {
                            chars.next();
                        }
                        Token::DoubleStar
                    } else {
                        Token::Star
                    }
                }
                '?' => Token::Any,
                other => Token::Literal(other),
            };
            tokens.push(token);
        }

        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern contains no wildcards.
    pub fn is_literal(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Literal(_)))
    }

    /// Number of literal characters in the pattern.
    pub fn literal_len(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, Token::Literal(_)))
            .count()
    }

    /// Compare how specific two patterns are.
    ///
    /// A wildcard-free pattern beats any wildcard pattern; otherwise more
    /// literal characters win.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        (self.is_literal(), self.literal_len()).cmp(&(other.is_literal(), other.literal_len()))
    }

    /// Match a repository sub-path against the pattern.
    pub fn matches(&self, path: &str) -> bool {
        let text: Vec<char> = path.chars().collect();
        match_tokens(&self.tokens, &text)
    }
}

/// Walks the tokens once, tracking every text offset reachable after each
/// token. Runs in `O(tokens * text)` regardless of how many wildcards the
/// pattern holds.
fn match_tokens(tokens: &[Token], text: &[char]) -> bool {
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    let mut next = vec![false; text.len() + 1];

    for token in tokens {
        next.iter_mut().for_each(|slot| *slot = false);
        match token {
            Token::Literal(ch) => {
                for (at, c) in text.iter().enumerate() {
                    next[at + 1] = reachable[at] && c == ch;
                }
            }
            Token::Any => {
                for (at, c) in text.iter().enumerate() {
                    next[at + 1] = reachable[at] && *c != '/';
                }
            }
            Token::Star => {
                next[0] = reachable[0];
                for (at, c) in text.iter().enumerate() {
                    next[at + 1] = reachable[at + 1] || (next[at] && *c != '/');
                }
            }
            Token::DoubleStar => {
                next[0] = reachable[0];
                for at in 0..text.len() {
                    next[at + 1] = reachable[at + 1] || next[at];
                }
            }
        }
        std::mem::swap(&mut reachable, &mut next);
        if !reachable.iter().any(|r| *r) {
            return false;
        }
    }
    reachable[text.len()]
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
