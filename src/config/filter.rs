// src/config/filter.rs

use std::borrow::Cow;
use std::fmt;

use crate::errors::{BuildLogError, Result};

/// A tokenized filter command.
///
/// Always holds at least one token (the program). Construct it with
/// [`FilterCommand::parse`], which maps an empty token list to "no filter".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCommand {
    argv: Vec<String>,
}

impl FilterCommand {
    /// Tokenize `raw` with POSIX shell-word rules.
    ///
    /// - `Ok(None)` if the string contains no tokens (empty or whitespace).
    /// - `Err(ConfigError)` if quoting is unbalanced.
    ///
    /// `#` never starts a comment: `grep -v #include` is three words.
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        let argv = shlex::split(&escape_leading_hashes(raw)).ok_or_else(|| {
            BuildLogError::ConfigError(format!(
                "filter command has unbalanced quoting: {raw:?}"
            ))
        })?;

        if argv.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self { argv }))
    }

    /// Build directly from an argv vector; `None` if it is empty.
    pub fn from_argv(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for FilterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self
            .argv
            .iter()
            .map(|arg| {
                shlex::try_quote(arg)
                    .map(|q| q.into_owned())
                    .unwrap_or_else(|_| arg.clone())
            })
            .collect();
        f.write_str(&quoted.join(" "))
    }
}

/// Backslash-escape every unquoted `#` that begins a word, which `shlex`
/// would otherwise treat as the start of a comment.
fn escape_leading_hashes(raw: &str) -> Cow<'_, str> {
    if !raw.contains('#') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len() + 2);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut word_start = true;

    for c in raw.chars() {
        if escaped {
            escaped = false;
            word_start = false;
            out.push(c);
            continue;
        }

        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                }
            }
            Some(_) => match c {
                '\\' => escaped = true,
                '"' => quote = None,
                _ => {}
            },
            None => match c {
                '\\' => escaped = true,
                '\'' | '"' => quote = Some(c),
                '#' if word_start => out.push('\\'),
                _ => {}
            },
        }

        word_start = quote.is_none() && !escaped && c.is_whitespace();
        out.push(c);
    }

    Cow::Owned(out)
}
