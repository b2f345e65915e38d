//! Placeholder substitution.
//!
//! A template is plain text with tokens of the form `<sigil><identifier>`.
//! The sigil says where the value is going, and the formatter picks the
//! escaping from that:
//!
//! | Sigil | Rule |
//! |-------|------|
//! | `@`   | pass through if safe, else HTML-escape |
//! | `%`   | as `@`, then wrap in `<em class="placeholder">` |
//! | `:`   | pass through if safe, else HTML-escape and strip dangerous schemes |
//! | `!`   | insert verbatim |
//!
//! An identifier starts with an ASCII letter or `_` and continues with ASCII
//! letters, digits or `_`; the longest run is taken. A sigil that is not
//! followed by an identifier is literal text.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Misuse};
use crate::escape::encode_html;
use crate::{Arg, Markup, ProtocolFilter, SafeStrings, Strategy};

/// The leading character of a placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// `@`: escaped body text
    Escape,
    /// `%`: escaped and emphasized
    Emphasis,
    /// `:`: escaped, dangerous URI schemes stripped
    ///
    /// A value that is already safe is passed through without stripping.
    /// Text that once went through an `@` slot is registered as safe HTML,
    /// so `javascript:` text first rendered as body text and later used in a
    /// `:` slot comes out unchanged. Do not reuse URL values across slots.
    Url,
    /// `!`: inserted verbatim
    Raw,
}

impl Sigil {
    /// Maps a byte to its sigil.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'@' => Some(Sigil::Escape),
            b'%' => Some(Sigil::Emphasis),
            b':' => Some(Sigil::Url),
            b'!' => Some(Sigil::Raw),
            _ => None,
        }
    }

    /// The sigil character.
    pub fn as_char(self) -> char {
        match self {
            Sigil::Escape => '@',
            Sigil::Emphasis => '%',
            Sigil::Url => ':',
            Sigil::Raw => '!',
        }
    }
}

/// One lexical unit of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'t> {
    /// Text copied to the output unchanged
    Literal(&'t str),
    /// A placeholder to substitute
    Placeholder {
        /// The sigil selecting the escaping rule
        sigil: Sigil,
        /// The full token text, sigil included (the argument map key)
        text: &'t str,
    },
}

/// Iterator over the tokens of a template. Created by [`tokenize`].
#[derive(Debug, Clone)]
pub struct Tokens<'t> {
    rest: &'t str,
}

/// Splits a template into literal runs and placeholders in one linear pass.
///
/// ```
/// use safe_markup::{tokenize, Sigil, Token};
///
/// let tokens: Vec<_> = tokenize("Hi @name, 50% off!").collect();
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Literal("Hi "),
///         Token::Placeholder { sigil: Sigil::Escape, text: "@name" },
///         Token::Literal(", 50% off!"),
///     ]
/// );
/// ```
pub fn tokenize(template: &str) -> Tokens<'_> {
    Tokens { rest: template }
}

// Length of the placeholder at the start of `bytes`, sigil included.
fn placeholder_len(bytes: &[u8]) -> Option<usize> {
    Sigil::from_byte(*bytes.first()?)?;
    let start = *bytes.get(1)?;
    if !(start.is_ascii_alphabetic() || start == b'_') {
        return None;
    }
    let ident = bytes[1..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    Some(1 + ident)
}

impl<'t> Iterator for Tokens<'t> {
    type Item = Token<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.rest.as_bytes();
        if bytes.is_empty() {
            return None;
        }

        // Sigils and identifier characters are ASCII, so every split below
        // lands on a char boundary.
        if let Some(len) = placeholder_len(bytes) {
            let (text, rest) = self.rest.split_at(len);
            self.rest = rest;
            let sigil = Sigil::from_byte(bytes[0])?;
            return Some(Token::Placeholder { sigil, text });
        }

        let mut end = 1;
        while end < bytes.len() && placeholder_len(&bytes[end..]).is_none() {
            end += 1;
        }
        let (text, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(Token::Literal(text))
    }
}

/// Argument map for [`Formatter::format`], keyed by full token text.
///
/// Entries the template never references are ignored.
///
/// ```
/// use safe_markup::Args;
///
/// let args = Args::new().with("@name", "Ada").with("%count", 3);
/// assert_eq!(args.get("%count").map(|a| a.as_text()), Some("3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: HashMap<String, Arg>,
}

impl Args {
    /// Creates an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, builder style.
    pub fn with(mut self, token: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.insert(token, value);
        self
    }

    /// Adds an argument, returning the one it replaced.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<Arg>) -> Option<Arg> {
        self.values.insert(token.into(), value.into())
    }

    /// Looks up an argument by full token text.
    pub fn get(&self, token: &str) -> Option<&Arg> {
        self.values.get(token)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Args
where
    K: Into<String>,
    V: Into<Arg>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Args::new();
        for (token, value) in iter {
            args.insert(token, value);
        }
        args
    }
}

/// The result of a format call: output text plus whether it is proven safe.
///
/// Renderers use [`is_safe`](Self::is_safe) to decide whether to suppress
/// further auto-escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedText {
    text: String,
    safe: bool,
}

impl FormattedText {
    /// Borrows the output text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` if every substituted value was escaped or already safe.
    pub fn is_safe(&self) -> bool {
        self.safe
    }

    /// Splits into `(output, is_safe)`.
    pub fn into_parts(self) -> (String, bool) {
        (self.text, self.safe)
    }

    /// Consumes the result and returns the output text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Promotes a proven-safe result to trusted markup.
    ///
    /// Returns `None` if a `!` substitution left the result unproven.
    pub fn into_markup(self) -> Option<Markup> {
        self.safe.then(|| Markup::new_unchecked(self.text))
    }
}

impl fmt::Display for FormattedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// A template token with its argument already looked up.
enum Piece<'t, 'a> {
    Literal(&'t str),
    Value {
        sigil: Sigil,
        key: &'t str,
        value: &'a Arg,
    },
}

/// Substitutes placeholders using a registry to decide what is safe.
///
/// # Examples
///
/// ```
/// use safe_markup::{Args, Formatter, SafeStrings};
///
/// let registry = SafeStrings::new();
/// let formatter = Formatter::new(&registry);
///
/// let out = formatter
///     .format("Hello @who", &Args::new().with("@who", "<script>"))
///     .unwrap();
/// assert_eq!(out.as_str(), "Hello &lt;script&gt;");
/// assert!(out.is_safe());
///
/// let raw = formatter
///     .format("!html", &Args::new().with("!html", "<b>hi</b>"))
///     .unwrap();
/// assert_eq!(raw.into_parts(), ("<b>hi</b>".to_string(), false));
/// ```
#[derive(Debug, Clone)]
pub struct Formatter<'r> {
    registry: &'r SafeStrings,
    protocols: ProtocolFilter,
}

impl<'r> Formatter<'r> {
    /// Creates a formatter with the default protocol allow-list.
    pub fn new(registry: &'r SafeStrings) -> Self {
        Self {
            registry,
            protocols: ProtocolFilter::default(),
        }
    }

    /// Replaces the protocol allow-list used by `:` placeholders.
    pub fn with_protocol_filter(mut self, protocols: ProtocolFilter) -> Self {
        self.protocols = protocols;
        self
    }

    /// Returns the registry this formatter reads and writes.
    pub fn registry(&self) -> &'r SafeStrings {
        self.registry
    }

    /// Substitutes every placeholder in `template`.
    ///
    /// Every placeholder is resolved against `args` before anything is
    /// escaped. Substitution is then one left-to-right pass; one argument's
    /// escaping never sees another argument's output. When the result is
    /// proven safe it is registered under [`Strategy::Html`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Misuse`] with
    /// [`MisuseKind::MissingArgument`](crate::MisuseKind::MissingArgument)
    /// if the template references a token that `args` does not supply.
    /// Nothing is registered in that case.
    pub fn format(&self, template: &str, args: &Args) -> Result<FormattedText, Error> {
        let pieces = tokenize(template)
            .map(|token| match token {
                Token::Literal(literal) => Ok(Piece::Literal(literal)),
                Token::Placeholder { sigil, text } => args
                    .get(text)
                    .map(|value| Piece::Value {
                        sigil,
                        key: text,
                        value,
                    })
                    .ok_or_else(|| Misuse::missing_argument(text)),
            })
            .collect::<Result<Vec<_>, Misuse>>()?;

        let mut output = String::with_capacity(template.len());
        let mut safe = true;

        for piece in pieces {
            let (sigil, key, value) = match piece {
                Piece::Literal(literal) => {
                    output.push_str(literal);
                    continue;
                }
                Piece::Value { sigil, key, value } => (sigil, key, value),
            };

            match sigil {
                Sigil::Escape => output.push_str(&self.registry.escape(value)),
                Sigil::Emphasis => output.push_str(&self.registry.placeholder(value)),
                Sigil::Url => output.push_str(&self.url(value)),
                Sigil::Raw => {
                    if !self.registry.is_safe(value, Strategy::Html) {
                        safe = false;
                        self.registry.log().debug(format_args!(
                            "'{}' inserted unescaped; result not proven safe",
                            key
                        ));
                    }
                    output.push_str(value.as_text());
                }
            }
        }

        if safe {
            self.registry.mark_safe(&output, Strategy::Html);
        }
        Ok(FormattedText { text: output, safe })
    }

    fn url(&self, value: &Arg) -> String {
        if self.registry.is_safe(value, Strategy::Html) {
            return value.as_text().to_string();
        }
        // The escaped-but-unstripped form must not reach the registry.
        let stripped = self.protocols.strip(&encode_html(value.as_text()));
        self.registry.mark_safe(&stripped, Strategy::Html);
        stripped
    }
}

impl SafeStrings {
    /// Formats `template` with the default protocol allow-list.
    ///
    /// Shorthand for `Formatter::new(self).format(template, args)`.
    ///
    /// # Errors
    ///
    /// See [`Formatter::format`].
    pub fn format(&self, template: &str, args: &Args) -> Result<FormattedText, Error> {
        Formatter::new(self).format(template, args)
    }
}
