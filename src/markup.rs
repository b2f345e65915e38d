use std::fmt;

/// A string that is known to be safe markup by construction.
///
/// `Markup` is the trusted-markup capability: holding one proves the text
/// needs no further HTML escaping, independently of any registry lookup.
/// The registry checks for this capability before it ever looks at string
/// content.
///
/// # Construction Invariants
///
/// There is no public constructor taking an arbitrary runtime `String`, and
/// no `From<String>`. A `Markup` comes from one of:
///
/// - [`Markup::from_static`]: literal markup written in source code
/// - [`FormattedText::into_markup`](crate::FormattedText::into_markup): a
///   placeholder substitution that was proven safe
/// - [`SafeStrings::join`](crate::SafeStrings::join): escaped pieces joined
///   together
///
/// ```compile_fail
/// use safe_markup::Markup;
///
/// let user_input = String::from("<script>");
/// let markup = Markup::from_static(&user_input); // not 'static
/// ```
///
/// # Examples
///
/// ```
/// use safe_markup::{Markup, SafeStrings, Arg, Strategy};
///
/// let registry = SafeStrings::new();
/// let markup = Markup::from_static("<br>");
///
/// // Recognized without ever touching the registry
/// assert!(registry.is_safe(&Arg::from(markup), Strategy::All));
/// assert!(!registry.contains("<br>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Markup {
    inner: String,
}

impl Markup {
    /// Wraps literal markup that ships with the program.
    ///
    /// Only `'static` strings are accepted: text assembled at runtime has to
    /// earn the capability through escaping or a proven-safe format call.
    pub fn from_static(markup: &'static str) -> Self {
        Self {
            inner: markup.to_string(),
        }
    }

    /// Creates `Markup` without checking anything.
    ///
    /// Callers inside the crate must only pass text that was produced by an
    /// escaping primitive or by a format call whose result was proven safe.
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self { inner: value }
    }

    /// Borrows the markup text.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Consumes the wrapper and returns the markup text.
    pub fn into_string(self) -> String {
        self.inner
    }
}

impl AsRef<str> for Markup {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

/// A substitution value for a placeholder, or any value whose safety is
/// being asked about.
///
/// Plain text is untrusted until the registry says otherwise; `Markup`
/// carries its own proof. Numbers, booleans and characters become plain text
/// through their `Display` form.
///
/// ```
/// use safe_markup::Arg;
///
/// assert_eq!(Arg::from(42).as_text(), "42");
/// assert_eq!(Arg::from(true).as_text(), "true");
/// assert!(!Arg::from("<b>").is_markup());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Untrusted text
    Text(String),
    /// Text carrying the trusted-markup capability
    Markup(Markup),
}

impl Arg {
    /// Borrows the underlying text, whichever variant this is.
    pub fn as_text(&self) -> &str {
        match self {
            Arg::Text(text) => text,
            Arg::Markup(markup) => markup.as_str(),
        }
    }

    /// Returns `true` if this value carries the trusted-markup capability.
    pub fn is_markup(&self) -> bool {
        matches!(self, Arg::Markup(_))
    }
}

impl From<Markup> for Arg {
    fn from(markup: Markup) -> Self {
        Arg::Markup(markup)
    }
}

impl From<&Markup> for Arg {
    fn from(markup: &Markup) -> Self {
        Arg::Markup(markup.clone())
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Text(text)
    }
}

impl From<&String> for Arg {
    fn from(text: &String) -> Self {
        Arg::Text(text.clone())
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Text(text.to_string())
    }
}

macro_rules! arg_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Text(value.to_string())
                }
            }
        )*
    };
}

arg_from_display!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);
