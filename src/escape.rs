//! HTML escaping primitives.
//!
//! Every primitive that produces escaped output registers that output as
//! safe under [`Strategy::Html`], so escaping the same literal twice (or
//! passing an escaped result back in as an argument) is a pass-through.

use crate::{Arg, Markup, SafeStrings, Strategy};

const PLACEHOLDER_OPEN: &str = "<em class=\"placeholder\">";
const PLACEHOLDER_CLOSE: &str = "</em>";

/// Encodes the five HTML-significant characters.
///
/// This is the stateless core of [`SafeStrings::escape_html`]; it does not
/// register anything. Single quotes become `&#039;`.
///
/// ```
/// assert_eq!(
///     safe_markup::encode_html(r#"<a href="x">'&'</a>"#),
///     "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;"
/// );
/// ```
pub fn encode_html(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#039;"),
            _ => output.push(ch),
        }
    }
    output
}

/// Wraps already-escaped text in the placeholder emphasis marker.
pub(crate) fn emphasize(escaped: &str) -> String {
    let mut output =
        String::with_capacity(PLACEHOLDER_OPEN.len() + escaped.len() + PLACEHOLDER_CLOSE.len());
    output.push_str(PLACEHOLDER_OPEN);
    output.push_str(escaped);
    output.push_str(PLACEHOLDER_CLOSE);
    output
}

impl SafeStrings {
    /// HTML-escapes `text` and registers the result as safe HTML.
    ///
    /// A `&str` is always well-formed UTF-8, so this cannot fail. Use
    /// [`escape_html_bytes`](Self::escape_html_bytes) for raw input.
    pub fn escape_html(&self, text: &str) -> String {
        let escaped = encode_html(text);
        self.mark_safe(&escaped, Strategy::Html);
        escaped
    }

    /// HTML-escapes raw bytes after validating them as UTF-8.
    ///
    /// Malformed input yields an empty string and nothing is registered.
    /// Rendering nothing is preferred over emitting malformed markup or
    /// aborting the surrounding page.
    ///
    /// ```
    /// use safe_markup::SafeStrings;
    ///
    /// let registry = SafeStrings::new();
    /// assert_eq!(registry.escape_html_bytes(b"a<b"), "a&lt;b");
    /// assert_eq!(registry.escape_html_bytes(b"\xff<script>"), "");
    /// ```
    pub fn escape_html_bytes(&self, bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.escape_html(text),
            Err(e) => {
                self.log().warn(format_args!(
                    "refusing to escape malformed UTF-8 ({} bytes, invalid at {})",
                    bytes.len(),
                    e.valid_up_to()
                ));
                String::new()
            }
        }
    }

    /// Returns `value` unchanged if it is already safe HTML, otherwise its
    /// escaped form.
    ///
    /// ```
    /// use safe_markup::{Arg, Markup, SafeStrings};
    ///
    /// let registry = SafeStrings::new();
    /// assert_eq!(registry.escape(&Arg::from("<i>")), "&lt;i&gt;");
    /// assert_eq!(registry.escape(&Markup::from_static("<i>").into()), "<i>");
    /// ```
    pub fn escape(&self, value: &Arg) -> String {
        if self.is_safe(value, Strategy::Html) {
            value.as_text().to_string()
        } else {
            self.escape_html(value.as_text())
        }
    }

    /// Escapes `value` like [`escape`](Self::escape) and wraps it in
    /// `<em class="placeholder">`. The wrapped result is registered as safe.
    pub fn placeholder(&self, value: &Arg) -> String {
        let wrapped = emphasize(&self.escape(value));
        self.mark_safe(&wrapped, Strategy::Html);
        wrapped
    }

    /// Joins values with `delimiter`, escaping every piece that is not
    /// already safe, and returns the result as trusted markup.
    ///
    /// ```
    /// use safe_markup::{Arg, Markup, SafeStrings};
    ///
    /// let registry = SafeStrings::new();
    /// let items = [Arg::from("a&b"), Markup::from_static("<br>").into()];
    /// let joined = registry.join(&items, &Arg::from(", "));
    ///
    /// assert_eq!(joined.as_str(), "a&amp;b, <br>");
    /// assert!(registry.contains("a&amp;b, <br>"));
    /// ```
    pub fn join<'a, I>(&self, values: I, delimiter: &Arg) -> Markup
    where
        I: IntoIterator<Item = &'a Arg>,
    {
        let delimiter = self.escape(delimiter);
        let mut output = String::new();
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                output.push_str(&delimiter);
            }
            output.push_str(&self.escape(value));
        }
        self.mark_safe(&output, Strategy::Html);
        Markup::new_unchecked(output)
    }
}
