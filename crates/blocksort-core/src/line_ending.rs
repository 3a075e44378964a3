//! Line ending helpers.
//!
//! [`TextDocument`](crate::TextDocument) stores text internally using LF (`'\n'`)
//! newlines. When a text using CRLF (`"\r\n"`) is opened, the content is normalized on
//! load, but the preferred line ending is tracked so hosts can restore it on save.
//!
//! Block texts handed to the sort orchestrator may still end in either sequence (hosts
//! are free to implement [`Document`](crate::Document) without normalizing), so suffix
//! handling recognizes both.

/// The preferred newline sequence of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// Detect the dominant line ending from a source text.
    ///
    /// Policy: if the input contains any CRLF (`"\r\n"`), returns [`LineEnding::Crlf`],
    /// otherwise [`LineEnding::Lf`].
    pub fn detect_in_text(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::Crlf
        } else {
            Self::Lf
        }
    }

    /// The newline sequence as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// Convert an LF-normalized text to this line ending for saving.
    pub fn apply_to_text(self, text: &str) -> String {
        match self {
            Self::Lf => text.to_string(),
            Self::Crlf => text.replace('\n', "\r\n"),
        }
    }

    /// Normalize CRLF and lone CR line breaks to LF.
    pub fn normalize(text: &str) -> String {
        if !text.contains('\r') {
            return text.to_string();
        }
        text.replace("\r\n", "\n").replace('\r', "\n")
    }
}

/// Split a single trailing newline (`"\r\n"` or `"\n"`) off `text`.
///
/// Returns `(body, suffix)` where `suffix` is empty if `text` does not end in a newline.
pub fn split_newline_suffix(text: &str) -> (&str, &str) {
    if let Some(body) = text.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = text.strip_suffix('\n') {
        (body, "\n")
    } else {
        (text, "")
    }
}
