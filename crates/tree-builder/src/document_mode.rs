use std::fmt;

/// Document compatibility mode chosen while processing the DOCTYPE.
///
/// @see https://dom.spec.whatwg.org/#concept-document-mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum DocumentMode {
    /// > In no-quirks mode, the behavior is (hopefully) the desired behavior
    /// > described by the modern HTML and CSS specifications.
    #[default]
    NoQuirks,

    /// > In quirks mode, layout emulates behavior in Navigator 4 and Internet
    /// > Explorer 5.
    ///
    /// The tree builder itself only cares about one quirk: a `<table>` start
    /// tag does not close an open `<p>` element.
    Quirks,

    /// "Almost standards" mode.
    LimitedQuirks,
}

impl DocumentMode {
    pub fn is_quirks(&self) -> bool {
        *self == DocumentMode::Quirks
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl From<&DocumentMode> for &'static str {
    fn from(val: &DocumentMode) -> Self {
        match val {
            DocumentMode::NoQuirks => "no-quirks",
            DocumentMode::Quirks => "quirks",
            DocumentMode::LimitedQuirks => "limited-quirks",
        }
    }
}

impl fmt::Display for DocumentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
