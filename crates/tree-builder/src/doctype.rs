use crate::document_mode::DocumentMode;

/**
 * A DOCTYPE token as delivered by the tokenizer.
 *
 * > DOCTYPE tokens have a name, a public identifier, a system identifier,
 * > and a force-quirks flag. When a DOCTYPE token is created, its name, public identifier,
 * > and system identifier must be marked as missing (which is a distinct state from the
 * > empty string), and the force-quirks flag must be set to off (its other state is on).
 *
 * @see https://html.spec.whatwg.org/multipage/parsing.html#tokenization
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctypeInfo {
    /**
     * Name of the DOCTYPE: should be "html" for HTML documents.
     *
     * ```text
     * <!DOCTYPE html>
     *           ╰──┴── name is "html".
     * ```
     *
     * The tokenizer reports the name in lower case.
     */
    pub name: Option<String>,

    /**
     * Public identifier of the DOCTYPE, `None` when missing.
     *
     * ```text
     * <!DOCTYPE html PUBLIC "public id goes here in quotes">
     *           │  │         ╰─── public identifier ─────╯
     *           ╰──┴── name is "html".
     * ```
     */
    pub public_identifier: Option<String>,

    /**
     * System identifier of the DOCTYPE, `None` when missing.
     *
     * ```text
     * <!DOCTYPE html SYSTEM "system id goes here in quotes">
     *           │  │         ╰──── system identifier ────╯
     *           ╰──┴── name is "html".
     * ```
     */
    pub system_identifier: Option<String>,

    pub force_quirks: bool,
}

/*
 * > The public identifier starts with…
 */
const QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

/*
 * > The public identifier is set to…
 */
const QUIRKY_PUBLIC_IDS: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

const QUIRKY_SYSTEM_ID: &str = "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

const HTML_401_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

const XHTML_10_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

fn starts_with_any(haystack: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| haystack.starts_with(prefix))
}

impl DoctypeInfo {
    pub fn new(
        name: Option<&str>,
        public_identifier: Option<&str>,
        system_identifier: Option<&str>,
        force_quirks: bool,
    ) -> Self {
        Self {
            name: name.map(str::to_owned),
            public_identifier: public_identifier.map(str::to_owned),
            system_identifier: system_identifier.map(str::to_owned),
            force_quirks,
        }
    }

    /// Whether this is a conforming DOCTYPE.
    ///
    /// > If the DOCTYPE token's name is not "html", or the token's public identifier is not
    /// > missing, or the token's system identifier is neither missing nor "about:legacy-compat",
    /// > then there is a parse error.
    pub fn is_conforming(&self) -> bool {
        self.name.as_deref() == Some("html")
            && self.public_identifier.is_none()
            && self
                .system_identifier
                .as_deref()
                .map_or(true, |system| system == "about:legacy-compat")
    }

    /// The document mode this DOCTYPE indicates, ignoring `srcdoc` documents.
    ///
    /// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
    pub fn document_mode(&self) -> DocumentMode {
        /*
         * > The force-quirks flag is set to on.
         * > The name is not "html".
         */
        if self.force_quirks || self.name.as_deref() != Some("html") {
            return DocumentMode::Quirks;
        }

        /*
         * > The system identifier and public identifier strings must be compared...
         * > in an ASCII case-insensitive manner.
         * >
         * > A system identifier whose value is the empty string is not considered missing
         * > for the purposes of the conditions above.
         */
        let system_identifier_is_missing = self.system_identifier.is_none();
        let public = self
            .public_identifier
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let system = self
            .system_identifier
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if QUIRKY_PUBLIC_IDS.contains(&public.as_str())
            || system == QUIRKY_SYSTEM_ID
            || starts_with_any(&public, QUIRKY_PUBLIC_PREFIXES)
        {
            return DocumentMode::Quirks;
        }

        /*
         * > The system identifier is missing and the public identifier starts with…
         */
        if starts_with_any(&public, HTML_401_PREFIXES) {
            return if system_identifier_is_missing {
                DocumentMode::Quirks
            } else {
                DocumentMode::LimitedQuirks
            };
        }

        if starts_with_any(&public, XHTML_10_PREFIXES) {
            return DocumentMode::LimitedQuirks;
        }

        DocumentMode::NoQuirks
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! test_document_mode {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (name, public, system, force, expected): (Option<&str>, Option<&str>, Option<&str>, bool, DocumentMode) = $value;
                let doctype = DoctypeInfo::new(name, public, system, force);
                assert_eq!(
                    expected,
                    doctype.document_mode(),
                    "Failed to infer the expected document mode for {:?}",
                    doctype
                );
            }
        )*
        }
    }

    test_document_mode! {
        html5_doctype:                        ( Some("html"), None,                                            None,                                             false, DocumentMode::NoQuirks ),
        legacy_compat:                        ( Some("html"), None,                                            Some("about:legacy-compat"),                      false, DocumentMode::NoQuirks ),
        force_quirks:                         ( Some("html"), None,                                            None,                                             true,  DocumentMode::Quirks ),
        missing_name:                         ( None,         None,                                            None,                                             false, DocumentMode::Quirks ),
        svg_name:                             ( Some("svg"),  Some("-//W3C//DTD SVG 1.1//EN"),                 None,                                             false, DocumentMode::Quirks ),
        html_40_frameset:                     ( Some("html"), Some("-//W3C//DTD HTML 4.0 Frameset//EN"),       None,                                             false, DocumentMode::Quirks ),
        html_40_transitional_exact:           ( Some("html"), Some("-/W3C/DTD HTML 4.0 Transitional/EN"),      None,                                             false, DocumentMode::Quirks ),
        public_id_html:                       ( Some("html"), Some("HTML"),                                    None,                                             false, DocumentMode::Quirks ),
        ibm_system_id:                        ( Some("html"), None,                                            Some("http://www.ibm.com/data/dtd/v11/IBMXHTML1-transitional.dtd"), false, DocumentMode::Quirks ),
        html_401_strict:                      ( Some("html"), Some("-//W3C//DTD HTML 4.01//EN"),               Some("http://www.w3.org/TR/html4/strict.dtd"),    false, DocumentMode::NoQuirks ),
        html_401_transitional_no_system:      ( Some("html"), Some("-//W3C//DTD HTML 4.01 Transitional//EN"),  None,                                             false, DocumentMode::Quirks ),
        html_401_transitional_with_system:    ( Some("html"), Some("-//W3C//DTD HTML 4.01 Transitional//EN"),  Some(""),                                         false, DocumentMode::LimitedQuirks ),
        html_401_frameset_with_system:        ( Some("html"), Some("-//W3C//DTD HTML 4.01 Frameset//EN"),      Some("http://www.w3.org/TR/html4/frameset.dtd"),  false, DocumentMode::LimitedQuirks ),
        xhtml_10_transitional:                ( Some("html"), Some("-//W3C//DTD XHTML 1.0 Transitional//EN"),  None,                                             false, DocumentMode::LimitedQuirks ),
        xhtml_10_strict:                      ( Some("html"), Some("-//W3C//DTD XHTML 1.0 Strict//EN"),        None,                                             false, DocumentMode::NoQuirks ),
        mozilla_prefix_mixed_case:            ( Some("html"), Some("-//WebTechs//DTD Mozilla HTML//EN"),       None,                                             false, DocumentMode::Quirks ),
        empty_public_id:                      ( Some("html"), Some(""),                                        Some(""),                                         false, DocumentMode::NoQuirks ),
    }

    #[test]
    fn conformance() {
        assert!(DoctypeInfo::new(Some("html"), None, None, false).is_conforming());
        assert!(
            DoctypeInfo::new(Some("html"), None, Some("about:legacy-compat"), false).is_conforming()
        );
        assert!(!DoctypeInfo::new(Some("html"), Some(""), None, false).is_conforming());
        assert!(!DoctypeInfo::new(Some("svg"), None, None, false).is_conforming());
    }
}
