//! Element name classification.
//!
//! Every tag the tree builder sees is classified once into an [`ElementName`]
//! which carries everything the insertion modes dispatch on: the
//! [`DispatchGroup`], the category flags and, for SVG, the camel-case name.
//!
//! The vocabulary lives in `data/element_names.json` and is expanded at
//! compile time. Lookups hash the name and walk a binary search tree laid
//! out in level order, then confirm by comparing the stored name. Names
//! outside the vocabulary get a fresh "unknown" entry.

mod generated {
    use super::{Atom, DispatchGroup, ElementFlags, ElementName};

    gen_element_names::element_names!("data/element_names.json");
}

use crate::atom::{Atom, NameInterner};
use generated::{ELEMENT_HASHES, ELEMENT_NAMES};
use std::{fmt, ops::BitOr};

pub use generated::TagName;

/// Category flags for an element name.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ElementFlags(u16);

impl ElementFlags {
    /// > The following elements have varying levels of special parsing rules.
    ///
    /// @see https://html.spec.whatwg.org/#special
    pub const SPECIAL: Self = Self(1 << 0);
    /// Terminates "has an element in scope" searches.
    pub const SCOPING: Self = Self(1 << 1);
    /// Becomes SCOPING, SPECIAL and an HTML integration point in the SVG namespace.
    pub const SCOPING_AS_SVG: Self = Self(1 << 2);
    /// Becomes SCOPING and SPECIAL in the MathML namespace.
    pub const SCOPING_AS_MATHML: Self = Self(1 << 3);
    /// Content inserted while this is the current node may be foster parented.
    pub const FOSTER_PARENTING: Self = Self(1 << 4);
    pub const HTML_INTEGRATION_POINT: Self = Self(1 << 5);
    /// May be left open at the end of the body without a parse error.
    pub const OPTIONAL_END_TAG: Self = Self(1 << 6);
    /// The name is not part of the static vocabulary.
    pub const NOT_INTERNED: Self = Self(1 << 7);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ElementFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ElementFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ElementFlags, &str); 8] = [
            (ElementFlags::SPECIAL, "SPECIAL"),
            (ElementFlags::SCOPING, "SCOPING"),
            (ElementFlags::SCOPING_AS_SVG, "SCOPING_AS_SVG"),
            (ElementFlags::SCOPING_AS_MATHML, "SCOPING_AS_MATHML"),
            (ElementFlags::FOSTER_PARENTING, "FOSTER_PARENTING"),
            (ElementFlags::HTML_INTEGRATION_POINT, "HTML_INTEGRATION_POINT"),
            (ElementFlags::OPTIONAL_END_TAG, "OPTIONAL_END_TAG"),
            (ElementFlags::NOT_INTERNED, "NOT_INTERNED"),
        ];
        let mut set = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                set.entry(&name);
            }
        }
        set.finish()
    }
}

/// Routing category used by the insertion modes.
///
/// Names that are always handled identically share a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchGroup {
    A,
    /// address, article, aside, details, dialog, dir, figcaption, figure,
    /// footer, header, hgroup, main, nav, search, section, summary
    Address,
    AnnotationXml,
    AreaOrWbr,
    /// b, big, code, em, i, s, small, strike, strong, tt, u
    B,
    Base,
    Body,
    Br,
    Button,
    Caption,
    Col,
    Colgroup,
    DdOrDt,
    DivOrBlockquoteOrCenterOrMenu,
    Embed,
    Fieldset,
    Font,
    ForeignObjectOrDesc,
    Form,
    Frame,
    Frameset,
    H1ToH6,
    Head,
    Hr,
    Html,
    Iframe,
    Image,
    Img,
    Input,
    Li,
    LinkOrBasefontOrBgsound,
    MarqueeOrApplet,
    Math,
    Meta,
    MglyphOrMalignmark,
    MiMoMnMsMtext,
    Nobr,
    Noembed,
    Noframes,
    Noscript,
    Object,
    Optgroup,
    Option,
    P,
    ParamOrSourceOrTrack,
    Plaintext,
    PreOrListing,
    RbOrRtc,
    RtOrRp,
    RubyOrSpanOrSubOrSupOrVar,
    Script,
    Select,
    Style,
    Svg,
    Table,
    TbodyOrTheadOrTfoot,
    TdOrTh,
    Template,
    Textarea,
    Title,
    Tr,
    UlOrOlOrDl,
    Xmp,
    Other,
}

/// Dispatch metadata for one element name.
#[derive(Debug, Clone)]
pub struct ElementName {
    name: Atom,
    camel_case_name: Atom,
    tag_name: TagName,
    group: DispatchGroup,
    flags: ElementFlags,
}

impl ElementName {
    /// An element name outside the vocabulary.
    pub fn custom(name: Atom) -> Self {
        Self {
            camel_case_name: name.clone(),
            name,
            tag_name: TagName::UNKNOWN,
            group: DispatchGroup::Other,
            flags: ElementFlags::NOT_INTERNED,
        }
    }

    /// The static entry for a vocabulary name.
    pub fn for_tag(tag_name: TagName) -> Self {
        classify(tag_name.as_str())
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &Atom {
        &self.name
    }

    /// Local name used when the element is created in the SVG namespace.
    pub fn camel_case_name(&self) -> &Atom {
        &self.camel_case_name
    }

    pub fn tag_name(&self) -> TagName {
        self.tag_name
    }

    pub fn group(&self) -> DispatchGroup {
        self.group
    }

    pub fn flags(&self) -> ElementFlags {
        self.flags
    }

    pub fn is_interned(&self) -> bool {
        !self.flags.contains(ElementFlags::NOT_INTERNED)
    }

    pub fn is(&self, tag_name: TagName) -> bool {
        self.tag_name == tag_name && tag_name != TagName::UNKNOWN
    }

    /// Moves a dynamic name into `interner`.
    pub fn reintern(&self, interner: &mut dyn NameInterner) -> Self {
        if self.is_interned() {
            return self.clone();
        }
        Self::custom(self.name.reintern(interner))
    }
}

impl PartialEq for ElementName {
    fn eq(&self, other: &Self) -> bool {
        if self.tag_name != other.tag_name {
            return false;
        }
        self.tag_name != TagName::UNKNOWN || self.name == other.name
    }
}

impl Eq for ElementName {}

/// Hash used by the dispatch table.
///
/// Mixes the length with the first character and the final four characters.
/// The `gen-element-names` crate carries a mirror of this function and
/// refuses to emit a table with collisions. The empty name hashes to 0,
/// which no vocabulary name does.
pub fn name_hash(buf: &[u8]) -> u32 {
    let Some(&first) = buf.first() else {
        return 0;
    };
    let len = buf.len() as u32;
    let first = (first as u32) << 19;
    let mut second: u32 = 1 << 23;
    let mut third: u32 = 0;
    let mut fourth: u32 = 0;
    let mut fifth: u32 = 0;

    match buf.len() {
        n if n >= 4 => {
            second = (buf[n - 4] as u32) << 4;
            third = (buf[n - 3] as u32) << 9;
            fourth = (buf[n - 2] as u32) << 14;
            fifth = (buf[n - 1] as u32) << 24;
        }
        3 => {
            second = (buf[1] as u32) << 4;
            third = (buf[2] as u32) << 9;
        }
        2 => {
            second = (buf[1] as u32) << 24;
        }
        _ => {}
    }

    len.wrapping_add(first)
        .wrapping_add(second)
        .wrapping_add(third)
        .wrapping_add(fourth)
        .wrapping_add(fifth)
}

fn lookup(name: &[u8]) -> Option<&'static ElementName> {
    if name.is_empty() {
        return None;
    }

    let hash = name_hash(name);
    let mut i = 0;
    while i < ELEMENT_HASHES.len() {
        let candidate = ELEMENT_HASHES[i];
        if candidate == hash {
            let entry = &ELEMENT_NAMES[i];
            return if entry.name.as_bytes() == name {
                Some(entry)
            } else {
                None
            };
        }
        i = if hash < candidate { 2 * i + 1 } else { 2 * i + 2 };
    }
    None
}

/// Classifies a (lowercase) tag name.
///
/// Unknown names allocate a fresh shared name owned by the caller.
pub fn classify(name: &str) -> ElementName {
    match lookup(name.as_bytes()) {
        Some(entry) => entry.clone(),
        None => ElementName::custom(Atom::from(name)),
    }
}

/// Like [`classify`], but unknown names are canonicalized by `interner`.
pub fn classify_interned(name: &str, interner: &mut dyn NameInterner) -> ElementName {
    match lookup(name.as_bytes()) {
        Some(entry) => entry.clone(),
        None => ElementName::custom(interner.intern(name)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::atom::AtomTable;
    use quickcheck_macros::quickcheck;

    #[test]
    fn every_vocabulary_name_is_found() {
        for entry in ELEMENT_NAMES.iter() {
            let found = classify(&entry.name);
            assert_eq!(entry.tag_name, found.tag_name, "{}", entry.name);
            assert!(found.is_interned());
            assert!(found.name.is_static());
        }
    }

    #[test]
    fn vocabulary_tree_is_ordered() {
        fn in_order(i: usize, out: &mut Vec<u32>) {
            if i >= ELEMENT_HASHES.len() {
                return;
            }
            in_order(2 * i + 1, out);
            out.push(ELEMENT_HASHES[i]);
            in_order(2 * i + 2, out);
        }
        let mut hashes = Vec::new();
        in_order(0, &mut hashes);
        assert!(hashes.windows(2).all(|pair| pair[0] < pair[1]));

        for (entry, hash) in ELEMENT_NAMES.iter().zip(ELEMENT_HASHES.iter()) {
            assert_eq!(name_hash(entry.name.as_bytes()), *hash);
        }
    }

    #[test]
    fn empty_name_hashes_to_zero() {
        assert_eq!(0, name_hash(b""));
        assert!(ELEMENT_HASHES.iter().all(|&hash| hash != 0));
        assert_eq!(TagName::UNKNOWN, classify("").tag_name);
    }

    #[test]
    fn dispatch_metadata() {
        let table = classify("table");
        assert_eq!(DispatchGroup::Table, table.group());
        assert!(table.flags().contains(
            ElementFlags::SPECIAL | ElementFlags::SCOPING | ElementFlags::FOSTER_PARENTING
        ));

        let foreign_object = classify("foreignobject");
        assert_eq!("foreignObject", foreign_object.camel_case_name().as_str());
        assert!(foreign_object
            .flags()
            .contains(ElementFlags::SCOPING_AS_SVG));

        assert_eq!(DispatchGroup::B, classify("strike").group());
        assert_eq!(DispatchGroup::UlOrOlOrDl, classify("dl").group());
        assert!(classify("li").flags().contains(ElementFlags::OPTIONAL_END_TAG));
        assert!(!classify("dialog").flags().contains(ElementFlags::SPECIAL));
    }

    #[test]
    fn near_misses_are_unknown() {
        for name in ["", "tabl", "tables", "Table", "svgs", "x", "h7", "annotation-xm"] {
            let element = classify(name);
            assert_eq!(TagName::UNKNOWN, element.tag_name(), "{name:?}");
            assert_eq!(DispatchGroup::Other, element.group());
            assert!(!element.is_interned());
        }
    }

    #[test]
    fn unknown_names_compare_by_name() {
        assert_eq!(classify("x-foo"), classify("x-foo"));
        assert_ne!(classify("x-foo"), classify("x-bar"));
        assert_ne!(classify("x-foo"), classify("div"));
        assert!(!classify("x-foo").is(TagName::UNKNOWN));
    }

    #[test]
    fn interned_classification() {
        let mut table = AtomTable::new();
        let a = classify_interned("my-widget", &mut table);
        let b = classify_interned("my-widget", &mut table);
        assert_eq!(a, b);
        assert_eq!(1, table.len());
        classify_interned("div", &mut table);
        assert_eq!(1, table.len());
    }

    #[quickcheck]
    fn classify_is_pure(name: String) -> bool {
        let first = classify(&name);
        let second = classify(&name);
        first == second && first.flags() == second.flags() && first.group() == second.group()
    }

    #[quickcheck]
    fn names_outside_the_vocabulary_are_other(name: String) -> bool {
        let known = ELEMENT_NAMES.iter().any(|entry| entry.name == name.as_str());
        let element = classify(&name);
        if known {
            element.is_interned()
        } else {
            element.group() == DispatchGroup::Other
                && element.flags() == ElementFlags::NOT_INTERNED
                && element.name() == &name.as_str()
        }
    }
}
