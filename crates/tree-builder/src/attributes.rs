use crate::{atom::Atom, namespace::Namespace};

/// Namespace of an attribute after foreign-content adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeNamespace {
    #[default]
    None,
    XLink,
    Xml,
    Xmlns,
}

impl AttributeNamespace {
    pub fn url(&self) -> Option<&'static str> {
        match self {
            AttributeNamespace::None => None,
            AttributeNamespace::XLink => Some("http://www.w3.org/1999/xlink"),
            AttributeNamespace::Xml => Some("http://www.w3.org/XML/1998/namespace"),
            AttributeNamespace::Xmlns => Some("http://www.w3.org/2000/xmlns/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: AttributeNamespace,
    pub prefix: Option<&'static str>,
    pub local_name: Atom,
    pub value: String,
}

impl Attribute {
    pub fn new(local_name: impl Into<Atom>, value: impl Into<String>) -> Self {
        Self {
            namespace: AttributeNamespace::None,
            prefix: None,
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    fn same_name(&self, other: &Attribute) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

/// The attributes of a start tag, in source order.
///
/// The tokenizer is expected to have dropped duplicate names already.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    list: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.list.push(attribute);
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.list.iter()
    }

    /// Value of the un-namespaced attribute `local_name`.
    pub fn get(&self, local_name: &str) -> Option<&str> {
        self.list
            .iter()
            .find(|attr| attr.namespace == AttributeNamespace::None && attr.local_name == local_name)
            .map(|attr| attr.value.as_str())
    }

    pub fn contains(&self, local_name: &str) -> bool {
        self.get(local_name).is_some()
    }

    /// Whether `local_name` is present with a value that is an ASCII
    /// case-insensitive match for `value`.
    pub fn has_value_ignore_ascii_case(&self, local_name: &str, value: &str) -> bool {
        self.get(local_name)
            .map(|actual| actual.eq_ignore_ascii_case(value))
            .unwrap_or(false)
    }

    /// Order-insensitive comparison of names and values.
    pub fn same_set(&self, other: &Attributes) -> bool {
        self.len() == other.len()
            && self.list.iter().all(|attr| {
                other
                    .list
                    .iter()
                    .any(|candidate| candidate.same_name(attr) && candidate.value == attr.value)
            })
    }

    /// Attributes of `other` whose names are not present here.
    pub fn missing_from<'a>(&'a self, other: &'a Attributes) -> impl Iterator<Item = &'a Attribute> {
        other
            .list
            .iter()
            .filter(move |attr| !self.list.iter().any(|existing| existing.same_name(attr)))
    }

    /// Applies the attribute adjustments for an element created in `ns`:
    /// SVG camel-casing, the MathML `definitionURL` fix-up, and namespaced
    /// xlink/xml/xmlns attributes for both foreign namespaces.
    ///
    /// @see https://html.spec.whatwg.org/#adjust-svg-attributes
    /// @see https://html.spec.whatwg.org/#adjust-mathml-attributes
    /// @see https://html.spec.whatwg.org/#adjust-foreign-attributes
    pub fn adjust_for_namespace(&mut self, ns: Namespace) {
        if ns == Namespace::Html {
            return;
        }

        for attr in self.list.iter_mut() {
            if attr.namespace != AttributeNamespace::None {
                continue;
            }

            if let Some((namespace, prefix, local_name)) = foreign_attribute(&attr.local_name) {
                attr.namespace = namespace;
                attr.prefix = prefix;
                attr.local_name = Atom::from_static(local_name);
                continue;
            }

            let adjusted = match ns {
                Namespace::MathML if attr.local_name == "definitionurl" => Some("definitionURL"),
                Namespace::Svg => svg_attribute(&attr.local_name),
                _ => None,
            };
            if let Some(adjusted) = adjusted {
                attr.local_name = Atom::from_static(adjusted);
            }
        }
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        Self {
            list: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(name, value)| Attribute::new(name, value))
            .collect()
    }
}

fn foreign_attribute(
    name: &str,
) -> Option<(AttributeNamespace, Option<&'static str>, &'static str)> {
    use AttributeNamespace::{XLink, Xml, Xmlns};

    Some(match name {
        "xlink:actuate" => (XLink, Some("xlink"), "actuate"),
        "xlink:arcrole" => (XLink, Some("xlink"), "arcrole"),
        "xlink:href" => (XLink, Some("xlink"), "href"),
        "xlink:role" => (XLink, Some("xlink"), "role"),
        "xlink:show" => (XLink, Some("xlink"), "show"),
        "xlink:title" => (XLink, Some("xlink"), "title"),
        "xlink:type" => (XLink, Some("xlink"), "type"),
        "xml:lang" => (Xml, Some("xml"), "lang"),
        "xml:space" => (Xml, Some("xml"), "space"),
        "xmlns" => (Xmlns, None, "xmlns"),
        "xmlns:xlink" => (Xmlns, Some("xmlns"), "xlink"),
        _ => return None,
    })
}

fn svg_attribute(name: &str) -> Option<&'static str> {
    Some(match name {
        "attributename" => "attributeName",
        "attributetype" => "attributeType",
        "basefrequency" => "baseFrequency",
        "baseprofile" => "baseProfile",
        "calcmode" => "calcMode",
        "clippathunits" => "clipPathUnits",
        "diffuseconstant" => "diffuseConstant",
        "edgemode" => "edgeMode",
        "filterunits" => "filterUnits",
        "glyphref" => "glyphRef",
        "gradienttransform" => "gradientTransform",
        "gradientunits" => "gradientUnits",
        "kernelmatrix" => "kernelMatrix",
        "kernelunitlength" => "kernelUnitLength",
        "keypoints" => "keyPoints",
        "keysplines" => "keySplines",
        "keytimes" => "keyTimes",
        "lengthadjust" => "lengthAdjust",
        "limitingconeangle" => "limitingConeAngle",
        "markerheight" => "markerHeight",
        "markerunits" => "markerUnits",
        "markerwidth" => "markerWidth",
        "maskcontentunits" => "maskContentUnits",
        "maskunits" => "maskUnits",
        "numoctaves" => "numOctaves",
        "pathlength" => "pathLength",
        "patterncontentunits" => "patternContentUnits",
        "patterntransform" => "patternTransform",
        "patternunits" => "patternUnits",
        "pointsatx" => "pointsAtX",
        "pointsaty" => "pointsAtY",
        "pointsatz" => "pointsAtZ",
        "preservealpha" => "preserveAlpha",
        "preserveaspectratio" => "preserveAspectRatio",
        "primitiveunits" => "primitiveUnits",
        "refx" => "refX",
        "refy" => "refY",
        "repeatcount" => "repeatCount",
        "repeatdur" => "repeatDur",
        "requiredextensions" => "requiredExtensions",
        "requiredfeatures" => "requiredFeatures",
        "specularconstant" => "specularConstant",
        "specularexponent" => "specularExponent",
        "spreadmethod" => "spreadMethod",
        "startoffset" => "startOffset",
        "stddeviation" => "stdDeviation",
        "stitchtiles" => "stitchTiles",
        "surfacescale" => "surfaceScale",
        "systemlanguage" => "systemLanguage",
        "tablevalues" => "tableValues",
        "targetx" => "targetX",
        "targety" => "targetY",
        "textlength" => "textLength",
        "viewbox" => "viewBox",
        "viewtarget" => "viewTarget",
        "xchannelselector" => "xChannelSelector",
        "ychannelselector" => "yChannelSelector",
        "zoomandpan" => "zoomAndPan",
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn svg_adjustment() {
        let mut attrs: Attributes = [("viewbox", "0 0 1 1"), ("xlink:href", "#a"), ("class", "x")]
            .into_iter()
            .collect();
        attrs.adjust_for_namespace(Namespace::Svg);

        let adjusted: Vec<_> = attrs
            .iter()
            .map(|a| (a.namespace, a.prefix, a.local_name.as_str()))
            .collect();
        assert_eq!(
            vec![
                (AttributeNamespace::None, None, "viewBox"),
                (AttributeNamespace::XLink, Some("xlink"), "href"),
                (AttributeNamespace::None, None, "class"),
            ],
            adjusted
        );
    }

    #[test]
    fn mathml_adjustment_leaves_svg_names_alone() {
        let mut attrs: Attributes = [("definitionurl", "u"), ("viewbox", "v"), ("xmlns", "w")]
            .into_iter()
            .collect();
        attrs.adjust_for_namespace(Namespace::MathML);
        let names: Vec<_> = attrs.iter().map(|a| a.local_name.as_str()).collect();
        assert_eq!(vec!["definitionURL", "viewbox", "xmlns"], names);
        assert_eq!(
            AttributeNamespace::Xmlns,
            attrs.iter().nth(2).map(|a| a.namespace).unwrap()
        );
    }

    #[test]
    fn foreign_attribute_prefixes() {
        let mut attrs: Attributes = [("xmlns", "a"), ("xmlns:xlink", "b"), ("xlink:bogus", "c")]
            .into_iter()
            .collect();
        attrs.adjust_for_namespace(Namespace::Svg);

        let adjusted: Vec<_> = attrs
            .iter()
            .map(|a| (a.namespace, a.prefix, a.local_name.as_str()))
            .collect();
        assert_eq!(
            vec![
                (AttributeNamespace::Xmlns, None, "xmlns"),
                (AttributeNamespace::Xmlns, Some("xmlns"), "xlink"),
                (AttributeNamespace::None, None, "xlink:bogus"),
            ],
            adjusted
        );
    }

    #[test]
    fn html_is_not_adjusted() {
        let mut attrs: Attributes = [("viewbox", "v")].into_iter().collect();
        let before = attrs.clone();
        attrs.adjust_for_namespace(Namespace::Html);
        assert_eq!(before, attrs);
    }

    #[test]
    fn set_comparison_ignores_order() {
        let a: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        let b: Attributes = [("b", "2"), ("a", "1")].into_iter().collect();
        let c: Attributes = [("b", "2"), ("a", "x")].into_iter().collect();
        assert!(a.same_set(&b));
        assert!(!a.same_set(&c));
        assert!(!a.same_set(&Attributes::new()));
    }

    #[test]
    fn missing_attributes() {
        let present: Attributes = [("id", "x")].into_iter().collect();
        let incoming: Attributes = [("id", "y"), ("class", "z")].into_iter().collect();
        let missing: Vec<_> = present
            .missing_from(&incoming)
            .map(|a| a.local_name.as_str())
            .collect();
        assert_eq!(vec!["class"], missing);
    }
}
