/// What to do with names that cannot be represented in an XML infoset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlViolationPolicy {
    /// Build the tree anyway. HTML DOMs accept any name.
    #[default]
    Allow,
    /// Abort the parse with [`TreeBuilderError::Fatal`](crate::error::TreeBuilderError::Fatal).
    Fatal,
}

/// Tree builder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeBuilderConfig {
    /// Whether scripting is enabled. Affects `<noscript>` only.
    pub scripting_enabled: bool,
    /// `srcdoc` documents never enter quirks mode.
    pub is_srcdoc: bool,
    /// Request a suspension when `<meta>` declares a character encoding.
    pub honor_encoding_declarations: bool,
    pub xml_violation_policy: XmlViolationPolicy,
    /// Open-element depth after which new nodes are attached to a surrogate
    /// parent instead of nesting further.
    pub max_tree_depth: usize,
    /// When false, parse errors and warnings are not constructed at all.
    pub report_errors: bool,
}

impl Default for TreeBuilderConfig {
    fn default() -> Self {
        Self {
            scripting_enabled: false,
            is_srcdoc: false,
            honor_encoding_declarations: false,
            xml_violation_policy: XmlViolationPolicy::Allow,
            max_tree_depth: 512,
            report_errors: true,
        }
    }
}

impl TreeBuilderConfig {
    pub fn with_scripting(mut self, enabled: bool) -> Self {
        self.scripting_enabled = enabled;
        self
    }

    pub fn with_srcdoc(mut self, is_srcdoc: bool) -> Self {
        self.is_srcdoc = is_srcdoc;
        self
    }

    pub fn with_encoding_declarations(mut self, honor: bool) -> Self {
        self.honor_encoding_declarations = honor;
        self
    }

    pub fn with_xml_violation_policy(mut self, policy: XmlViolationPolicy) -> Self {
        self.xml_violation_policy = policy;
        self
    }

    pub fn with_max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = depth.max(1);
        self
    }

    pub fn with_error_reporting(mut self, report: bool) -> Self {
        self.report_errors = report;
        self
    }
}
