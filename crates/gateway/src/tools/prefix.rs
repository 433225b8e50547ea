//! Prefix Router
//!
//! Presents the catalogue under a namespace so several backends can be
//! exposed side by side. Tools are named `{prefix}{tool_name}` and their
//! descriptions tagged `[{label}] description`, where the label is the prefix
//! without its trailing separator.

use super::registry::ToolDescriptor;

/// Separator appended to a route segment to form a tool prefix
pub const PREFIX_SEPARATOR: char = '_';

/// Namespace applied to tool names and descriptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPrefix {
    prefix: String,
}

impl ToolPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Prefix used for the HTTP route segment `{route}`: `{route}_`
    pub fn for_route(route: &str) -> Self {
        Self::new(format!("{}{}", route, PREFIX_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Prefix without its trailing separator, used in descriptions
    pub fn label(&self) -> &str {
        self.prefix.trim_end_matches(PREFIX_SEPARATOR)
    }

    pub fn add_prefix(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}{}", self.prefix, name)
        }
    }

    /// Strip the prefix when present; names without it pass through unchanged
    pub fn remove_prefix<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.prefix.as_str()).unwrap_or(name)
    }

    pub fn has_prefix(&self, name: &str) -> bool {
        name.starts_with(self.prefix.as_str())
    }

    pub fn add_description_prefix(&self, description: &str) -> String {
        if self.prefix.is_empty() {
            description.to_string()
        } else {
            format!("[{}] {}", self.label(), description)
        }
    }

    /// Rewrite names and descriptions of a catalogue view
    pub fn prefix_tools(&self, tools: Vec<ToolDescriptor>) -> Vec<ToolDescriptor> {
        tools
            .into_iter()
            .map(|mut tool| {
                tool.name = self.add_prefix(&tool.name);
                tool.description = self.add_description_prefix(&tool.description);
                tool
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::{tool_descriptors, ToolKind};
    use proptest::prelude::*;

    #[test]
    fn test_add_prefix() {
        let prefix = ToolPrefix::new("novel_");
        assert_eq!(prefix.add_prefix("query_text"), "novel_query_text");
        assert_eq!(ToolPrefix::default().add_prefix("query_text"), "query_text");
    }

    #[test]
    fn test_remove_prefix_only_when_present() {
        let prefix = ToolPrefix::new("novel_");
        assert_eq!(prefix.remove_prefix("novel_query_text"), "query_text");
        assert_eq!(prefix.remove_prefix("query_text"), "query_text");
        assert_eq!(prefix.remove_prefix("novelquery_text"), "novelquery_text");
    }

    #[test]
    fn test_description_prefix_trims_separator() {
        let prefix = ToolPrefix::new("novel_");
        assert_eq!(prefix.add_description_prefix("Query LightRAG"), "[novel] Query LightRAG");
        assert_eq!(ToolPrefix::new("docs").add_description_prefix("x"), "[docs] x");
        assert_eq!(ToolPrefix::default().add_description_prefix("x"), "x");
    }

    #[test]
    fn test_for_route() {
        let prefix = ToolPrefix::for_route("research");
        assert_eq!(prefix.as_str(), "research_");
        assert_eq!(prefix.label(), "research");
        assert!(prefix.has_prefix("research_get_health"));
        assert!(!prefix.has_prefix("get_health"));
    }

    #[test]
    fn test_prefix_tools_leaves_canonical_catalogue_untouched() {
        let prefix = ToolPrefix::new("novel_");
        let view = prefix.prefix_tools(tool_descriptors());

        assert_eq!(view[0].name, "novel_insert_text");
        assert!(view[0].description.starts_with("[novel] "));
        assert_eq!(tool_descriptors()[0].name, "insert_text");
    }

    proptest! {
        #[test]
        fn prop_prefix_round_trip(prefix in ".{0,16}", index in 0usize..ToolKind::ALL.len()) {
            let name = ToolKind::ALL[index].as_str();
            let router = ToolPrefix::new(prefix);
            let prefixed = router.add_prefix(name);
            prop_assert_eq!(router.remove_prefix(&prefixed), name);
        }

        #[test]
        fn prop_prefix_preserves_order(prefix in "[a-z]{0,8}_?") {
            let router = ToolPrefix::new(prefix);
            let names: Vec<String> = router
                .prefix_tools(tool_descriptors())
                .into_iter()
                .map(|t| router.remove_prefix(&t.name).to_string())
                .collect();
            let canonical: Vec<String> = ToolKind::ALL.iter().map(|k| k.as_str().to_string()).collect();
            prop_assert_eq!(names, canonical);
        }
    }
}
