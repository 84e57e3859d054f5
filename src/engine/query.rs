//! Selector matching over the node registry.
//!
//! Supports the simple selectors portal targets and focus props use:
//! `tag`, `#id`, `.class`, `[attr]` and `[attr="value"]`.

use crate::error::{Error, Result};
use crate::types::NodeId;

use super::registry::{body, descendants, get_attribute, has_attribute, tag_name};

/// A parsed simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn invalid(selector: &str, reason: &'static str) -> Error {
    Error::InvalidSelector {
        selector: selector.to_string(),
        reason,
    }
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid(input, "empty selector"));
        }

        if let Some(id) = trimmed.strip_prefix('#') {
            return if is_ident(id) {
                Ok(Self::Id(id.to_string()))
            } else {
                Err(invalid(input, "malformed id selector"))
            };
        }

        if let Some(class) = trimmed.strip_prefix('.') {
            return if is_ident(class) {
                Ok(Self::Class(class.to_string()))
            } else {
                Err(invalid(input, "malformed class selector"))
            };
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| invalid(input, "unterminated attribute selector"))?;
            let (name, value) = match inner.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim();
                    let unquoted = value
                        .strip_prefix('"')
                        .and_then(|v| v.strip_suffix('"'))
                        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                        .unwrap_or(value);
                    (name.trim(), Some(unquoted.to_string()))
                }
                None => (inner.trim(), None),
            };
            if !is_ident(name) {
                return Err(invalid(input, "malformed attribute name"));
            }
            return Ok(Self::Attribute {
                name: name.to_string(),
                value,
            });
        }

        if is_ident(trimmed) {
            Ok(Self::Tag(trimmed.to_ascii_lowercase()))
        } else {
            Err(invalid(input, "unsupported selector syntax"))
        }
    }

    pub fn matches(&self, node: NodeId) -> bool {
        match self {
            Self::Tag(tag) => tag_name(node).as_deref() == Some(tag.as_str()),
            Self::Id(id) => get_attribute(node, "id").as_deref() == Some(id.as_str()),
            Self::Class(class) => get_attribute(node, "class")
                .map(|c| c.split_whitespace().any(|part| part == class))
                .unwrap_or(false),
            Self::Attribute { name, value: None } => has_attribute(node, name),
            Self::Attribute {
                name,
                value: Some(value),
            } => get_attribute(node, name).as_deref() == Some(value.as_str()),
        }
    }
}

/// First connected node matching `selector`, in document order.
pub fn query_selector(selector: &str) -> Result<Option<NodeId>> {
    let parsed = Selector::parse(selector)?;
    let root = body();
    if parsed.matches(root) {
        return Ok(Some(root));
    }
    Ok(descendants(root).into_iter().find(|&node| parsed.matches(node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{append_child, create_element, reset_document, set_attribute};

    #[test]
    fn test_parse_forms() {
        assert_eq!(Selector::parse("body"), Ok(Selector::Tag("body".into())));
        assert_eq!(Selector::parse("#main"), Ok(Selector::Id("main".into())));
        assert_eq!(Selector::parse(".card"), Ok(Selector::Class("card".into())));
        assert_eq!(
            Selector::parse("[data-portal]"),
            Ok(Selector::Attribute { name: "data-portal".into(), value: None })
        );
        assert_eq!(
            Selector::parse("[role=\"dialog\"]"),
            Ok(Selector::Attribute { name: "role".into(), value: Some("dialog".into()) })
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("[open").is_err());
        assert!(Selector::parse("div > span").is_err());
    }

    #[test]
    fn test_query_document_order() {
        reset_document();

        let first = create_element("section");
        let second = create_element("section");
        append_child(body(), first).unwrap();
        append_child(body(), second).unwrap();
        set_attribute(second, "class", "target wide");

        assert_eq!(query_selector("body"), Ok(Some(body())));
        assert_eq!(query_selector("section"), Ok(Some(first)));
        assert_eq!(query_selector(".wide"), Ok(Some(second)));
        assert_eq!(query_selector("#missing"), Ok(None));
    }
}
