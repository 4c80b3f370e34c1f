//! Discovery of the root wrapper tag from the head of a stream.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LidoError, Result};

/// Prolog constructs that may precede the root element.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PROLOG_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<\?.*?\?>|<!--.*?-->|<!DOCTYPE[^>]*>").expect("valid regex")
});

/// Opening tag with optional namespace prefix and attributes.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(<(?:([A-Za-z_][\w.\-]*):)?([A-Za-z_][\w.\-]*)((?:\s[^>]*)?/?)>)")
        .expect("valid regex")
});

/// The root element that wraps all units of an aggregate document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootTag {
    /// Namespace prefix, if the root is prefixed.
    pub prefix: Option<String>,
    /// Local name, e.g. `lidoWrap`.
    pub local_name: String,
    /// The opening tag exactly as it appears, with all namespace
    /// declarations and attributes.
    pub open_tag: String,
    /// The root is written as `<root/>` and holds no units.
    pub self_closing: bool,
}

impl RootTag {
    /// Find the root tag in the leading bytes of a document.
    ///
    /// XML declarations, processing instructions, comments and a doctype in
    /// front of the root are skipped.
    ///
    /// # Errors
    /// `Structural` if no opening tag is found in `head`.
    ///
    /// # Examples
    /// ```
    /// use lido_indexer::segment::RootTag;
    ///
    /// let head = br#"<?xml version="1.0"?><lido:lidoWrap xmlns:lido="http://www.lido-schema.org"><lido:lido>"#;
    /// let root = RootTag::discover(head).unwrap();
    /// assert_eq!(root.prefix.as_deref(), Some("lido"));
    /// assert_eq!(root.local_name, "lidoWrap");
    /// assert_eq!(root.close_tag(), "</lido:lidoWrap>");
    /// ```
    pub fn discover(head: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(head);
        let text = text.trim_start_matches('\u{feff}');
        let cleaned = PROLOG_NOISE.replace_all(text, "");

        let caps = OPEN_TAG.captures(&cleaned).ok_or_else(|| {
            LidoError::Structural(format!(
                "no root element found in the first {} bytes",
                head.len()
            ))
        })?;

        let open_tag = caps.get(1).map_or("", |m| m.as_str()).to_string();
        let local_name = caps.get(3).map_or("", |m| m.as_str()).to_string();
        let self_closing = caps.get(4).is_some_and(|m| m.as_str().ends_with('/'));

        Ok(Self {
            prefix: caps.get(2).map(|m| m.as_str().to_string()),
            local_name,
            open_tag,
            self_closing,
        })
    }

    /// Name including the prefix, as it appears in the tags.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Closing tag matching [`RootTag::open_tag`].
    #[must_use]
    pub fn close_tag(&self) -> String {
        format!("</{}>", self.qualified_name())
    }

    /// Wrap a unit body in the root element.
    #[must_use]
    pub fn wrap(&self, body: &str) -> String {
        format!("{}{body}{}", self.open_tag, self.close_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discover_unprefixed_root_with_comment() {
        let head = b"\xef\xbb\xbf<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- export 2019 -->\n<lidoWrap xmlns=\"http://www.lido-schema.org\">\n<lido>";
        let root = RootTag::discover(head).unwrap();
        assert_eq!(root.prefix, None);
        assert_eq!(root.local_name, "lidoWrap");
        assert_eq!(root.open_tag, r#"<lidoWrap xmlns="http://www.lido-schema.org">"#);
        assert_eq!(root.close_tag(), "</lidoWrap>");
        assert!(!root.self_closing);
    }

    #[test]
    fn test_discover_keeps_all_attributes() {
        let head = br#"<lido:lidoWrap xmlns:lido="http://www.lido-schema.org" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.lido-schema.org http://www.lido-schema.org/schema/v1.0/lido-v1.0.xsd">"#;
        let root = RootTag::discover(head).unwrap();
        assert!(root.open_tag.contains("xmlns:xsi"));
        assert!(root.open_tag.contains("schemaLocation"));
    }

    #[test]
    fn test_discover_self_closing() {
        assert!(RootTag::discover(b"<wrap />").unwrap().self_closing);
        assert!(RootTag::discover(b"<wrap/>").unwrap().self_closing);
        assert!(!RootTag::discover(br#"<wrap href="a/b">"#).unwrap().self_closing);
    }

    #[test]
    fn test_discover_fails_without_tag() {
        let err = RootTag::discover(b"just some text").unwrap_err();
        assert!(matches!(err, LidoError::Structural(_)));
        assert!(RootTag::discover(b"").is_err());
    }

    #[test]
    fn test_discover_fails_on_truncated_tag() {
        let err = RootTag::discover(br#"<lidoWrap xmlns="http://www.lido"#).unwrap_err();
        assert!(err.to_string().contains("no root element"));
    }

    #[test]
    fn test_wrap() {
        let root = RootTag::discover(b"<w:wrap xmlns:w=\"urn:x\">").unwrap();
        assert_eq!(root.wrap("<w:a/>"), "<w:wrap xmlns:w=\"urn:x\"><w:a/></w:wrap>");
    }
}
