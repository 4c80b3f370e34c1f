//! XML utility functions for navigating and extracting data from LIDO trees.
//!
//! All lookups match on local names, so `lido:title` and `title` are the same
//! element regardless of the prefix a source chose.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lido_indexer::xml::get_tag_name;
///
/// let xml = r#"<lido:lido xmlns:lido="http://www.lido-schema.org"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "lido");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lido_indexer::xml::find_child;
///
/// let xml = r#"<lido><lidoRecID>1</lidoRecID><category/></lido>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
///
/// assert!(find_child(root, "lidoRecID").is_some());
/// assert!(find_child(root, "missing").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find all child elements with the given tag name.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find the first descendant element matching a path of tag names.
///
/// Only the first child is followed at each step.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lido_indexer::xml::find_by_path;
///
/// let xml = r#"<lido><administrativeMetadata><recordWrap><recordID>7</recordID></recordWrap></administrativeMetadata></lido>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let id = find_by_path(doc.root_element(), "administrativeMetadata/recordWrap/recordID");
/// assert_eq!(id.unwrap().text(), Some("7"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    let mut current = node;

    for part in path.split('/') {
        current = find_child(current, part)?;
    }

    Some(current)
}

/// Find every element reachable through a path of tag names.
///
/// Unlike [`find_by_path`], all siblings with a matching name are followed at
/// every step, in document order.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lido_indexer::xml::find_all_by_path;
///
/// let xml = r#"<w><set><v>a</v><v>b</v></set><set><v>c</v></set></w>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert_eq!(find_all_by_path(doc.root_element(), "set/v").len(), 3);
/// ```
pub fn find_all_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];

    for part in path.split('/') {
        current = current
            .into_iter()
            .flat_map(|n| {
                n.children()
                    .filter(move |child| child.is_element() && get_tag_name(*child) == part)
            })
            .collect();
        if current.is_empty() {
            break;
        }
    }

    current
}

/// Collect the non-empty trimmed texts of every element on a path.
pub fn texts_by_path(node: Node<'_, '_>, path: &str) -> Vec<String> {
    find_all_by_path(node, path)
        .into_iter()
        .map(get_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Trimmed text of the first element on a path, or an empty string.
pub fn text_by_path(node: Node<'_, '_>, path: &str) -> String {
    find_by_path(node, path).map(get_text).unwrap_or_default()
}

/// Get the text content of a node, trimmed.
///
/// Text of nested elements is concatenated, so mixed content such as
/// `<displayDate>ca. <span>1900</span></displayDate>` is kept whole.
pub fn get_text(node: Node<'_, '_>) -> String {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    text.trim().to_string()
}

/// Find the first descendant element (or the node itself) with a tag name.
pub fn find_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && get_tag_name(*n) == tag)
}
