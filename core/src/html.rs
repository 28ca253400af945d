// core/src/html.rs
//
// Parser-agnostic HTML text translation.
//
// The core does not depend on an HTML parser. A front end implements
// `HtmlTree` for its document type and hands it to `translate_tree`, which
// visits text nodes in document order, skipping the subtrees of excluded
// elements.

use crate::utils::{capitalize_first, is_han};

/// Trait that parsed documents must implement to be translated in place.
pub trait HtmlTree {
    /// Cheap handle to a node of the tree.
    type Node: Clone;

    /// Document root.
    fn root(&self) -> Self::Node;

    /// Children of a node, in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Local tag name if the node is an element.
    fn element_name(&self, node: &Self::Node) -> Option<String>;

    /// Content if the node is a text node.
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: &Self::Node, text: String);

    /// Serialize the (possibly mutated) document.
    fn serialize(&self) -> String;
}

/// Translate every text node holding Han characters.
///
/// `is_skipped` decides, by tag name, which element subtrees are left
/// alone. Each translated text is trimmed and its first letter capitalized.
/// Returns the number of text nodes replaced.
pub fn translate_tree<T, S, F>(tree: &mut T, is_skipped: S, mut translate: F) -> usize
where
    T: HtmlTree,
    S: Fn(&str) -> bool,
    F: FnMut(&str) -> String,
{
    let mut replaced = 0;
    let mut stack = vec![tree.root()];

    while let Some(node) = stack.pop() {
        if let Some(name) = tree.element_name(&node) {
            if is_skipped(&name) {
                continue;
            }
        } else if let Some(text) = tree.text(&node) {
            if !text.trim().is_empty() && text.chars().any(is_han) {
                let translated = capitalize_first(translate(&text).trim());
                tree.set_text(&node, translated);
                replaced += 1;
            }
            continue;
        }

        let mut children = tree.children(&node);
        children.reverse();
        stack.extend(children);
    }

    replaced
}
