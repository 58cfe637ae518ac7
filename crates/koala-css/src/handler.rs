//! The seam between this crate and a concrete DOM.
//!
//! Selector matching ([`crate::selector`]) and cascade selection
//! ([`crate::cascade`]) both need to walk element ancestry, read attributes,
//! and answer structural questions ("is this the first element child?").
//! Rather than link against a specific DOM crate, this engine asks for
//! those answers through [`NodeHandler`], implemented once per embedder.
//! [`crate::selector::ComplexSelector::matches`] takes a `&dyn NodeHandler`
//! and a node reference and never otherwise touches a tree.

/// A read-only view of one DOM node's shape, as the selector matcher and
/// cascade need it.
///
/// `Node` is the embedder's node handle (an index, a pointer, whatever);
/// it's required to be `Copy + Eq` so the matcher can freely pass it around
/// and compare ancestry without borrowing the tree.
pub trait NodeHandler {
    /// The embedder's node handle type.
    type Node: Copy + Eq + std::hash::Hash;

    /// The lowercase tag name, or `None` for a non-element node (text,
    /// comment, document).
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    /// The `id` attribute, if present and non-empty.
    fn id(&self, node: Self::Node) -> Option<&str>;

    /// The value of `attr`, case-sensitively, or `None` if absent.
    fn attribute(&self, node: Self::Node, attr: &str) -> Option<&str>;

    /// The whitespace-separated tokens of the `class` attribute.
    fn classes(&self, node: Self::Node) -> Vec<&str>;

    /// This node's parent, or `None` at the document root.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Every child of `node`, document order, including non-element nodes
    /// (text, comments) — callers filter with [`NodeHandler::is_element`]
    /// as needed.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Whether `node` is an element (as opposed to text, a comment, or the
    /// document node).
    fn is_element(&self, node: Self::Node) -> bool;

    /// Whether `node` is the document's root element (`:root`).
    fn is_root(&self, node: Self::Node) -> bool;

    /// Whether `node` has no child content: no child nodes at all, or only
    /// comments and all-whitespace text nodes.
    ///
    /// [§ 4.5 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    fn has_no_content(&self, node: Self::Node) -> bool;

    /// Whether `node` represents a form control explicitly disabled.
    fn is_disabled(&self, node: Self::Node) -> bool;

    /// Whether `node` is a link the user has visited. Defaults to
    /// `false`: an embedder without history simply never matches
    /// `:visited`.
    fn is_visited(&self, node: Self::Node) -> bool {
        let _ = node;
        false
    }

    /// Whether the pointer is currently over `node`. Defaults to `false`
    /// for embedders without interactivity.
    fn is_hovered(&self, node: Self::Node) -> bool {
        let _ = node;
        false
    }

    /// Whether `node` is being activated (mouse-down, Enter). Defaults
    /// to `false`.
    fn is_active(&self, node: Self::Node) -> bool {
        let _ = node;
        false
    }

    /// Whether `node` has input focus. Defaults to `false`.
    fn is_focused(&self, node: Self::Node) -> bool {
        let _ = node;
        false
    }

    /// Every preceding sibling of `node`, nearest first (document order
    /// reversed), for sibling combinators and `:first-child`/`:last-child`.
    fn preceding_siblings(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Every following sibling of `node`, nearest first.
    fn following_siblings(&self, node: Self::Node) -> Vec<Self::Node>;

    /// The nearest element ancestor that is also the element's previous
    /// element sibling, skipping text/comment nodes. Used by the
    /// next-sibling (`+`) combinator.
    fn previous_element_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        self.preceding_siblings(node)
            .into_iter()
            .find(|&n| self.is_element(n))
    }
}
