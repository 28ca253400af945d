//! html5ever-backed documents for `Engine::translate_document`.

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::parse_document;
use libvietphrase_core::{Engine, HtmlTree};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use tracing::{debug, warn};

/// A parsed HTML document.
pub struct RcDomTree {
    dom: RcDom,
}

impl RcDomTree {
    /// Parse a full document. Fragments are wrapped in `html`/`head`/`body`
    /// the way a browser would.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        Self { dom }
    }

    pub fn document(&self) -> &Handle {
        &self.dom.document
    }
}

impl HtmlTree for RcDomTree {
    type Node = Handle;

    fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    fn children(&self, node: &Handle) -> Vec<Handle> {
        node.children.borrow().clone()
    }

    fn element_name(&self, node: &Handle) -> Option<String> {
        match &node.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref().to_string()),
            _ => None,
        }
    }

    fn text(&self, node: &Handle) -> Option<String> {
        match &node.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }

    fn set_text(&mut self, node: &Handle, text: String) {
        if let NodeData::Text { contents } = &node.data {
            *contents.borrow_mut() = StrTendril::from(text);
        }
    }

    fn serialize(&self) -> String {
        let mut buf: Vec<u8> = Vec::new();
        if let Err(err) = serialize(
            &mut buf,
            &SerializableHandle::from(self.dom.document.clone()),
            SerializeOpts::default(),
        ) {
            warn!(%err, "document serialization stopped early");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Parse `html`, translate its text nodes and serialize it back.
pub fn translate_html(engine: &Engine, html: &str) -> String {
    let mut tree = RcDomTree::parse(html);
    let replaced = engine.translate_document(&mut tree);
    debug!(replaced, "text nodes translated");
    tree.serialize()
}
