use anyhow::Context as _;
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink as _;

use crate::config::RenderConfig;
use crate::math::{self, MathEngine, Segment};
use crate::styles;

/// Elements whose text is never searched for math.
const SKIP_TAGS: &[&str] = &[
    "script",
    "noscript",
    "style",
    "textarea",
    "pre",
    "code",
    "annotation",
    "annotation-xml",
];

const DEFAULT_DOCTYPE: &str = "<!DOCTYPE html>";

pub struct RenderedDocument {
    /// Doctype line, newline, then the root element.
    pub html: String,
    pub math_count: usize,
}

/// Typesets every math span in the `<body>` of `source` and serializes the
/// result. The math style block is only added to `<head>` when at least one
/// math node was rendered.
pub fn render_document<E: MathEngine + ?Sized>(
    source: &str,
    config: &RenderConfig,
    engine: &E,
) -> anyhow::Result<RenderedDocument> {
    let document = kuchiki::parse_html().one(source);

    let mut math_count = 0usize;
    if let Ok(body) = document.select_first("body") {
        // Collect first: replacing nodes while walking breaks sibling links.
        let text_nodes: Vec<NodeRef> = body
            .as_node()
            .descendants()
            .filter(|n| n.as_text().is_some() && !in_skipped_element(n))
            .collect();

        for node in text_nodes {
            math_count += typeset_text_node(&node, engine)?;
        }
    }

    if math_count > 0 {
        insert_style_block(&document, config)?;
    }
    tracing::debug!(math = math_count, "typeset document");

    Ok(RenderedDocument {
        html: serialize_document(&document)?,
        math_count,
    })
}

fn in_skipped_element(node: &NodeRef) -> bool {
    node.ancestors().any(|a| {
        a.as_element().is_some_and(|e| {
            let name: &str = &e.name.local;
            SKIP_TAGS.contains(&name)
        })
    })
}

/// Replaces one text node with its text and math pieces. Returns the number
/// of math nodes inserted.
fn typeset_text_node<E: MathEngine + ?Sized>(node: &NodeRef, engine: &E) -> anyhow::Result<usize> {
    let text = match node.as_text() {
        Some(t) => t.borrow().clone(),
        None => return Ok(0),
    };
    let segments = math::split_math(&text);
    let unchanged = matches!(segments.as_slice(), [Segment::Text(t)] if *t == text);
    if segments.is_empty() || unchanged {
        return Ok(0);
    }

    let mut count = 0usize;
    for segment in segments {
        match segment {
            Segment::Text(t) => node.insert_before(NodeRef::new_text(t)),
            Segment::Math { tex, display } => {
                let fragment = engine.render(tex, display)?;
                for child in parse_fragment(&fragment)? {
                    node.insert_before(child);
                }
                count += 1;
            }
        }
    }
    node.detach();
    Ok(count)
}

fn parse_fragment(fragment: &str) -> anyhow::Result<Vec<NodeRef>> {
    let doc = kuchiki::parse_html().one(fragment);
    let body = doc
        .select_first("body")
        .ok()
        .context("math fragment did not parse into a body")?;
    Ok(body.as_node().children().collect())
}

fn insert_style_block(document: &NodeRef, config: &RenderConfig) -> anyhow::Result<()> {
    let head = document
        .select_first("head")
        .ok()
        .context("document has no <head> for the math styles")?;

    let parsed = kuchiki::parse_html().one(styles::style_block(config).into_string());
    let style = parsed
        .select_first("style")
        .ok()
        .context("math style block did not parse")?;
    head.as_node().append(style.as_node().clone());
    Ok(())
}

fn doctype_line(document: &NodeRef) -> String {
    let Some(node) = document.children().find(|n| n.as_doctype().is_some()) else {
        return DEFAULT_DOCTYPE.to_string();
    };
    let Some(doctype) = node.as_doctype() else {
        return DEFAULT_DOCTYPE.to_string();
    };

    let name = if doctype.name.is_empty() {
        "html"
    } else {
        doctype.name.as_str()
    };
    match (doctype.public_id.is_empty(), doctype.system_id.is_empty()) {
        (true, true) => format!("<!DOCTYPE {}>", name),
        (true, false) => format!("<!DOCTYPE {} SYSTEM \"{}\">", name, doctype.system_id),
        (false, true) => format!("<!DOCTYPE {} PUBLIC \"{}\">", name, doctype.public_id),
        (false, false) => format!(
            "<!DOCTYPE {} PUBLIC \"{}\" \"{}\">",
            name, doctype.public_id, doctype.system_id
        ),
    }
}

fn serialize_document(document: &NodeRef) -> anyhow::Result<String> {
    let root = document
        .children()
        .find(|n| n.as_element().is_some())
        .context("document has no root element")?;

    let mut out = doctype_line(document).into_bytes();
    out.push(b'\n');
    root.serialize(&mut out).context("serialize document")?;
    String::from_utf8(out).context("document html not utf-8")
}
