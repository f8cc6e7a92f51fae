use std::sync::LazyLock;

use anyhow::Context as _;
use katex::OutputType;
use regex::Regex;

use crate::config::{DisplayAlign, EquationTags, RenderConfig};

/// Turns one TeX expression into an HTML fragment.
///
/// The document pipeline only depends on this trait, so the typesetting
/// engine can be replaced without touching the CLI.
pub trait MathEngine {
    fn render(&self, tex: &str, display: bool) -> anyhow::Result<String>;
}

/// KaTeX running in an embedded JS engine.
pub struct KatexEngine {
    inline: katex::Opts,
    display: katex::Opts,
}

impl KatexEngine {
    pub fn new(config: &RenderConfig) -> anyhow::Result<Self> {
        Ok(Self {
            inline: build_opts(config, false).context("build inline katex options")?,
            display: build_opts(config, true).context("build display katex options")?,
        })
    }
}

impl MathEngine for KatexEngine {
    fn render(&self, tex: &str, display: bool) -> anyhow::Result<String> {
        let opts = if display { &self.display } else { &self.inline };
        katex::render_with_opts(tex, opts).with_context(|| format!("render math `{}`", tex))
    }
}

fn build_opts(config: &RenderConfig, display: bool) -> anyhow::Result<katex::Opts> {
    let output_type = if config.assistive_mml {
        OutputType::HtmlAndMathml
    } else {
        OutputType::Html
    };
    let opts = katex::Opts::builder()
        .display_mode(display)
        .output_type(output_type)
        .fleqn(matches!(config.display_align, DisplayAlign::Left))
        .leqno(matches!(config.tags, EquationTags::AmsLeft))
        .throw_on_error(true)
        .build()?;
    Ok(opts)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(String),
    Math { tex: &'a str, display: bool },
}

static OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\\$|\$\$|\\\[|\\begin\{(?P<env>[A-Za-z]+\*?)\}|\$").expect("math opener regex")
});

/// Splits a text run into literal text and math spans.
///
/// Recognized: `$...$` inline, `$$...$$` and `\[...\]` display,
/// `\begin{env}...\end{env}` as display (delimiters kept), and `\$` as a
/// literal dollar. An opener with no closer stays literal.
pub fn split_math(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut pending = String::new();
    let mut pos = 0usize;

    while let Some(caps) = OPENER.captures_at(text, pos) {
        let m = caps.get(0).expect("match");
        pending.push_str(&text[pos..m.start()]);

        let (closer, display, keep_delims) = match m.as_str() {
            "\\$" => {
                pending.push('$');
                pos = m.end();
                continue;
            }
            "$$" => ("$$".to_string(), true, false),
            "\\[" => ("\\]".to_string(), true, false),
            "$" => ("$".to_string(), false, false),
            _ => (format!("\\end{{{}}}", &caps["env"]), true, true),
        };

        let Some(close_at) = find_closer(text, m.end(), &closer) else {
            pending.push_str(m.as_str());
            pos = m.end();
            continue;
        };
        let end = close_at + closer.len();
        let tex = if keep_delims {
            &text[m.start()..end]
        } else {
            &text[m.end()..close_at]
        };
        if tex.trim().is_empty() {
            pending.push_str(&text[m.start()..end]);
            pos = end;
            continue;
        }

        if !pending.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut pending)));
        }
        segments.push(Segment::Math { tex, display });
        pos = end;
    }

    pending.push_str(&text[pos..]);
    if !pending.is_empty() {
        segments.push(Segment::Text(pending));
    }
    segments
}

/// Position of `closer` at brace depth zero, skipping backslash escapes.
fn find_closer(text: &str, from: usize, closer: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = text[from..].char_indices();
    while let Some((offset, c)) = chars.next() {
        let i = from + offset;
        if depth == 0 && text[i..].starts_with(closer) {
            return Some(i);
        }
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}
