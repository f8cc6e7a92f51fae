use std::fmt::Write as _;

use maud::{Markup, PreEscaped, html};

use crate::config::{DisplayAlign, RenderConfig};

pub const STYLE_ID: &str = "math-styles";

const BASE_CSS: &str = include_str!("math.css");

/// x-height of KaTeX_Main, in em.
const MATH_X_HEIGHT: f64 = 0.431;

/// (family, file stem, weight, style)
const FONT_FACES: &[(&str, &str, &str, &str)] = &[
    ("KaTeX_AMS", "KaTeX_AMS-Regular", "normal", "normal"),
    ("KaTeX_Caligraphic", "KaTeX_Caligraphic-Bold", "bold", "normal"),
    ("KaTeX_Caligraphic", "KaTeX_Caligraphic-Regular", "normal", "normal"),
    ("KaTeX_Fraktur", "KaTeX_Fraktur-Bold", "bold", "normal"),
    ("KaTeX_Fraktur", "KaTeX_Fraktur-Regular", "normal", "normal"),
    ("KaTeX_Main", "KaTeX_Main-Bold", "bold", "normal"),
    ("KaTeX_Main", "KaTeX_Main-BoldItalic", "bold", "italic"),
    ("KaTeX_Main", "KaTeX_Main-Italic", "normal", "italic"),
    ("KaTeX_Main", "KaTeX_Main-Regular", "normal", "normal"),
    ("KaTeX_Math", "KaTeX_Math-BoldItalic", "bold", "italic"),
    ("KaTeX_Math", "KaTeX_Math-Italic", "normal", "italic"),
    ("KaTeX_SansSerif", "KaTeX_SansSerif-Bold", "bold", "normal"),
    ("KaTeX_SansSerif", "KaTeX_SansSerif-Italic", "normal", "italic"),
    ("KaTeX_SansSerif", "KaTeX_SansSerif-Regular", "normal", "normal"),
    ("KaTeX_Script", "KaTeX_Script-Regular", "normal", "normal"),
    ("KaTeX_Size1", "KaTeX_Size1-Regular", "normal", "normal"),
    ("KaTeX_Size2", "KaTeX_Size2-Regular", "normal", "normal"),
    ("KaTeX_Size3", "KaTeX_Size3-Regular", "normal", "normal"),
    ("KaTeX_Size4", "KaTeX_Size4-Regular", "normal", "normal"),
    ("KaTeX_Typewriter", "KaTeX_Typewriter-Regular", "normal", "normal"),
];

/// Full stylesheet text for the math block: font faces served from
/// `config.font_url`, layout rules, then the config-dependent sizing.
pub fn math_css(config: &RenderConfig) -> String {
    let mut css = String::with_capacity(BASE_CSS.len() + 4096);
    let base = config.font_base();
    for (family, stem, weight, style) in FONT_FACES {
        let _ = writeln!(
            css,
            "@font-face {{\n  font-family: {family};\n  src: url(\"{base}/{stem}.woff2\") format(\"woff2\");\n  font-weight: {weight};\n  font-style: {style};\n  font-display: block;\n}}"
        );
    }
    css.push_str(BASE_CSS);

    // Scale math so its x-height matches the surrounding text.
    let scale = config.ex_factor() / MATH_X_HEIGHT;
    let _ = writeln!(css, ".katex {{\n  font-size: {scale:.3}em;\n}}");
    let _ = writeln!(css, ".katex-display {{\n  margin: {}px 0;\n}}", config.em);
    if matches!(config.display_align, DisplayAlign::Left) {
        let _ = writeln!(
            css,
            ".katex-display.fleqn > .katex {{\n  padding-left: 0;\n}}"
        );
    }
    css
}

pub fn style_block(config: &RenderConfig) -> Markup {
    html! {
        style id=(STYLE_ID) { (PreEscaped(math_css(config))) }
    }
}
