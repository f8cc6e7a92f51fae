/// Where display math is placed inside its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayAlign {
    Left,
    Center,
}

/// Equation numbering style. Both honor `\tag{}`; they differ in the side
/// the number is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationTags {
    Ams,
    AmsLeft,
}

/// Fixed typesetting configuration for one render job.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Base font size of the surrounding text, in px.
    pub em: u32,
    /// Height of an `x` in the surrounding text, in px.
    pub ex: u32,
    /// URL prefix the math font files are served from.
    pub font_url: String,
    pub display_align: DisplayAlign,
    pub tags: EquationTags,
    /// Attach hidden MathML next to the visual HTML for screen readers.
    pub assistive_mml: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            em: 16,
            ex: 8,
            font_url: "/fonts/mathjax".to_string(),
            display_align: DisplayAlign::Left,
            tags: EquationTags::Ams,
            assistive_mml: true,
        }
    }
}

impl RenderConfig {
    pub fn ex_factor(&self) -> f64 {
        self.ex as f64 / self.em.max(1) as f64
    }

    /// Font URL without a trailing slash.
    pub fn font_base(&self) -> &str {
        self.font_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_setup() {
        let cfg = RenderConfig::default();
        assert_eq!(cfg.em, 16);
        assert_eq!(cfg.ex_factor(), 0.5);
        assert_eq!(cfg.display_align, DisplayAlign::Left);
        assert_eq!(cfg.tags, EquationTags::Ams);
        assert_eq!(cfg.font_base(), "/fonts/mathjax");
    }

    #[test]
    fn font_base_trims_slash() {
        let cfg = RenderConfig {
            font_url: "/fonts/katex/".to_string(),
            ..RenderConfig::default()
        };
        assert_eq!(cfg.font_base(), "/fonts/katex");
    }
}
