mod builtin;
mod cli;
mod config;
mod document;
mod math;
mod styles;
mod theme;

use anyhow::Context as _;

pub use builtin::{TOGGLE_ID, theme_toggle, theme_toggle_control, theme_toggle_script};
pub use cli::Args as CliArgs;
pub use config::{DisplayAlign, EquationTags, RenderConfig};
pub use document::{RenderedDocument, render_document};
pub use math::{KatexEngine, MathEngine};
pub use styles::STYLE_ID;
pub use theme::{
    DocumentRoot, JsonFileStore, LEGACY_DARK_FLAG_KEY, MemoryDocument, MemoryStore,
    PreferenceStore, StorageFormat, THEME_ATTRIBUTE, THEME_KEY, ThemePreference, ThemeService,
};

/// Renders `args.input` with KaTeX and the fixed site configuration.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = RenderConfig::default();
    let engine = KatexEngine::new(&config)?;
    run_with_engine(&args, &config, &engine).await
}

/// Read, typeset, write. Nothing is written unless reading and rendering
/// both succeed.
pub async fn run_with_engine<E: MathEngine + ?Sized>(
    args: &CliArgs,
    config: &RenderConfig,
    engine: &E,
) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("read {}", args.input.display()))?;

    let rendered = render_document(&source, config, engine)
        .with_context(|| format!("render {}", args.input.display()))?;
    tracing::info!(
        input = %args.input.display(),
        math = rendered.math_count,
        bytes = rendered.html.len(),
        "rendered document"
    );

    tokio::fs::write(&args.output, rendered.html)
        .await
        .with_context(|| format!("write {}", args.output.display()))?;
    Ok(())
}
