use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// HTML (or plain text) file containing `$...$`, `$$...$$` or `\[...\]` math.
    pub input: PathBuf,

    /// Where to write the rendered HTML document. An existing file is overwritten.
    pub output: PathBuf,
}
