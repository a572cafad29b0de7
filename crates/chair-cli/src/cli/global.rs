use clap::ValueEnum;

/// How session and role views are printed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed, one field per line.
    Json,
    /// Single-line JSON for piping into other tools.
    Raw,
}

/// Flags every `chair` subcommand sees.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    /// Drop human-facing hints from otherwise machine-readable output.
    pub quiet: bool,
    /// Directory holding (or containing) the project's `.chair` folder.
    pub project: Option<String>,
}

impl GlobalFlags {
    /// A follow-up instruction for the user, unless `--quiet` was given.
    #[must_use]
    pub const fn hint(&self, text: &'static str) -> Option<&'static str> {
        if self.quiet { None } else { Some(text) }
    }
}
