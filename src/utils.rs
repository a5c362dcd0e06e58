use clap::builder::{
    styling::{AnsiColor, Effects},
    Styles,
};

pub const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Render `argv` as a single shell-safe command line.
pub fn shell_join<I, S>(argv: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    argv.into_iter()
        .map(|arg| shell_escape::escape(arg.as_ref().to_string().into()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
