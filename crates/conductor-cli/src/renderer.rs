//! Terminal rendering of markdown output
//!
//! Plans and step outcomes are formatted as markdown by the core crate; this
//! module prints them with termimad styling, or as plain text when colors are
//! disabled.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// How a single markdown line is printed.
#[derive(Debug, PartialEq, Eq)]
enum LineKind {
    Header,
    Fence,
    Code,
    Text,
}

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Cyan);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));
        skin.quote_mark.set_fg(Color::DarkGrey);

        Self { rich_enabled, skin }
    }

    /// Render a markdown document.
    ///
    /// Header lines keep their `#` marks and fenced blocks (command output,
    /// file contents) are printed verbatim.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        let mut in_fence = false;
        for line in markdown.lines() {
            match classify(line, &mut in_fence) {
                LineKind::Header => println!("\x1b[36m{line}\x1b[0m"),
                LineKind::Fence => println!("\x1b[90m{line}\x1b[0m"),
                LineKind::Code => println!("{line}"),
                LineKind::Text => {
                    self.skin.print_inline(line);
                    println!();
                }
            }
        }
        Ok(())
    }

    /// Render a single progress line.
    pub fn line(&self, text: &str) {
        if self.rich_enabled {
            self.skin.print_inline(text);
            println!();
        } else {
            println!("{text}");
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

fn classify(line: &str, in_fence: &mut bool) -> LineKind {
    if line.starts_with("```") {
        *in_fence = !*in_fence;
        LineKind::Fence
    } else if *in_fence {
        LineKind::Code
    } else if line.starts_with('#') {
        LineKind::Header
    } else {
        LineKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer() {
        let renderer = TerminalRenderer::new(false);
        assert!(!renderer.rich_enabled);
    }

    #[test]
    fn test_default_is_rich() {
        let renderer = TerminalRenderer::default();
        assert!(renderer.rich_enabled);
    }

    #[test]
    fn test_fenced_lines_are_not_styled() {
        let mut in_fence = false;
        let kinds: Vec<LineKind> = ["### 1. RUN_COMMAND", "```", "# not a header", "```", "done"]
            .into_iter()
            .map(|line| classify(line, &mut in_fence))
            .collect();

        assert_eq!(
            kinds,
            vec![
                LineKind::Header,
                LineKind::Fence,
                LineKind::Code,
                LineKind::Fence,
                LineKind::Text,
            ]
        );
        assert!(!in_fence);
    }
}
