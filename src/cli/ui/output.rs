use console::style;

/// Styled status lines
///
/// Everything goes to stderr so a rendered document on stdout can be piped.
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Suppress everything except errors
    pub fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn header(&self, message: &str) {
        if !self.quiet {
            eprintln!("\n{}", style(message).bold().underlined());
        }
    }

    /// Step result as "label: done/total", warning when anything was dropped
    pub fn tally(&self, label: &str, done: usize, total: usize) {
        let line = format!("{}: {}/{}", label, done, total);
        if done == total {
            self.success(&line);
        } else {
            self.warning(&format!("{} (failed items were skipped)", line));
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
