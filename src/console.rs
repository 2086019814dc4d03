//! Console interaction: prompts, highlighting and the progress bar.

use std::io::{self, BufRead, IsTerminal, Write};

const ANSI_HIGHLIGHT: &str = "\u{1b}[33m";
const ANSI_RESET: &str = "\u{1b}[0m";

/// Width of the progress bar in characters.
pub const BAR_WIDTH: usize = 50;

/// An interactive console the token flow can talk to.
pub trait Console {
    fn print_line(&mut self, line: &str) -> io::Result<()>;

    /// Read one line of input without the trailing newline.
    fn read_line(&mut self) -> io::Result<String>;
}

/// The process terminal.
pub struct Terminal;

impl Terminal {
    /// Attach to the terminal; `None` when stdin or stdout is not a TTY.
    pub fn attach() -> Option<Self> {
        (io::stdin().is_terminal() && io::stdout().is_terminal()).then_some(Terminal)
    }
}

impl Console for Terminal {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Wrap `text` in the highlight color.
pub fn highlight(text: &str) -> String {
    format!("{}{}{}", ANSI_HIGHLIGHT, text, ANSI_RESET)
}

/// Render one progress frame, e.g. `[#####     ] 50.00%`.
pub fn render_bar(fraction: f64) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * BAR_WIDTH as f64) as usize;
    format!(
        "[{:<width$}] {:.2}%",
        "#".repeat(filled),
        fraction * 100.0,
        width = BAR_WIDTH
    )
}

/// Progress bar redrawn in place on stdout.
#[derive(Debug, Default)]
pub struct ProgressBar {
    drawn: bool,
}

impl ProgressBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, fraction: f64) {
        let mut stdout = io::stdout().lock();
        // Progress output is best effort.
        let _ = write!(stdout, "\r{}", render_bar(fraction));
        let _ = stdout.flush();
        self.drawn = true;
    }

    /// End the progress line.
    pub fn finish(&mut self) {
        if self.drawn {
            println!();
            self.drawn = false;
        }
    }
}
