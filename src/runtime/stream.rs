//! Standard-input line source with end-of-stream flag

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use signal_hook::consts::SIGINT;
use signal_hook::flag;
use tracing::{debug, warn};

use crate::error::Result;

/// Set by SIGINT once `interrupt_flag` has been called
///
/// A second SIGINT while the flag is already set terminates the process.
static INTERRUPTED: Lazy<Arc<AtomicBool>> = Lazy::new(|| {
    let raised = Arc::new(AtomicBool::new(false));
    let registered = flag::register_conditional_shutdown(SIGINT, 130, Arc::clone(&raised))
        .and_then(|_| flag::register(SIGINT, Arc::clone(&raised)));
    if let Err(e) = registered {
        warn!(error = %e, "cannot install interrupt handler");
    }
    raised
});

/// Process-wide interrupt flag, installing the SIGINT handler on first use
pub fn interrupt_flag() -> Arc<AtomicBool> {
    INTERRUPTED.clone()
}

/// Line reader over standard input (or any `BufRead`)
///
/// End of data and a raised interrupt flag both set the end-of-stream flag.
pub struct LineSource<'a> {
    reader: Box<dyn BufRead + 'a>,
    eof: bool,
    interrupt: Option<Arc<AtomicBool>>,
}

fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

impl<'a> LineSource<'a> {
    pub fn new(reader: impl BufRead + 'a) -> Self {
        Self {
            reader: Box::new(reader),
            eof: false,
            interrupt: None,
        }
    }

    /// Treat a raised `flag` as end of stream
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Next line without its line terminator, `None` at end of stream
    pub fn read_line(&mut self) -> Result<Option<String>> {
        if self.eof {
            return Ok(None);
        }
        if self.interrupted() {
            debug!("interrupted before read");
            self.eof = true;
            return Ok(None);
        }
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        // an interrupt during a blocking read discards the line
        if n == 0 || self.interrupted() {
            self.eof = true;
            return Ok(None);
        }
        Ok(Some(strip_newline(line)))
    }

    /// Every remaining line
    pub fn read_all(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            lines.push(line);
        }
        Ok(lines)
    }
}

/// Split a line into trimmed cells
///
/// A blank separator splits on runs of whitespace; a blank line is one
/// empty cell.
pub fn cells<'l>(line: &'l str, sep: &'l str) -> Vec<&'l str> {
    if sep.trim().is_empty() {
        if line.trim().is_empty() {
            return vec![""];
        }
        return line.split_whitespace().collect();
    }
    line.split(sep).map(str::trim).collect()
}
