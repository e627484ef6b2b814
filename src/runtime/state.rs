//! Per-invocation mutable state and injected I/O

use std::io::{self, BufRead, Write};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::binding::{InputMapping, OutputMapping};
use crate::store::{Confirm, OverwritePolicy, TerminalConfirm};

use super::stream::{interrupt_flag, LineSource};
use super::timing::Timings;

/// Timestamp in the classic `ctime` layout, e.g. `Fri Oct 16 09:12:01 2026`
pub fn ctime_now() -> String {
    chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

/// State owned by the execution loop for one run
#[derive(Debug)]
pub struct RunState {
    pub inmap: InputMapping,
    pub outmap: OutputMapping,
    /// Starts as configured; an `all` answer at the prompt switches it to `Always`
    pub overwrite: OverwritePolicy,
    pub timings: Timings,
    pub started: Instant,
    pub date_start: String,
}

impl RunState {
    pub fn new(inmap: InputMapping, outmap: OutputMapping, overwrite: OverwritePolicy) -> Self {
        let time0 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64());
        Self {
            inmap,
            outmap,
            overwrite,
            timings: Timings::new(time0),
            started: Instant::now(),
            date_start: ctime_now(),
        }
    }

    /// Seconds since the run started
    pub fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Standard streams and the overwrite prompt, injectable for tests
pub struct Io<'a> {
    pub stdin: LineSource<'a>,
    pub stdout: Box<dyn Write + 'a>,
    pub confirm: Box<dyn Confirm + 'a>,
}

impl<'a> Io<'a> {
    pub fn new(stdin: impl BufRead + 'a, stdout: impl Write + 'a) -> Self {
        Self {
            stdin: LineSource::new(stdin),
            stdout: Box::new(stdout),
            confirm: Box::new(TerminalConfirm),
        }
    }

    pub fn with_confirm(mut self, confirm: impl Confirm + 'a) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    /// Process standard input/output and terminal prompts
    ///
    /// SIGINT while reading standard input ends the stream.
    pub fn terminal() -> Io<'static> {
        Io {
            stdin: LineSource::new(io::BufReader::new(io::stdin()))
                .with_interrupt(interrupt_flag()),
            stdout: Box::new(io::stdout()),
            confirm: Box::new(TerminalConfirm),
        }
    }

    pub(crate) fn print_line(&mut self, line: &str) -> crate::error::Result<()> {
        writeln!(self.stdout, "{}", line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctime_layout() {
        let s = ctime_now();
        assert_eq!(s.split_whitespace().count(), 5);
    }

    #[test]
    fn io_writes_lines() {
        let mut out = Vec::new();
        {
            let mut io = Io::new(io::empty(), &mut out);
            io.print_line("a").unwrap();
        }
        assert_eq!(out, b"a\n");
    }
}
