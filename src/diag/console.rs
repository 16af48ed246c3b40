//! Prompt/read console seam. The menu engine, the input validator and the
//! hex codec all talk to a `Console` instead of touching stdin/stdout, so
//! interactive flows can be scripted from tests with an `io::Cursor` and a
//! `Vec<u8>` sink.

use std::fmt;
use std::io::{BufRead, Write};

pub struct Console<'a> {
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    pub fn new(input: &'a mut dyn BufRead, output: &'a mut dyn Write) -> Self {
        Self { input, output }
    }

    /// Writes formatted text. Console output is best-effort: a broken pipe
    /// on stdout must not abort a diagnostic session, so failures are logged
    /// and swallowed.
    pub fn out(&mut self, args: fmt::Arguments<'_>) {
        if let Err(err) = self.output.write_fmt(args) {
            log::warn!("console write failed: {err}");
        }
    }

    pub fn flush(&mut self) {
        if let Err(err) = self.output.flush() {
            log::warn!("console flush failed: {err}");
        }
    }

    /// Reads one line, stripping the trailing newline. `None` means the
    /// input stream is exhausted (callers treat it as a cancel/exit so a
    /// closed stdin unwinds the session instead of spinning).
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                log::warn!("console read failed: {err}");
                None
            }
        }
    }

    /// Reads a single byte without line buffering, for the nibble-wise hex
    /// reader. `None` on end of input.
    pub fn read_byte(&mut self) -> Option<u8> {
        let byte = match self.input.fill_buf() {
            Ok([]) => return None,
            Ok(buf) => buf[0],
            Err(err) => {
                log::warn!("console read failed: {err}");
                return None;
            }
        };
        self.input.consume(1);
        Some(byte)
    }

    /// "Press ENTER to continue" gate after bulk output.
    pub fn pause(&mut self) {
        self.out(format_args!("Press ENTER to continue\n"));
        self.flush();
        let _ = self.read_line();
    }
}

/// Prints to a [`Console`] with `format!` syntax.
#[macro_export]
macro_rules! cprint {
    ($con:expr, $($arg:tt)*) => {
        $con.out(::std::format_args!($($arg)*))
    };
}

/// Prints to a [`Console`] with `format!` syntax, appending a newline.
#[macro_export]
macro_rules! cprintln {
    ($con:expr) => {
        $con.out(::std::format_args!("\n"))
    };
    ($con:expr, $($arg:tt)*) => {{
        $con.out(::std::format_args!($($arg)*));
        $con.out(::std::format_args!("\n"));
    }};
}
