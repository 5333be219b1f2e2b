//! # eot-frame
//!
//! Message framing for processes that talk JSON over their standard streams.
//!
//! Each message is written as its body followed by a terminator, by default
//! the ASCII end-of-transmission byte (`0x04`). The peer reads until it sees
//! the terminator, so messages may span several lines or arrive in several
//! chunks.
//!
//! ## Quick Start
//!
//! ```rust
//! use eot_frame::{FrameReader, FrameWriter};
//! use std::io::Cursor;
//!
//! let input = Cursor::new(b"{\"operation\":\"ping\"}\x04{\"operation\":\"cleanup\"}\x04".to_vec());
//! let mut reader = FrameReader::new(input);
//! assert_eq!(reader.read_frame().unwrap().unwrap(), br#"{"operation":"ping"}"#);
//!
//! let mut writer = FrameWriter::new(Vec::new(), Vec::new());
//! writer.send(b"pong").unwrap();
//! let (out, err) = writer.into_inner();
//! assert_eq!(out, b"pong\x04");
//! assert!(err.is_empty());
//! ```

#[macro_use]
extern crate log;

use std::io::{ErrorKind, Read, Result, Write};

/// ASCII end-of-transmission.
pub const EOT: u8 = 0x04;

macro_rules! dbg {
    ($($arg:tt)*) => {{
        debug!("frame {}", &std::fmt::format(format_args!($($arg)*)));
    }};
}

/// Reads terminator-delimited frames from a byte stream.
pub struct FrameReader<R> {
    rx: R,
    terminator: Vec<u8>,
    eof: bool,
}

impl<R: Read> FrameReader<R> {
    /// Creates a reader splitting on [`EOT`].
    pub fn new(rx: R) -> Self {
        Self::with_terminator(rx, [EOT])
    }

    /// Creates a reader splitting on an arbitrary, non-empty terminator.
    ///
    /// An empty terminator falls back to [`EOT`].
    pub fn with_terminator(rx: R, terminator: impl AsRef<[u8]>) -> Self {
        let terminator = terminator.as_ref();
        let terminator = if terminator.is_empty() {
            vec![EOT]
        } else {
            terminator.to_vec()
        };
        Self {
            rx,
            terminator,
            eof: false,
        }
    }

    /// The terminator this reader splits on.
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buff = [0u8; 1];
        loop {
            match self.rx.read(&mut buff) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buff[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads the next frame, without its terminator and surrounding whitespace.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. Bytes left after the
    /// last terminator form a final frame unless they are only whitespace.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than `Interrupted` from the underlying stream.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.eof {
            return Ok(None);
        }

        let mut frame = Vec::new();
        loop {
            match self.read_byte()? {
                Some(byte) => {
                    frame.push(byte);
                    if frame.ends_with(&self.terminator) {
                        frame.truncate(frame.len() - self.terminator.len());
                        let frame = frame.trim_ascii().to_vec();
                        dbg!("in: {} bytes", frame.len());
                        return Ok(Some(frame));
                    }
                }
                None => {
                    self.eof = true;
                    let rest = frame.trim_ascii();
                    if rest.is_empty() {
                        debug!("input closed");
                        return Ok(None);
                    }
                    dbg!("in: {} bytes, unterminated", rest.len());
                    return Ok(Some(rest.to_vec()));
                }
            }
        }
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Writes terminator-delimited frames to an output and an error sink.
pub struct FrameWriter<O, E> {
    out: O,
    err: E,
    terminator: Vec<u8>,
}

impl<O: Write, E: Write> FrameWriter<O, E> {
    /// Creates a writer terminating frames with [`EOT`].
    pub fn new(out: O, err: E) -> Self {
        Self::with_terminator(out, err, [EOT])
    }

    /// Creates a writer with an arbitrary terminator; empty falls back to [`EOT`].
    pub fn with_terminator(out: O, err: E, terminator: impl AsRef<[u8]>) -> Self {
        let terminator = terminator.as_ref();
        let terminator = if terminator.is_empty() {
            vec![EOT]
        } else {
            terminator.to_vec()
        };
        Self {
            out,
            err,
            terminator,
        }
    }

    /// Writes one frame to the output sink.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing or flushing.
    pub fn send(&mut self, body: &[u8]) -> Result<()> {
        dbg!("out: {} bytes", body.len());
        Self::write_frame(&mut self.out, body, &self.terminator)
    }

    /// Writes one frame to the error sink.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing or flushing.
    pub fn send_error(&mut self, body: &[u8]) -> Result<()> {
        dbg!("err: {}", String::from_utf8_lossy(body));
        Self::write_frame(&mut self.err, body, &self.terminator)
    }

    fn write_frame(sink: &mut impl Write, body: &[u8], terminator: &[u8]) -> Result<()> {
        sink.write_all(body)?;
        sink.write_all(terminator)?;
        sink.flush()
    }

    /// Gives back the output and error sinks.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}
