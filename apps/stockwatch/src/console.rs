//! # Console
//!
//! The user-facing output stream shared by the shell and the low-stock
//! monitor. Each block of lines is written and flushed under one lock, so an
//! alert never lands in the middle of a command reply.
//!
//! [`Console::close`] writes a final block and seals the console; later
//! writes are discarded, so nothing can follow the farewell.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

struct Sink {
    writer: Box<dyn Write + Send>,
    closed: bool,
}

pub struct Console {
    out: Mutex<Sink>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    /// Console over any writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Sink {
                writer: Box::new(writer),
                closed: false,
            }),
        }
    }

    /// Console over the process stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write `lines` as one uninterrupted block. Dropped once closed.
    pub fn block<S: AsRef<str>>(&self, lines: &[S]) -> io::Result<()> {
        let mut sink = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if sink.closed {
            return Ok(());
        }
        write_block(&mut sink.writer, lines)
    }

    /// Write `lines` as the last block and seal the console.
    pub fn close<S: AsRef<str>>(&self, lines: &[S]) -> io::Result<()> {
        let mut sink = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if sink.closed {
            return Ok(());
        }
        sink.closed = true;
        write_block(&mut sink.writer, lines)
    }

    pub fn is_closed(&self) -> bool {
        self.out.lock().unwrap_or_else(PoisonError::into_inner).closed
    }

    /// Write a single line.
    pub fn line(&self, line: impl AsRef<str>) -> io::Result<()> {
        self.block(&[line])
    }
}

fn write_block<S: AsRef<str>>(out: &mut dyn Write, lines: &[S]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_blocks_never_interleave() {
        let buf = Shared::default();
        let console = Arc::new(Console::new(buf.clone()));

        let writers: Vec<_> = (0..4)
            .map(|n| {
                let console = Arc::clone(&console);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let lines: Vec<String> = (0..3).map(|i| format!("w{n} l{i}")).collect();
                        console.block(&lines).expect("write");
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().expect("writer");
        }

        let text = String::from_utf8(buf.0.lock().expect("lock").clone()).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4 * 50 * 3);
        for block in lines.chunks(3) {
            let writer = &block[0][..2];
            assert_eq!(block[0], format!("{writer} l0"));
            assert_eq!(block[1], format!("{writer} l1"));
            assert_eq!(block[2], format!("{writer} l2"));
        }
    }

    #[test]
    fn writes_after_close_are_dropped() {
        let buf = Shared::default();
        let console = Console::new(buf.clone());

        console.line("reply").expect("write");
        console.close(&["Goodbye!"]).expect("close");
        console.block(&["late alert", "more"]).expect("dropped write");
        console.close(&["second farewell"]).expect("close again");

        assert!(console.is_closed());
        let text = String::from_utf8(buf.0.lock().expect("lock").clone()).expect("utf8");
        assert_eq!(text, "reply\nGoodbye!\n");
    }
}
