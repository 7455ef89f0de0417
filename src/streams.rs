use crate::any_value::Value;
use crate::traits::FnConsumer;
use std::cell::RefCell;
use std::fmt::{self, Display};
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// A shared, line-oriented output stream
///
/// Writing only needs `&self`, so the same stream can be stored in a map and
/// used by the caller at the same time.
pub struct PrintStream {
    inner: RefCell<Box<dyn Write>>,
}

impl PrintStream {
    pub fn from_writer<W: Write + 'static>(writer: W) -> Self {
        Self {
            inner: RefCell::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    pub fn print(&self, value: impl Display) -> io::Result<()> {
        write!(self.inner.borrow_mut(), "{}", value)
    }

    pub fn println(&self, value: impl Display) -> io::Result<()> {
        writeln!(self.inner.borrow_mut(), "{}", value)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.inner.borrow_mut().flush()
    }

    /// A consumer that prints each string it receives on its own line
    ///
    /// Write failures cannot be returned through the consumer, so they are
    /// logged instead.
    pub fn println_consumer(self: &Rc<Self>) -> FnConsumer<String, impl Fn(&String) + 'static> {
        let stream = Rc::clone(self);
        FnConsumer::new(move |line: &String| {
            if let Err(err) = stream.println(line) {
                tracing::warn!(%err, "println consumer failed to write");
            }
        })
    }
}

impl Value for PrintStream {}

impl fmt::Debug for PrintStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrintStream").finish_non_exhaustive()
    }
}

enum Source {
    // Locked per read; the process-wide stdin lock is not re-entrant
    Stdin(io::Stdin),
    Reader(Box<dyn BufRead>),
}

/// A shared, buffered input stream
pub struct InputStream {
    source: RefCell<Source>,
}

impl InputStream {
    pub fn from_reader<R: BufRead + 'static>(reader: R) -> Self {
        Self {
            source: RefCell::new(Source::Reader(Box::new(reader))),
        }
    }

    /// The process's standard input
    ///
    /// Any number of these can exist alongside other users of
    /// `std::io::stdin()`; the lock is only held while a line is read.
    pub fn stdin() -> Self {
        Self {
            source: RefCell::new(Source::Stdin(io::stdin())),
        }
    }

    /// Reads one line without its terminator, or `None` at end of input
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = match &mut *self.source.borrow_mut() {
            Source::Stdin(stdin) => stdin.lock().read_line(&mut line)?,
            Source::Reader(reader) => reader.read_line(&mut line)?,
        };
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

impl Value for InputStream {}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InputStream").finish_non_exhaustive()
    }
}
