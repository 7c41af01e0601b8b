use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operator console shared by concurrently running sessions.
///
/// Clones write to the same sink. Each `write` call holds the lock, so a
/// line written with a single `write_all` is never split by another session.
#[derive(Clone)]
pub struct Console {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn new<W: Write + Send + 'static>(sink: W) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write one complete line and flush
    pub fn line(&self, text: &str) -> io::Result<()> {
        let mut sink = self.lock()?;
        sink.write_all(format!("{}\n", text).as_bytes())?;
        sink.flush()
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Box<dyn Write + Send>>> {
        self.sink
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "console lock poisoned"))
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock()?.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}
