use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

type Writer = BufWriter<Box<dyn Write + Send>>;

/// Shared destination for result lines.
///
/// Clones share one writer. Each line is written and flushed under the lock,
/// so concurrent tasks never interleave partial lines.
#[derive(Clone)]
pub struct OutputSink {
    writer: Arc<Mutex<Writer>>,
}

impl OutputSink {
    /// Appends to `path` (creating it) or writes to standard output.
    pub fn open(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Self::from_writer(Box::new(file)))
            }
            None => Ok(Self::from_writer(Box::new(io::stdout()))),
        }
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        OutputSink {
            writer: Arc::new(Mutex::new(BufWriter::new(writer))),
        }
    }

    pub async fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writeln!(writer, "{}", line)?;
        writer.flush()
    }

    pub async fn flush(&self) -> io::Result<()> {
        self.writer.lock().await.flush()
    }
}

impl Drop for OutputSink {
    fn drop(&mut self) {
        // Last handle out flushes whatever is still buffered.
        if Arc::strong_count(&self.writer) == 1 {
            if let Ok(mut writer) = self.writer.try_lock() {
                let _ = writer.flush();
            }
        }
    }
}
