use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock, RwLockWriteGuard};

/// Log sink shared by every writer the subscriber hands out. Output always
/// goes to stderr and is copied to the file once one is configured.
#[derive(Clone)]
struct TeeSink {
    file: Arc<RwLock<Option<File>>>,
}

struct TeeWriter {
    file: Arc<RwLock<Option<File>>>,
}

impl TeeSink {
    fn new() -> Self {
        Self {
            file: Arc::new(RwLock::new(None)),
        }
    }
}

fn lock(file: &RwLock<Option<File>>) -> RwLockWriteGuard<'_, Option<File>> {
    // A panic while writing a log line leaves the file handle usable.
    file.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for TeeSink {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            file: self.file.clone(),
        }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = io::stderr().write(buf)?;
        if let Some(file) = lock(&self.file).as_mut() {
            let _ = file.write_all(&buf[..written]);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = lock(&self.file).as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

static SINK: OnceLock<TeeSink> = OnceLock::new();

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Calling it again is a no-op.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let sink = SINK.get_or_init(TeeSink::new).clone();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(sink)
        .try_init();
}

/// Starts (or stops, with `None`) copying log output to `log_file`.
pub fn set_log_file(log_file: Option<&Path>) -> io::Result<()> {
    let Some(sink) = SINK.get() else {
        return Ok(());
    };

    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Some(OpenOptions::new().create(true).append(true).open(path)?)
        }
        None => None,
    };

    *lock(&sink.file) = file;
    Ok(())
}
