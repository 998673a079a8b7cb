// src/logger/producer.rs

use std::io::{self, PipeWriter, Write};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

#[derive(Debug)]
struct Inner {
    writer: Mutex<Option<PipeWriter>>,
    close_requested: AtomicBool,
}

/// Writable end of the pipeline, handed to the producer.
///
/// Writes go straight to the pipe without buffering. Clones share the same
/// descriptor: closing any clone closes it for all of them.
///
/// `close` never blocks. If a write is in flight it finishes (or fails with
/// `BrokenPipe` once the reader is gone) and the descriptor is closed right
/// after it.
#[derive(Debug, Clone)]
pub struct ProducerHandle {
    inner: Arc<Inner>,
}

impl ProducerHandle {
    pub(crate) fn new(writer: PipeWriter) -> Self {
        Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(Some(writer)),
                close_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Write all of `buf` to the pipe. Blocks while the pipe is full.
    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        self.with_writer(|w| w.write_all(buf))
    }

    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.with_writer(|w| w.write(buf))
    }

    /// Duplicate the descriptor for a producer subprocess's stdout/stderr.
    ///
    /// The subprocess keeps the pipe open until it exits, independently of
    /// [`ProducerHandle::close`].
    pub fn try_clone_stdio(&self) -> io::Result<Stdio> {
        let guard = self.lock();
        match guard.as_ref() {
            Some(writer) if !self.is_closed() => Ok(Stdio::from(writer.try_clone()?)),
            _ => Err(closed_error()),
        }
    }

    /// Close the descriptor. Returns `true` for the call that requested the
    /// close, `false` if it was already closed.
    pub fn close(&self) -> bool {
        let first = !self.inner.close_requested.swap(true, Ordering::SeqCst);

        match self.inner.writer.try_lock() {
            Ok(mut guard) => drop(guard.take()),
            Err(TryLockError::Poisoned(poisoned)) => drop(poisoned.into_inner().take()),
            // The in-flight write closes it when it returns.
            Err(TryLockError::WouldBlock) => {}
        }

        first
    }

    pub fn is_closed(&self) -> bool {
        self.inner.close_requested.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Option<PipeWriter>> {
        self.inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut PipeWriter) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self.lock();
        if self.is_closed() {
            guard.take();
            return Err(closed_error());
        }

        let result = match guard.as_mut() {
            Some(writer) => f(writer),
            None => Err(closed_error()),
        };

        if self.is_closed() {
            guard.take();
        }
        result
    }
}

impl Write for &ProducerHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ProducerHandle::write(self, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        ProducerHandle::write_all(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for ProducerHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ProducerHandle::write(self, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        ProducerHandle::write_all(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "producer handle is closed")
}
