// src/writer/sink.rs

use std::io::{self, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Destination of a [`super::PipeLogger`].
///
/// Files are opened in append mode, so an existing log keeps its content and a
/// `.gz` log gains another gzip member.
#[derive(Debug)]
pub enum LogSink {
    /// No log path configured; input is drained and dropped.
    Discard,
    Plain(File),
    Gzip {
        file: File,
        encoder: GzEncoder<Vec<u8>>,
    },
}

impl LogSink {
    pub async fn open(path: Option<&Path>) -> io::Result<Self> {
        let Some(path) = path else {
            return Ok(LogSink::Discard);
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        if is_gzip_path(path) {
            Ok(LogSink::Gzip {
                file,
                encoder: GzEncoder::new(Vec::new(), Compression::default()),
            })
        } else {
            Ok(LogSink::Plain(file))
        }
    }

    /// Write one chunk and push it all the way to the file.
    ///
    /// The gzip encoder is sync-flushed per chunk so a log that is still being
    /// written can already be decompressed up to the last chunk.
    pub async fn write_chunk(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            LogSink::Discard => Ok(()),
            LogSink::Plain(file) => {
                file.write_all(buf).await?;
                file.flush().await
            }
            LogSink::Gzip { file, encoder } => {
                encoder.write_all(buf)?;
                encoder.flush()?;
                let compressed = std::mem::take(encoder.get_mut());
                file.write_all(&compressed).await?;
                file.flush().await
            }
        }
    }

    /// Flush and close. For gzip this writes the member trailer.
    pub async fn finish(self) -> io::Result<()> {
        match self {
            LogSink::Discard => Ok(()),
            LogSink::Plain(mut file) => file.flush().await,
            LogSink::Gzip { mut file, encoder } => {
                let tail = encoder.finish()?;
                file.write_all(&tail).await?;
                file.flush().await
            }
        }
    }
}

pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}
