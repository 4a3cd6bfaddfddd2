//! Event sources.
//!
//! The indexer consumes an ordered feed of decoded contract events. The
//! bundled source reads one JSON `EventEnvelope` per line.

use std::path::Path;

use async_trait::async_trait;
use payroll_ledger::EventEnvelope;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

use crate::config::EventsPath;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read event feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed event on line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered feed of events. `None` means the feed is exhausted.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>, SourceError>;
}

/// Reads newline-delimited JSON envelopes. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    lines: LinesStream<R>,
    line: u64,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LinesStream::new(reader.lines()),
            line: 0,
        }
    }

    /// Lines consumed so far, blank ones included.
    pub fn lines_read(&self) -> u64 {
        self.line
    }
}

/// Open the configured feed.
pub async fn open(path: &EventsPath) -> Result<Box<dyn EventSource>, SourceError> {
    match path {
        EventsPath::Stdin => Ok(Box::new(JsonLinesSource::new(BufReader::new(
            tokio::io::stdin(),
        )))),
        EventsPath::File(path) => open_file(path).await,
    }
}

async fn open_file(path: &Path) -> Result<Box<dyn EventSource>, SourceError> {
    let file = tokio::fs::File::open(path).await?;
    Ok(Box::new(JsonLinesSource::new(BufReader::new(file))))
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for JsonLinesSource<R> {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>, SourceError> {
        while let Some(line) = self.lines.next().await {
            let line = line?;
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }
            let envelope = serde_json::from_str(&line).map_err(|source| SourceError::Parse {
                line: self.line,
                source,
            })?;
            return Ok(Some(envelope));
        }
        Ok(None)
    }
}
