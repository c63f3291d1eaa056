//! Sink over any `std::io::Write`.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::channel::ChannelId;
use crate::error::Result;
use crate::sink::{Ack, Delivery, FlushStatus, Propagation, Sink};

/// Writes every accepted byte to an underlying writer, ignoring the channel.
///
/// Optionally writes a delimiter at each message end.
pub struct WriterSink<W> {
    writer: Mutex<W>,
    delimiter: Option<Vec<u8>>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            delimiter: None,
        }
    }

    /// Write `delimiter` after every message.
    pub fn with_message_delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn accept(&self, _channel: &ChannelId, data: &[u8], _blocking: bool) -> Result<Delivery> {
        self.lock().write_all(data)?;
        Ok(Delivery::Accepted)
    }

    fn accept_message_end(
        &self,
        _channel: &ChannelId,
        _propagation: Propagation,
        _blocking: bool,
    ) -> Result<Ack> {
        if let Some(delimiter) = &self.delimiter {
            self.lock().write_all(delimiter)?;
        }
        Ok(Ack::Accepted)
    }

    fn flush(
        &self,
        _channel: &ChannelId,
        _complete: bool,
        _propagation: Propagation,
        _blocking: bool,
    ) -> Result<FlushStatus> {
        self.lock().flush()?;
        Ok(FlushStatus::AllClean)
    }

    fn message_series_end(
        &self,
        _channel: &ChannelId,
        propagation: Propagation,
        _blocking: bool,
    ) -> Result<Ack> {
        if propagation.reaches_downstream() {
            self.lock().flush()?;
        }
        Ok(Ack::Accepted)
    }
}
