//! Serial port trait for abstraction and testability
//!
//! This trait defines the byte stream the command-response channel runs on,
//! allowing the actual UART driver to be swapped with a mock for testing.

use core::future::Future;

/// Errors that can occur during serial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// Framing or parity error in received data
    FramingError,
    /// Receive buffer overflow
    OverflowError,
    /// Any other receive failure
    ReadError,
    /// Write error
    WriteError,
}

/// Abstract serial port interface for testability
///
/// The port must already be configured (baud rate, pins) by whoever
/// constructs it; the channel never touches line settings.
pub trait SerialPort {
    /// Take one byte if one is already buffered
    ///
    /// Never waits for data: returns `Ok(None)` when nothing is available.
    fn try_read_byte(&mut self) -> impl Future<Output = Result<Option<u8>, SerialError>>;

    /// Write all bytes from buffer
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), SerialError>>;

    /// Flush the write buffer
    fn flush(&mut self) -> impl Future<Output = Result<(), SerialError>>;
}

/// Adapter exposing an `embedded-io` stream as a [`SerialPort`]
///
/// Works with any async UART that can also report whether bytes are
/// waiting, such as the esp-hal async UART.
pub struct IoSerial<T> {
    inner: T,
}

impl<T> IoSerial<T> {
    /// Wrap a configured stream
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Give back the wrapped stream
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> SerialPort for IoSerial<T>
where
    T: embedded_io::ReadReady + embedded_io_async::Read + embedded_io_async::Write,
{
    async fn try_read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        let ready = self.inner.read_ready().map_err(map_read_error)?;
        if !ready {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte).await {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) => Err(map_read_error(e)),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.inner
            .write_all(data)
            .await
            .map_err(|_| SerialError::WriteError)
    }

    async fn flush(&mut self) -> Result<(), SerialError> {
        self.inner.flush().await.map_err(|_| SerialError::WriteError)
    }
}

fn map_read_error<E: embedded_io::Error>(error: E) -> SerialError {
    match error.kind() {
        embedded_io::ErrorKind::InvalidData => SerialError::FramingError,
        embedded_io::ErrorKind::OutOfMemory => SerialError::OverflowError,
        _ => SerialError::ReadError,
    }
}
