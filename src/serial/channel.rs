//! Command-response channel
//!
//! Turns a raw byte stream into request/response exchanges for line- and
//! token-oriented device protocols such as AT commands.
//!
//! Every wait is bounded: the channel drains whatever bytes are buffered,
//! checks the elapsed time, then yields through [`Clock::delay_ms`] for one
//! poll interval before looking again. A read with timeout `T` and no
//! matching input therefore fails after at least `T` and at most
//! `T + poll_interval` milliseconds.
//!
//! Input is accumulated and matched as raw bytes. The returned text is the
//! UTF-8 reading of those bytes when they are valid UTF-8, otherwise one
//! character per byte (Latin-1).

use crate::config::{at, channel};
use crate::serial::traits::{SerialError, SerialPort};
use crate::time::Clock;
use heapless::{String, Vec};

/// Formatted command line
pub type CommandText = String<{ channel::MAX_COMMAND_LEN }>;

/// Accumulated response text
pub type ResponseText = String<{ channel::MAX_RESPONSE_LEN }>;

/// Received bytes before conversion to text
type RawResponse = Vec<u8, { channel::MAX_RESPONSE_LEN }>;

/// Errors that can occur during a channel operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// No matching terminator before the deadline
    Timeout,
    /// The device answered with the failure terminator
    ///
    /// Carries the response up to and including that terminator.
    Rejected(ResponseText),
    /// Response did not fit the accumulator
    Overflow,
    /// Formatted command did not fit the command buffer
    CommandTooLong,
    /// A command argument was refused before anything was sent
    InvalidArgument,
    /// Underlying byte stream failure
    Serial(SerialError),
}

impl From<SerialError> for ChannelError {
    fn from(error: SerialError) -> Self {
        Self::Serial(error)
    }
}

/// Pair of mutually exclusive tokens that end a collected response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminators<'a> {
    /// Ends the response successfully
    pub success: &'a str,
    /// Ends the response with a failure
    pub failure: &'a str,
}

impl Default for Terminators<'_> {
    fn default() -> Self {
        Self {
            success: at::OK,
            failure: at::ERROR,
        }
    }
}

/// Which terminator ended a collected response
enum Outcome {
    Accepted,
    Rejected,
}

/// Request/response channel over a serial port
pub struct AtChannel<S, C> {
    serial: S,
    clock: C,
    poll_interval_ms: u32,
}

impl<S, C> AtChannel<S, C>
where
    S: SerialPort,
    C: Clock,
{
    /// Create a channel over an already initialised serial port
    pub fn new(serial: S, clock: C) -> Self {
        Self {
            serial,
            clock,
            poll_interval_ms: channel::POLL_INTERVAL_MS,
        }
    }

    /// Override the delay between two polls of the stream
    pub fn with_poll_interval(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    /// Delay between two polls of the stream
    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }

    /// Access the channel's clock (shared with callers that need to wait)
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Give back the serial port and clock
    pub fn into_parts(self) -> (S, C) {
        (self.serial, self.clock)
    }

    /// Write raw bytes
    pub async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        self.serial.write(data).await?;
        Ok(())
    }

    /// Write text followed by the line terminator
    pub async fn write_line(&mut self, text: &str) -> Result<(), ChannelError> {
        self.serial.write(text.as_bytes()).await?;
        self.serial.write(at::LINE_TERMINATOR.as_bytes()).await?;
        self.serial.flush().await?;
        Ok(())
    }

    /// Read one line
    ///
    /// Carriage returns are dropped; the line feed ends the read and is not
    /// part of the returned text.
    pub async fn read_line(&mut self, timeout_ms: u32) -> Result<ResponseText, ChannelError> {
        let (line, ()) = self
            .accumulate(timeout_ms, |raw, byte| match byte {
                b'\r' => Ok(None),
                b'\n' => Ok(Some(())),
                _ => {
                    push_byte(raw, byte)?;
                    Ok(None)
                }
            })
            .await?;
        into_text(&line)
    }

    /// Read until the accumulated text ends with `token`
    ///
    /// The token is compared byte for byte. Returns the text with the token
    /// removed. An empty token matches immediately without consuming input.
    pub async fn read_until(
        &mut self,
        token: &str,
        timeout_ms: u32,
    ) -> Result<ResponseText, ChannelError> {
        if token.is_empty() {
            return Ok(ResponseText::new());
        }

        let token = token.as_bytes();
        let (mut raw, ()) = self
            .accumulate(timeout_ms, |raw, byte| {
                push_byte(raw, byte)?;
                Ok(raw.ends_with(token).then_some(()))
            })
            .await?;

        raw.truncate(raw.len() - token.len());
        into_text(&raw)
    }

    /// Fill `buffer` with raw bytes
    ///
    /// Either every byte of the buffer is written or the call fails.
    pub async fn read_exact(&mut self, buffer: &mut [u8], timeout_ms: u32) -> Result<(), ChannelError> {
        let start = self.clock.now_ms();
        let mut filled = 0;

        while filled < buffer.len() {
            match self.serial.try_read_byte().await? {
                Some(byte) => {
                    buffer[filled] = byte;
                    filled += 1;
                }
                None => {
                    if self.elapsed_since(start) >= u64::from(timeout_ms) {
                        log::debug!("read_exact timed out with {}/{} bytes", filled, buffer.len());
                        return Err(ChannelError::Timeout);
                    }
                    self.clock.delay_ms(self.poll_interval_ms).await;
                }
            }
        }

        Ok(())
    }

    /// Discard every byte already buffered, without waiting for more
    ///
    /// Returns the number of bytes dropped.
    pub async fn flush_input(&mut self) -> Result<usize, ChannelError> {
        let mut dropped = 0;
        while self.serial.try_read_byte().await?.is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            log::debug!("flushed {} stale bytes", dropped);
        }
        Ok(dropped)
    }

    /// Send a command and wait for `expected` to appear
    ///
    /// Stale input is flushed first. The text received before the token is
    /// discarded.
    pub async fn send_command(
        &mut self,
        command: &str,
        expected: &str,
        timeout_ms: u32,
        append_terminator: bool,
    ) -> Result<(), ChannelError> {
        self.flush_input().await?;

        log::debug!("> {}", command);
        if append_terminator {
            self.write_line(command).await?;
        } else {
            self.serial.write(command.as_bytes()).await?;
            self.serial.flush().await?;
        }

        self.read_until(expected, timeout_ms).await?;
        Ok(())
    }

    /// Send a command and collect its response up to a terminator
    ///
    /// The returned text includes the success terminator. A failure
    /// terminator yields [`ChannelError::Rejected`] holding the text up to
    /// and including it.
    pub async fn send_command_collect_response(
        &mut self,
        command: &str,
        terminators: Terminators<'_>,
        timeout_ms: u32,
    ) -> Result<ResponseText, ChannelError> {
        self.flush_input().await?;

        log::debug!("> {}", command);
        self.write_line(command).await?;

        let success = terminators.success.as_bytes();
        let failure = terminators.failure.as_bytes();
        let (raw, outcome) = self
            .accumulate(timeout_ms, |raw, byte| {
                push_byte(raw, byte)?;
                if raw.ends_with(success) {
                    Ok(Some(Outcome::Accepted))
                } else if raw.ends_with(failure) {
                    Ok(Some(Outcome::Rejected))
                } else {
                    Ok(None)
                }
            })
            .await?;

        let response = into_text(&raw)?;
        match outcome {
            Outcome::Accepted => Ok(response),
            Outcome::Rejected => {
                log::warn!("'{}' rejected: {}", command, response.as_str().trim_end());
                Err(ChannelError::Rejected(response))
            }
        }
    }

    /// Feed incoming bytes to `on_byte` until it reports a match or time runs out
    async fn accumulate<T>(
        &mut self,
        timeout_ms: u32,
        mut on_byte: impl FnMut(&mut RawResponse, u8) -> Result<Option<T>, ChannelError>,
    ) -> Result<(RawResponse, T), ChannelError> {
        let start = self.clock.now_ms();
        let mut raw = RawResponse::new();

        loop {
            while let Some(byte) = self.serial.try_read_byte().await? {
                if let Some(matched) = on_byte(&mut raw, byte)? {
                    return Ok((raw, matched));
                }
            }

            if self.elapsed_since(start) >= u64::from(timeout_ms) {
                log::debug!("timed out after {} ms ({} bytes pending)", timeout_ms, raw.len());
                return Err(ChannelError::Timeout);
            }

            self.clock.delay_ms(self.poll_interval_ms).await;
        }
    }

    fn elapsed_since(&self, start: u64) -> u64 {
        self.clock.now_ms().saturating_sub(start)
    }
}

fn push_byte(raw: &mut RawResponse, byte: u8) -> Result<(), ChannelError> {
    raw.push(byte).map_err(|_| ChannelError::Overflow)
}

/// UTF-8 if the bytes allow it, otherwise one character per byte
fn into_text(raw: &[u8]) -> Result<ResponseText, ChannelError> {
    let mut text = ResponseText::new();
    match core::str::from_utf8(raw) {
        Ok(utf8) => text.push_str(utf8).map_err(|_| ChannelError::Overflow)?,
        Err(_) => {
            for &byte in raw {
                text.push(char::from(byte)).map_err(|_| ChannelError::Overflow)?;
            }
        }
    }
    Ok(text)
}

/// Format a command into a fixed-capacity buffer
pub fn format_command(args: core::fmt::Arguments) -> Result<CommandText, ChannelError> {
    let mut command = CommandText::new();
    core::fmt::Write::write_fmt(&mut command, args).map_err(|_| ChannelError::CommandTooLong)?;
    Ok(command)
}
