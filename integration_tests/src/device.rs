//! Host-side serial port and clock for the firmware's command channel.
//!
//! The LoRa-E5 sits behind a USB-UART adapter; these adapters let the same
//! `AtChannel`/`LoraE5` code that runs on the node drive it from the host.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;

use sensor_node_firmware::config::uart::BAUD_RATE;
use sensor_node_firmware::lora::LoraE5;
use sensor_node_firmware::serial::{AtChannel, SerialError, SerialPort};
use sensor_node_firmware::time::Clock;

/// Modem type used by every test
pub type Modem = LoraE5<StdSerial, StdClock>;

/// Find candidate USB-UART ports (ttyUSB / ttyACM).
pub fn find_uart_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?
        .into_iter()
        .map(|info| info.port_name)
        .filter(|name| name.contains("ttyUSB") || name.contains("ttyACM"))
        .collect();
    Ok(ports)
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg != "auto" {
        return Ok(port_arg.to_string());
    }

    match find_uart_ports()?.into_iter().next() {
        Some(port) => Ok(port),
        None => anyhow::bail!("No USB-UART port found - ensure the LoRa-E5 adapter is connected"),
    }
}

/// Resolve two port arguments for two-module tests.
pub fn resolve_two_ports(port_a: &str, port_b: &str) -> Result<(String, String)> {
    if port_a != "auto" && port_b != "auto" {
        return Ok((port_a.to_string(), port_b.to_string()));
    }

    let found = find_uart_ports()?;
    let mut candidates = found
        .iter()
        .filter(|name| name.as_str() != port_a && name.as_str() != port_b);

    let a = match port_a {
        "auto" => candidates.next().cloned(),
        a => Some(a.to_string()),
    };
    let b = match port_b {
        "auto" => candidates.next().cloned(),
        b => Some(b.to_string()),
    };

    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => anyhow::bail!("Need two USB-UART ports, found {:?}", found),
    }
}

/// Open a port at the module's baud rate and wrap it as a modem.
pub fn open_modem(port_name: &str, baud_rate: Option<u32>) -> Result<Modem> {
    let port = serialport::new(port_name, baud_rate.unwrap_or(BAUD_RATE))
        .timeout(Duration::from_millis(100))
        .open()?;

    let mut serial = StdSerial { port };
    serial.port.clear(serialport::ClearBuffer::All)?;

    Ok(LoraE5::new(AtChannel::new(serial, StdClock::new())))
}

/// `serialport` handle as a non-blocking byte stream
pub struct StdSerial {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialPort for StdSerial {
    async fn try_read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        let available = self.port.bytes_to_read().map_err(|_| SerialError::ReadError)?;
        if available == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(_) => Err(SerialError::ReadError),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.port.write_all(data).map_err(|_| SerialError::WriteError)
    }

    async fn flush(&mut self) -> Result<(), SerialError> {
        self.port.flush().map_err(|_| SerialError::WriteError)
    }
}

/// Wall clock; delays block the calling thread
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}
