//! Hardware configuration constants for the ESP32-S3 sensor node with a LoRa-E5 module

/// I2C pins for the sensor bus
pub mod i2c_pins {
    pub const SDA: u8 = 5;
    pub const SCL: u8 = 6;
}

/// UART pins wired to the LoRa-E5 module
pub mod uart_pins {
    pub const TX: u8 = 43;
    pub const RX: u8 = 44;
}

/// Sensor bus configuration
pub mod i2c {
    /// Fast mode; drop to 100 kHz if a part on the bus needs it
    pub const FREQUENCY_KHZ: u32 = 400;

    /// Lowest address probed by a bus scan
    pub const SCAN_FIRST_ADDRESS: u8 = 0x01;

    /// Highest address probed by a bus scan
    pub const SCAN_LAST_ADDRESS: u8 = 0x7E;
}

/// Radio UART configuration
pub mod uart {
    /// LoRa-E5 modules ship at 9600 baud
    pub const BAUD_RATE: u32 = 9600;
}

/// Command-response channel configuration
pub mod channel {
    /// Delay between polls of the byte stream while waiting for input
    pub const POLL_INTERVAL_MS: u32 = 5;

    /// Default timeout for line and token reads
    pub const READ_TIMEOUT_MS: u32 = 1000;

    /// Default timeout for a command round trip
    pub const COMMAND_TIMEOUT_MS: u32 = 2000;

    /// Capacity of a formatted command line
    pub const MAX_COMMAND_LEN: usize = 128;

    /// Capacity of an accumulated response
    pub const MAX_RESPONSE_LEN: usize = 256;
}

/// AT protocol literals
pub mod at {
    /// Line terminator appended to every command
    pub const LINE_TERMINATOR: &str = "\r\n";

    /// Success terminator
    pub const OK: &str = "OK";

    /// Failure terminator
    pub const ERROR: &str = "ERROR";
}

/// Default LoRa P2P configuration
pub mod lora_defaults {
    /// US ISM band frequency
    pub const FREQUENCY_HZ: u32 = 915_000_000;
    pub const SPREADING_FACTOR: u8 = 7;
    pub const BANDWIDTH_KHZ: u16 = 125;
    pub const PREAMBLE_LEN: u16 = 8;
    pub const TX_POWER_DBM: i8 = 14;
}

/// Telemetry scheduling
pub mod telemetry {
    /// Time between two samples
    pub const SAMPLE_INTERVAL_MS: u32 = 60_000;

    /// Wait before retrying a failed radio bring-up
    pub const BRING_UP_RETRY_MS: u32 = 5_000;

    /// Queued samples awaiting transmission
    pub const SAMPLE_QUEUE_LEN: usize = 4;
}

/// Protocol constants
pub mod protocol {
    /// Sample packet version (increment when the layout changes)
    pub const PACKET_VERSION: u8 = 1;
}
