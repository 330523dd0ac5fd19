#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_hal::Async;
use static_cell::StaticCell;

use sensor_node_firmware::bus::SensorBus;
use sensor_node_firmware::config;
use sensor_node_firmware::debug;
use sensor_node_firmware::lora::LoraE5;
use sensor_node_firmware::serial::{AtChannel, IoSerial};
use sensor_node_firmware::tasks::{self, SampleReceiver, SampleSender, SAMPLE_CHANNEL};
use sensor_node_firmware::time::EmbassyClock;

/// Sensor bus on I2C0
type Bus = SensorBus<I2c<'static, Async>>;

/// LoRa-E5 on UART1
type Modem = LoraE5<IoSerial<Uart<'static, Async>>, EmbassyClock>;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

#[esp_hal::main]
fn main() -> ! {
    debug::init(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Sensor bus (SDA = GPIO5, SCL = GPIO6, see config::i2c_pins)
    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(config::i2c::FREQUENCY_KHZ)),
    )
    .expect("Failed to configure I2C0")
    .with_sda(peripherals.GPIO5)
    .with_scl(peripherals.GPIO6)
    .into_async();

    // Radio UART (TX = GPIO43, RX = GPIO44, see config::uart_pins)
    // Baud rate is fixed here, before the channel takes the port
    let uart = Uart::new(
        peripherals.UART1,
        UartConfig::default().with_baudrate(config::uart::BAUD_RATE),
    )
    .expect("Failed to configure UART1")
    .with_tx(peripherals.GPIO43)
    .with_rx(peripherals.GPIO44)
    .into_async();

    let bus = SensorBus::new(i2c);
    let modem = LoraE5::new(AtChannel::new(IoSerial::new(uart), EmbassyClock));

    log::info!("{} {} starting", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, bus, modem));
    })
}

#[embassy_executor::task]
async fn async_main(spawner: Spawner, bus: Bus, modem: Modem) {
    let sample_sender = SAMPLE_CHANNEL.sender();
    let sample_receiver = SAMPLE_CHANNEL.receiver();

    spawner.must_spawn(sensor_task(bus, sample_sender));
    spawner.must_spawn(lora_task(modem, sample_receiver));
}

/// Task that samples the sensor bus on a fixed interval
#[embassy_executor::task]
async fn sensor_task(bus: Bus, sender: SampleSender) {
    tasks::sensor_task(bus, EmbassyClock, sender).await;
}

/// Task that brings up the radio and transmits queued samples
#[embassy_executor::task]
async fn lora_task(modem: Modem, receiver: SampleReceiver) {
    tasks::lora_task(modem, receiver).await;
}
