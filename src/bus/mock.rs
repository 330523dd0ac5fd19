//! Simulated I2C bus for testing
//!
//! Devices are register files with an auto-incrementing pointer: the first
//! byte of a write selects the register, following bytes are stored from
//! there on, and reads stream from the pointer. Addresses without a device
//! NACK.

use core::cell::RefCell;
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::vec::Vec;

/// Error reported by [`MockI2c`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockI2cError(pub ErrorKind);

impl embedded_hal_async::i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// One operation of a recorded transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Write(Vec<u8>),
    Read(usize),
}

/// A transaction as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTransaction {
    pub address: u8,
    pub ops: Vec<MockOp>,
}

struct Device {
    registers: [u8; 256],
    pointer: u8,
    /// Bytes returned by the next reads before falling back to registers
    queued_reads: VecDeque<u8>,
}

impl Device {
    fn new() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
            queued_reads: VecDeque::new(),
        }
    }

    fn next_byte(&mut self) -> u8 {
        if let Some(byte) = self.queued_reads.pop_front() {
            return byte;
        }
        let byte = self.registers[self.pointer as usize];
        self.pointer = self.pointer.wrapping_add(1);
        byte
    }
}

#[derive(Default)]
struct BusState {
    devices: BTreeMap<u8, Device>,
    log: Vec<MockTransaction>,
    next_error: Option<ErrorKind>,
}

/// Mock I2C master; clones share the same simulated bus
#[derive(Clone, Default)]
pub struct MockI2c {
    state: Rc<RefCell<BusState>>,
}

impl MockI2c {
    /// Empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device that acknowledges at `address`
    pub fn add_device(&self, address: u8) {
        self.state
            .borrow_mut()
            .devices
            .insert(address, Device::new());
    }

    /// Preset a register of an attached device
    pub fn set_register(&self, address: u8, register: u8, value: u8) {
        if let Some(device) = self.state.borrow_mut().devices.get_mut(&address) {
            device.registers[register as usize] = value;
        }
    }

    /// Current contents of a register
    pub fn register(&self, address: u8, register: u8) -> Option<u8> {
        self.state
            .borrow()
            .devices
            .get(&address)
            .map(|device| device.registers[register as usize])
    }

    /// Make the next reads from `address` return `data` regardless of the pointer
    pub fn queue_read(&self, address: u8, data: &[u8]) {
        if let Some(device) = self.state.borrow_mut().devices.get_mut(&address) {
            device.queued_reads.extend(data.iter().copied());
        }
    }

    /// Fail the next transaction with `kind`
    pub fn fail_next(&self, kind: ErrorKind) {
        self.state.borrow_mut().next_error = Some(kind);
    }

    /// Every transaction issued so far
    pub fn transactions(&self) -> Vec<MockTransaction> {
        self.state.borrow().log.clone()
    }

    /// Number of transactions issued so far
    pub fn transaction_count(&self) -> usize {
        self.state.borrow().log.len()
    }
}

impl ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        let ops = operations
            .iter()
            .map(|op| match op {
                Operation::Write(bytes) => MockOp::Write(bytes.to_vec()),
                Operation::Read(buf) => MockOp::Read(buf.len()),
            })
            .collect();
        state.log.push(MockTransaction { address, ops });

        if let Some(kind) = state.next_error.take() {
            return Err(MockI2cError(kind));
        }

        let Some(device) = state.devices.get_mut(&address) else {
            return Err(MockI2cError(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        };

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&register, payload)) = bytes.split_first() {
                        device.pointer = register;
                        for &byte in payload {
                            device.registers[device.pointer as usize] = byte;
                            device.pointer = device.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        *slot = device.next_byte();
                    }
                }
            }
        }

        Ok(())
    }
}
