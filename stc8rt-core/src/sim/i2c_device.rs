//! Simulated I2C slaves

/// Size of a simulated slave's register file
pub const REGISTER_COUNT: usize = 64;

/// One observable step on the simulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    Stop,
    /// Address byte including the R/W bit
    Address(u8),
    /// Byte shifted out by the master
    Write(u8),
    /// Byte shifted in by the master
    Read(u8),
    /// Master acknowledged a received byte
    Ack,
    /// Master declined a received byte
    Nak,
}

/// Register-file slave with an auto-incrementing pointer
///
/// The first byte of a write transaction sets the pointer, later bytes are
/// stored at the pointer. Reads return bytes from the pointer onwards. Both
/// wrap at [`REGISTER_COUNT`], the way DS1307-style parts behave.
#[derive(Debug, Clone)]
pub struct SimI2cDevice {
    address: u8,
    registers: [u8; REGISTER_COUNT],
    pointer: usize,
    pointer_pending: bool,
    read_limit: Option<usize>,
    reads: usize,
}

impl SimI2cDevice {
    /// Slave at a 7-bit address with all registers zeroed
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; REGISTER_COUNT],
            pointer: 0,
            pointer_pending: false,
            read_limit: None,
            reads: 0,
        }
    }

    /// Preload registers starting at `offset`
    pub fn with_registers(mut self, offset: usize, bytes: &[u8]) -> Self {
        for (i, &byte) in bytes.iter().enumerate() {
            self.registers[(offset + i) % REGISTER_COUNT] = byte;
        }
        self
    }

    /// Clock out at most `limit` bytes per read, then hold the bus silent
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit);
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn register(&self, index: usize) -> u8 {
        self.registers[index % REGISTER_COUNT]
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Addressed by the master
    pub(crate) fn select(&mut self, read: bool) {
        if read {
            self.reads = 0;
        } else {
            self.pointer_pending = true;
        }
    }

    pub(crate) fn receive(&mut self, byte: u8) {
        if self.pointer_pending {
            self.pointer = usize::from(byte) % REGISTER_COUNT;
            self.pointer_pending = false;
        } else {
            self.registers[self.pointer] = byte;
            self.pointer = (self.pointer + 1) % REGISTER_COUNT;
        }
    }

    /// Next byte for the master, `None` once the read limit is used up
    pub(crate) fn transmit(&mut self) -> Option<u8> {
        if self.read_limit.is_some_and(|limit| self.reads >= limit) {
            return None;
        }
        let byte = self.registers[self.pointer];
        self.pointer = (self.pointer + 1) % REGISTER_COUNT;
        self.reads += 1;
        Some(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_then_data() {
        let mut dev = SimI2cDevice::new(0x68);
        dev.select(false);
        dev.receive(0x3E);
        dev.receive(0xA1);
        dev.receive(0xA2);
        assert_eq!(dev.register(0x3E), 0xA1);
        assert_eq!(dev.register(0x3F), 0xA2);

        dev.select(false);
        dev.receive(0x3F);
        dev.select(true);
        assert_eq!(dev.transmit(), Some(0xA2));
        // Wrapped to the start
        assert_eq!(dev.transmit(), Some(0x00));
    }

    #[test]
    fn test_read_limit_resets_per_transaction() {
        let mut dev = SimI2cDevice::new(0x50)
            .with_registers(0, &[1, 2, 3])
            .with_read_limit(2);
        dev.select(true);
        assert_eq!(dev.transmit(), Some(1));
        assert_eq!(dev.transmit(), Some(2));
        assert_eq!(dev.transmit(), None);
        dev.select(true);
        assert_eq!(dev.transmit(), Some(3));
    }
}
