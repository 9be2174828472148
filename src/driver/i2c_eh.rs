//! embedded_hal I2C trait implementation for MCP2221.
use embedded_hal::i2c::{self, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use super::MCP2221;
use crate::Error;

impl i2c::Error for Error {
    fn kind(&self) -> i2c::ErrorKind {
        // The MCP2221 reports too little to tell bus errors and arbitration loss
        // apart, so most failures are `Other`.
        match self {
            Error::I2cAddressNack => i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            _ => i2c::ErrorKind::Other,
        }
    }
}

impl i2c::ErrorType for MCP2221 {
    type Error = Error;
}

impl I2c<SevenBitAddress> for MCP2221 {
    /// Execute the provided operations on the I2C bus.
    ///
    /// <div class="warning">
    ///
    /// The MCP2221 has no HID command to read without a final STOP condition, so
    /// only transactions made of writes followed by reads are supported. Any write
    /// after a read returns [`Error::I2cUnsupportedEmbeddedHalTransaction`].
    ///
    /// </div>
    ///
    /// Adjacent writes are coalesced into one transfer, as are adjacent reads.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let first_read = operations
            .iter()
            .position(|op| matches!(op, Operation::Read(_)))
            .unwrap_or(operations.len());
        let (writes, reads) = operations.split_at_mut(first_read);
        if reads.iter().any(|op| matches!(op, Operation::Write(_))) {
            return Err(Error::I2cUnsupportedEmbeddedHalTransaction);
        }

        let write_data: Vec<u8> = writes
            .iter()
            .filter_map(|op| match op {
                Operation::Write(bytes) => Some(*bytes),
                Operation::Read(_) => None,
            })
            .flatten()
            .copied()
            .collect();
        let read_length: usize = reads
            .iter()
            .map(|op| match op {
                Operation::Read(buf) => buf.len(),
                Operation::Write(_) => 0,
            })
            .sum();

        match (write_data.is_empty(), read_length) {
            (true, 0) => return Err(Error::I2cTransferEmpty),
            (false, 0) => return self.i2c_write(address, &write_data),
            (false, _) => self.i2c_write_no_stop(address, &write_data)?,
            (true, _) => {}
        }

        let mut read_data = vec![0u8; read_length];
        if write_data.is_empty() {
            self.i2c_read(address, &mut read_data)?;
        } else {
            self.i2c_read_repeated_start(address, &mut read_data)?;
        }

        let mut remaining = read_data.as_slice();
        for op in reads.iter_mut() {
            if let Operation::Read(buf) = op {
                let (head, tail) = remaining.split_at(buf.len());
                buf.copy_from_slice(head);
                remaining = tail;
            }
        }
        Ok(())
    }

    fn read(&mut self, address: SevenBitAddress, read: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c_read(address, read)
    }

    fn write(&mut self, address: SevenBitAddress, write: &[u8]) -> Result<(), Self::Error> {
        self.i2c_write(address, write)
    }

    fn write_read(
        &mut self,
        address: SevenBitAddress,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c_write_read(address, write, read)
    }
}
