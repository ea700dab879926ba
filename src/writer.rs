use crate::error::Result;
use crate::transaction::Receipt;
use std::io::Write;

/// Writes settled receipts as CSV with a header row.
pub struct ReceiptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReceiptWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, receipt: &Receipt) -> Result<()> {
        self.writer.serialize(receipt)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes a receipt as one JSON line.
pub fn write_json<W: Write>(sink: &mut W, receipt: &Receipt) -> Result<()> {
    serde_json::to_writer(&mut *sink, receipt)?;
    writeln!(sink)?;
    Ok(())
}
