use anyhow::{Context, Result, anyhow};
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

use crate::models::Reading;

const BAUD_RATE: u32 = 9600;
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// "Read gas concentration" command from the MH-Z19 datasheet,
/// checksum byte included.
const READ_CONCENTRATION: [u8; 9] = [0xff, 0x01, 0x86, 0x00, 0x00, 0x00, 0x00, 0x00, 0x79];

pub struct MhZ19 {
    port: Box<dyn SerialPort>,
}

impl MhZ19 {
    pub fn open(path: &str) -> Result<Self> {
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("Failed to open serial port {}", path))?;

        Ok(Self { port })
    }

    pub fn read_concentration(&mut self) -> Result<Reading> {
        self.port
            .write_all(&READ_CONCENTRATION)
            .context("Failed to send read command")?;
        self.port.flush().context("Failed to flush serial port")?;

        let mut frame = [0u8; 9];
        self.port
            .read_exact(&mut frame)
            .context("Short read from sensor")?;

        Reading::from_frame(&frame).ok_or_else(|| anyhow!("Invalid response frame from sensor"))
    }
}

pub fn list_ports() -> Result<()> {
    let ports = serialport::available_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    for port in ports {
        match &port.port_type {
            serialport::SerialPortType::UsbPort(info) => {
                println!(
                    "{} - USB (VID: 0x{:04x}, PID: 0x{:04x})",
                    port.port_name, info.vid, info.pid
                );
            }
            _ => println!("{}", port.port_name),
        }
    }

    Ok(())
}
