mod ambient;
mod display;
mod models;
mod serial;

use anyhow::Result;
use clap::Parser;
use std::thread;
use std::time::{Duration, Instant};

use ambient::{Ambient, UploadGate, UploadOutcome};
use display::{Console, Screen};
use serial::MhZ19;

#[derive(Parser)]
#[command(name = "mhz19-logger")]
#[command(about = "Poll an MH-Z19 CO2 sensor over serial and log readings to Ambient")]
struct Args {
    /// Serial port the sensor is attached to
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Ambient channel ID
    #[arg(short, long)]
    channel: Option<String>,

    /// Ambient write key
    #[arg(short = 'k', long)]
    write_key: Option<String>,

    /// Ambient API endpoint
    #[arg(long, default_value = ambient::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Seconds between sensor polls
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// Minimum seconds between uploads
    #[arg(long, default_value_t = 60)]
    upload_interval: u64,

    /// Output each reading as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Read the sensor once and exit
    #[arg(long)]
    once: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_ports {
        return serial::list_ports();
    }

    let uploader = match (&args.channel, &args.write_key) {
        (Some(channel), Some(key)) => Some(Ambient::new(&args.endpoint, channel, key)),
        _ => {
            eprintln!("No channel/write key configured; uploads disabled");
            None
        }
    };

    eprintln!("Opening {}...", args.port);
    let mut sensor = MhZ19::open(&args.port)?;

    let mut screen = Console::new();
    let mut gate = UploadGate::new(Instant::now(), Duration::from_secs(args.upload_interval));
    let poll_interval = Duration::from_secs(args.poll_interval);

    loop {
        match sensor.read_concentration() {
            Ok(reading) => {
                screen.show_reading(&reading);
                screen.show_level(reading.level());

                if args.json {
                    println!("{}", serde_json::to_string(&reading)?);
                }

                if let Some(uploader) = &uploader {
                    let sent =
                        gate.maybe_upload(Instant::now(), &reading, |ppm| uploader.send(ppm));
                    match sent {
                        Ok(UploadOutcome::Sent(status)) => {
                            eprintln!("Uploaded {} ppm (status {})", reading.co2_ppm, status);
                        }
                        Ok(UploadOutcome::TooSoon) => {}
                        Ok(UploadOutcome::Implausible) => {
                            eprintln!(
                                "Skipped upload ({} ppm outside sensor range)",
                                reading.co2_ppm
                            );
                        }
                        Err(err) => {
                            // Gate timer untouched; the next interval retries.
                            eprintln!("Upload failed: {:#}", err);
                        }
                    }
                }
            }
            Err(err) => {
                // Skip the cycle and retry on the next poll.
                eprintln!("Sensor read failed: {:#}", err);
            }
        }

        if args.once {
            break;
        }

        thread::sleep(poll_interval);
        screen.clear();
    }

    Ok(())
}
