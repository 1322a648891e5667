//! Wind Node Host Simulator
//!
//! Runs the node's real measurement cycle on a PC. The voltmeter is
//! replaced by a simulated signal and the radio by UDP broadcast, so any
//! listener on the LAN receives the same 29-byte frames the device sends.
//!
//! ## Usage
//!
//! ```bash
//! # Random 0-15 V signal, frames to 255.255.255.255:4210 every 2 s
//! cargo run --features std --bin windnode_sim
//!
//! # Gust pattern, custom identity, faster cycle, stop after 10 cycles
//! cargo run --features std --bin windnode_sim -- \
//!     --mode sine --mac 24:6F:28:AA:BB:CC --interval-ms 500 --count 10
//!
//! # Decode frames broadcast by another node
//! cargo run --features std --bin windnode_sim -- --listen
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::UdpSocket;
use std::process::ExitCode;

use embassy_futures::block_on;
use embassy_time::Duration;

use windnode::adapters::host::{
    StdLog, TerminalDisplay, ThreadDelay, UdpBroadcast, DEFAULT_UDP_PORT,
};
use windnode::config::NodeConfig;
use windnode::{
    CalibrationCurve, MacAddress, MeasurementCycle, SimulatedVoltage, TelemetryFrame, Waveform,
    WindSensor,
};

/// Identity used when `--mac` is not given (locally administered)
const DEFAULT_MAC: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x57, 0x4E, 0x44]);

struct Args {
    mac: MacAddress,
    port: u16,
    interval_ms: u64,
    waveform: Waveform,
    seed: u64,
    count: Option<u32>,
    listen: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        mac: DEFAULT_MAC,
        port: DEFAULT_UDP_PORT,
        interval_ms: NodeConfig::default().interval.as_millis(),
        waveform: Waveform::FULL_SCALE_RANDOM,
        seed: 0x5EED,
        count: None,
        listen: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("{} needs a value", flag));
        match flag.as_str() {
            "--mac" => {
                let text = value()?;
                args.mac = MacAddress::parse(&text.to_uppercase())
                    .map_err(|e| format!("--mac {}: {}", text, e))?;
            }
            "--port" => args.port = value()?.parse().map_err(|e| format!("--port: {}", e))?,
            "--interval-ms" => {
                args.interval_ms = value()?
                    .parse()
                    .map_err(|e| format!("--interval-ms: {}", e))?
            }
            "--seed" => args.seed = value()?.parse().map_err(|e| format!("--seed: {}", e))?,
            "--count" => {
                args.count = Some(value()?.parse().map_err(|e| format!("--count: {}", e))?)
            }
            "--mode" => {
                args.waveform = match value()?.as_str() {
                    "random" => Waveform::FULL_SCALE_RANDOM,
                    "sine" => Waveform::GUSTS,
                    other => return Err(format!("unknown mode '{}' (random|sine)", other)),
                }
            }
            "--listen" => args.listen = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(args)
}

fn print_help() {
    println!("windnode_sim - run the wind node measurement cycle on a PC");
    println!();
    println!("  --mac <AA:BB:CC:DD:EE:FF>   node identity");
    println!("  --port <port>               UDP port (default {})", DEFAULT_UDP_PORT);
    println!("  --interval-ms <ms>          cycle interval (default 2000)");
    println!("  --mode <random|sine>        simulated signal (default random)");
    println!("  --seed <n>                  random seed");
    println!("  --count <n>                 stop after n cycles");
    println!("  --listen                    print frames received on the port instead");
}

fn listen(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    println!("Listening for telemetry frames on UDP port {}", port);

    let mut buf = [0u8; 256];
    loop {
        let (n, from) = socket.recv_from(&mut buf)?;
        match TelemetryFrame::decode(&buf[..n]) {
            Ok(frame) => println!(
                "{} {} [{}] {:.2} m/s",
                from,
                frame.source_label,
                frame.kind.as_str(),
                frame.measurement
            ),
            Err(e) => eprintln!("{}: dropped {} bytes: {}", from, n, e),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help to see available options");
            return ExitCode::FAILURE;
        }
    };

    if args.listen {
        return match listen(args.port) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let log = StdLog;
    let source = SimulatedVoltage::new(args.waveform, args.seed);
    let sensor = WindSensor::new(source, CalibrationCurve::WIND_SPEED, &log);
    let config = NodeConfig::default().with_interval(Duration::from_millis(args.interval_ms));

    let mut cycle = MeasurementCycle::new(
        sensor,
        UdpBroadcast::new(args.port),
        TerminalDisplay::stdout(),
        &log,
        ThreadDelay,
        args.mac,
    )
    .with_config(config);

    log::info!("node {} broadcasting on UDP port {}", args.mac, args.port);

    block_on(async {
        match args.count {
            None => cycle.run().await,
            Some(count) => {
                cycle.start().await;
                for _ in 0..count {
                    cycle.run_once().await;
                    cycle.sleep().await;
                }
            }
        }
    });

    let stats = cycle.stats();
    log::info!(
        "{} cycles, {} broadcasts ok, {} failed",
        stats.cycles,
        stats.broadcasts_ok,
        stats.broadcasts_failed
    );
    ExitCode::SUCCESS
}
