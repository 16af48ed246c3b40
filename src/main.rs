//! `mmdiag` binary: interactive PCI diagnostics over the simulated
//! backend. Stdin/stdout drive the menu loop; the process exit code
//! mirrors the final loop status.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use mmdiag::cprintln;
use mmdiag::diag::console::Console;
use mmdiag::diag::menu;
use mmdiag::pci::menus::{self, DiagCtx};
use mmdiag::sim::SimBus;

#[derive(Parser)]
#[command(name = "mmdiag", about = "Interactive diagnostics for memory-mapped PCI devices")]
struct Args {
    /// Vendor ID of a device to open at startup (hex)
    #[arg(long, value_parser = parse_hex_u32)]
    vendor: Option<u32>,

    /// Device ID of a device to open at startup (hex)
    #[arg(long, value_parser = parse_hex_u32)]
    device: Option<u32>,

    /// Scan the bus, print the devices found, and exit
    #[arg(long)]
    list: bool,
}

fn parse_hex_u32(arg: &str) -> Result<u32, String> {
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    u32::from_str_radix(digits, 16).map_err(|err| format!("not a hex ID: {err}"))
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    let mut con = Console::new(&mut input, &mut output);

    cprintln!(con, "PCI diagnostic utility.");
    cprintln!(con, "Device access is served by a simulated backend.");

    let mut ctx = DiagCtx::new(Box::new(SimBus::with_default_devices()));

    if args.list {
        menus::scan_bus(&ctx, &mut con);
        return ExitCode::SUCCESS;
    }

    if let (Some(vendor), Some(device)) = (args.vendor, args.device) {
        match ctx.open_by_id(vendor, device) {
            Ok(()) => cprintln!(con, "Opened device 0x{vendor:X}:0x{device:X}"),
            Err(err) => {
                cprintln!(
                    con,
                    "Failed opening device 0x{vendor:X}:0x{device:X}. Error 0x{:X} - {}",
                    err.code(),
                    err
                );
            }
        }
    }

    let root = menus::build_main_menu();
    match menu::run(&root, &mut ctx, &mut con) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            cprintln!(con, "Exiting with status 0x{:X} - {}", err.code(), err);
            con.flush();
            std::process::exit(err.code() as i32);
        }
    }
}
