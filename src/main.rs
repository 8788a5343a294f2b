use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;

use argparse::{ArgumentParser, Parse, Print, StoreTrue};
use tracing::{error, info, Level};

use gbsync::{Cartridge, GameBoy, HardwareMode, CPU_HZ, FRAME_TICKS};

fn main() {
    let mut rom = PathBuf::new();
    let mut frames: u64 = 0;
    let mut mode = String::from("auto");
    let mut throttle = false;
    let mut verbose = false;
    let mut trace = false;

    {
        let mut parser = ArgumentParser::new();
        parser.set_description("A cycle accurate GameBoy core");
        parser.add_option(&["--version"],
                          Print(format!("gbsync: v{}", env!("CARGO_PKG_VERSION"))),
                          "Show version");
        parser.refer(&mut rom).add_option(&["-r", "--rom"], Parse, "Path to ROM file").required();
        parser.refer(&mut frames)
            .add_option(&["-f", "--frames"], Parse, "Stop after this many frames (0 = forever)");
        parser.refer(&mut mode).add_option(&["-m", "--mode"], Parse, "Hardware: auto, dmg or cgb");
        parser.refer(&mut throttle)
            .add_option(&["--throttle"], StoreTrue, "Run at the real frame rate");
        parser.refer(&mut verbose).add_option(&["-v", "--verbose"], StoreTrue, "Debug logging");
        parser.refer(&mut trace).add_option(&["--trace"], StoreTrue, "Trace every instruction");
        parser.parse_args_or_exit();
    }

    let level = if trace {
        Level::TRACE
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).init();

    let cart = match Cartridge::from_path(&rom) {
        Ok(cart) => cart,
        Err(e) => {
            error!("{}: {}", rom.display(), e);
            process::exit(1);
        }
    };

    let mut gb = match mode.as_str() {
        "auto" => GameBoy::new(cart),
        other => {
            match other.parse::<HardwareMode>() {
                Ok(mode) => GameBoy::with_mode(cart, mode),
                Err(e) => {
                    error!("{}", e);
                    process::exit(2);
                }
            }
        }
    };

    run(&mut gb, frames, throttle);
}

fn run(gb: &mut GameBoy, frames: u64, throttle: bool) {
    let frame_ns = FRAME_TICKS as u64 * 1_000_000_000 / CPU_HZ as u64;
    let stdout = io::stdout();
    let mut count = 0;

    loop {
        let start = time::precise_time_ns();
        gb.run_frame();
        count += 1;

        let serial = gb.take_serial_output();
        if !serial.is_empty() {
            let mut out = stdout.lock();
            if out.write_all(&serial).and_then(|_| out.flush()).is_err() {
                return;
            }
        }

        if frames != 0 && count >= frames {
            info!("stopping after {} frames, {} drawn", count, gb.frame_count());
            return;
        }

        if throttle {
            let elapsed = time::precise_time_ns() - start;
            if elapsed < frame_ns {
                thread::sleep(Duration::from_nanos(frame_ns - elapsed));
            }
        }
    }
}
