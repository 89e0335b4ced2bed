use std::env;
use std::error::Error;
use std::process;

use nes_cpu_core::bus::Bus;
use nes_cpu_core::debug_flags;
use nes_cpu_core::emulator::{Machine, RunOutcome};
use nes_cpu_core::mapper::Nrom;

const DEFAULT_STEPS: u64 = 1_000_000;

struct Options {
    image: String,
    steps: u64,
    start_pc: Option<u16>,
    trace: bool,
    save: Option<String>,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--steps N] [--pc ADDR] [--trace] [--save FILE] <image>",
        program
    )
}

/// Accepts `C000`, `$C000` or `0xC000`.
fn parse_addr(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|e| format!("bad address '{}': {}", text, e))
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let program = args.first().map(String::as_str).unwrap_or("nes-cpu-run");
    let mut image = None;
    let mut steps = DEFAULT_STEPS;
    let mut start_pc = None;
    let mut trace = false;
    let mut save = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--steps" => {
                let value = args.get(i + 1).ok_or("--steps requires a value")?;
                steps = value
                    .parse()
                    .map_err(|e| format!("bad step count '{}': {}", value, e))?;
                i += 1;
            }
            "--pc" => {
                let value = args.get(i + 1).ok_or("--pc requires a value")?;
                start_pc = Some(parse_addr(value)?);
                i += 1;
            }
            "--trace" => trace = true,
            "--save" => {
                let value = args.get(i + 1).ok_or("--save requires a value")?;
                save = Some(value.clone());
                i += 1;
            }
            "--help" | "-h" => return Err(usage(program)),
            other if other.starts_with("--") => {
                return Err(format!("unknown option {}\n{}", other, usage(program)))
            }
            other => image = Some(other.to_string()),
        }
        i += 1;
    }

    Ok(Options {
        image: image.ok_or_else(|| usage(program))?,
        steps,
        start_pc,
        trace,
        save,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    };
    if options.trace {
        // Flags are read once; set before anything consults them.
        env::set_var("CPU_TRACE", "1");
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let image = std::fs::read(&options.image)?;
    log::info!("Loaded {} ({} bytes)", options.image, image.len());

    let mut machine = Machine::new(Bus::new(Box::new(Nrom::new(image))));
    machine.power_on();
    if let Some(pc) = options.start_pc {
        machine.cpu_mut().set_pc(pc);
        log::info!("Starting at ${:04X}", pc);
    }
    machine.debugger_mut().set_tracing(options.trace);

    let outcome = machine.run_until_halt(options.steps);
    match outcome {
        RunOutcome::Halted { pc } => log::warn!("CPU halted at ${:04X}", pc),
        RunOutcome::StepLimit => log::info!("Stopped after {} steps", options.steps),
        other => log::info!("Stopped: {:?}", other),
    }

    if options.trace {
        for entry in machine.debugger().trace() {
            println!("{}", entry);
        }
    }
    if !debug_flags::quiet() {
        println!("{}", machine.cpu().snapshot());
    }
    if let Some(path) = options.save {
        machine.save_state().save_to_file(&path)?;
    }
    Ok(())
}
