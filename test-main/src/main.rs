mod settings;

use std::cell::Cell;
use std::env::{args, var};
use std::path::Path;
use std::thread;
use std::time::Duration;
use dotenv::dotenv;
use log::{debug, info, warn};
use sysinfo::System;
use multibutton::{ButtonEvent, ButtonStatus, MultiButton, StatusSet};
use multibutton_gpio::{GpiodMatrix, SystemClock};
use crate::settings::Timings;

/// How often the matrix is scanned.
const PROCESS_PERIOD: Duration = Duration::from_millis(5);
/// Scans the trigger test waits for every status before giving up.
const TRIGGER_ITERATIONS: u32 = 10_000;

fn parse_line_list(lines_str: &str) -> eyre::Result<Vec<u32>> {
    let lines = lines_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?;
    if lines.is_empty() {
        return Err(eyre::eyre!("No line numbers in {:?}", lines_str));
    }
    Ok(lines)
}

fn print_info() {
    let info = multibutton::info();
    info!("Chip is {}.", info.chip_name);
    info!("Manufacturer is {}.", info.manufacturer_name);
    info!("Interface is {}.", info.interface);
    info!("Driver version is {}.{}.", info.version_major(), info.version_minor());
    info!("Min supply voltage is {:.1}V.", info.supply_voltage_min_v);
    info!("Max supply voltage is {:.1}V.", info.supply_voltage_max_v);
    info!("Max current is {:.2}mA.", info.max_current_ma);
    info!("Max temperature is {:.1}C.", info.temperature_max);
    info!("Min temperature is {:.1}C.", info.temperature_min);
}

fn log_event(row: u16, col: u16, event: ButtonEvent) {
    if event.status.is_gesture() {
        info!("Row {} col {}: {}.", row, col, event);
    } else {
        debug!("Row {} col {}: {}.", row, col, event);
    }
}

fn open_matrix() -> eyre::Result<(GpiodMatrix, u8, u8)> {
    let chip = var("MULTIBUTTON_GPIO_CHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let row_lines = parse_line_list(&var("MULTIBUTTON_PINS_ROWS")?)?;
    let col_lines = parse_line_list(&var("MULTIBUTTON_PINS_COLS")?)?;

    info!("Matrix @ {}, Rows: {:?}, Cols: {:?}", chip, row_lines, col_lines);

    let matrix = GpiodMatrix::open(Path::new(&chip), &row_lines, &col_lines)?;
    let rows = u8::try_from(matrix.row_count())?;
    let cols = u8::try_from(matrix.col_count())?;
    Ok((matrix, rows, cols))
}

fn setup<'a>(
    matrix: GpiodMatrix,
    rows: u8,
    cols: u8,
    sink: impl FnMut(u16, u16, ButtonEvent) + 'a,
) -> eyre::Result<MultiButton<'a>> {
    let mut buttons = MultiButton::builder()
        .matrix(matrix)
        .clock(SystemClock::new())
        .event_sink(sink)
        .build()?;
    buttons.init(rows, cols)?;

    match Timings::try_load()? {
        Some(timings) => {
            info!("Timings loaded.");
            if let Err(e) = timings.apply(&mut buttons) {
                buttons.deinit()?;
                return Err(e.into());
            }
        }
        None => info!("Timings not found. Using defaults."),
    }
    debug!("{:?} initialized, {:?}.", buttons, buttons.config()?);
    Ok(buttons)
}

/// Scans until every status has been seen at least once.
fn trigger() -> eyre::Result<()> {
    let (matrix, rows, cols) = open_matrix()?;
    let seen = Cell::new(StatusSet::new());
    let mut buttons = setup(matrix, rows, cols, |row, col, event| {
        log_event(row, col, event);
        let mut statuses = seen.get();
        statuses.insert(event.status);
        seen.set(statuses);
    })?;

    info!("Start trigger test, try every gesture on any button.");
    let mut finished = false;
    for _ in 0..TRIGGER_ITERATIONS {
        if seen.get().is_complete() {
            finished = true;
            break;
        }
        thread::sleep(PROCESS_PERIOD);
        if let Err(e) = buttons.process() {
            warn!("Scan failed: {}", e);
        }
    }
    buttons.deinit()?;

    if finished {
        info!("Finish trigger test.");
        Ok(())
    } else {
        let missing: Vec<ButtonStatus> = seen.get().missing().collect();
        Err(eyre::eyre!("Trigger timeout, never saw {:?}", missing))
    }
}

/// Prints gestures until the process is killed.
fn monitor() -> eyre::Result<()> {
    let (matrix, rows, cols) = open_matrix()?;
    let mut buttons = setup(matrix, rows, cols, log_event)?;

    info!("Monitoring {}x{} matrix...", rows, cols);
    loop {
        if let Err(e) = buttons.process() {
            warn!("Scan failed: {}", e);
        }
        thread::sleep(PROCESS_PERIOD);
    }
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "multibutton v{} on {} ({}), kernel {}",
        env!("CARGO_PKG_VERSION"),
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::cpu_arch(),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let command = args().nth(1).unwrap_or_else(|| "monitor".to_string());
    match command.as_str() {
        "info" => {
            print_info();
            Ok(())
        }
        "trigger" => {
            print_info();
            trigger()
        }
        "monitor" => monitor(),
        other => Err(eyre::eyre!(
            "Unknown command {:?}, expected info, trigger or monitor",
            other
        )),
    }
}
