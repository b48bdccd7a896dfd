use super::report::{report_final, report_progress, report_scan};
use crate::config::{Args, Config};
use crate::control::{Controller, Snapshot, SimulationWorker, WorkerSettings};
use crate::io::write_frame_pnm_file;
use crate::scan::{run_scan, write_csv, ScanPoint};
use crate::simulation::Simulation;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::thread;
use std::time::Duration;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Run the threaded control loop for the configured number of ticks.
///
/// Scheduled parameter changes are sent once the published sweep count
/// passes their tick; the worker applies them at its next tick boundary and
/// pauses itself after the last configured tick.
pub fn run_interactive(config: &Config, args: &Args) -> Result<Snapshot> {
    let (width, height) = config.dimensions();
    let params = config.parameters()?;
    let seed = seed_in_use(config);

    let simulation =
        Simulation::with_options(width, height, params, seed, config.simulation_options())?;
    let sweeps_per_tick = config.control.sweeps_per_tick.unwrap_or(1);
    let controller = Controller::new(simulation, sweeps_per_tick)?;
    let ticks = config.control.ticks.unwrap_or(0) as u64;

    let settings = WorkerSettings {
        tick_interval: config.control.tick_interval(),
        publish_every: 1,
        tick_limit: Some(ticks as usize),
    };
    let worker = SimulationWorker::spawn(controller, settings);
    let latest = worker.latest();

    let report_every = config.control.report_every.unwrap_or(1).max(1) as u64;
    let mut schedule = config.control.schedule.iter().peekable();
    let mut last_reported = 0u64;

    worker.start()?;
    loop {
        let Some(snapshot) = latest.take() else {
            if worker.is_finished() {
                return Err(eyre!("Simulation worker exited unexpectedly"));
            }
            thread::sleep(POLL_INTERVAL);
            continue;
        };
        let tick = snapshot.sweeps / sweeps_per_tick as u64;

        while let Some(change) = schedule.next_if(|change| change.tick as u64 <= tick) {
            info!(
                "tick {}: setting {} to {}",
                tick, change.parameter, change.value
            );
            worker.schedule_parameter(change.parameter, change.value)?;
        }

        if tick / report_every > last_reported / report_every {
            report_progress(tick, &snapshot);
            last_reported = tick;
        }

        if tick >= ticks {
            break;
        }
    }

    let controller = worker
        .shutdown()
        .wrap_err("Simulation worker did not shut down cleanly")?;
    let snapshot = controller.snapshot();
    report_final(&snapshot, controller.history());

    if let Some(path) = &args.frame_output {
        write_frame_pnm_file(path, &snapshot.frame)
            .wrap_err_with(|| format!("Unable to write frame to {}", path))?;
        info!("Final frame written to {}", path);
    }

    Ok(snapshot)
}

/// Configured seed, or the one drawn for this run; logged so a run can be replayed.
fn seed_in_use(config: &Config) -> u64 {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!("Using seed {}", seed);
    seed
}

/// Run the temperature scan and write the CSV table.
pub fn run_temperature_scan(config: &Config, args: &Args) -> Result<Vec<ScanPoint>> {
    let setup = config.scan_setup(seed_in_use(config))?;
    let started = std::time::Instant::now();
    let points = run_scan(&setup)?;
    info!(
        "Scan of {} temperatures finished in {:.2}s",
        points.len(),
        started.elapsed().as_secs_f64()
    );
    report_scan(&points);

    match &args.csv_output {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("Unable to create CSV file: {}", path))?;
            let mut writer = BufWriter::new(file);
            write_csv(&mut writer, &points)?;
            writer.flush()?;
            info!("Scan results written to {}", path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_csv(&mut handle, &points)?;
        }
    }

    Ok(points)
}
