//! Logging setup

use std::fmt;
use std::fs::File;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Stamps each log line with the time elapsed since logging was set up
struct RunClock {
    started: Instant,
}

impl RunClock {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl FormatTime for RunClock {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", elapsed_stamp(self.started.elapsed()))
    }
}

/// `+H:MM:SS.d`; hours are not wrapped, long scans keep counting.
fn elapsed_stamp(elapsed: Duration) -> String {
    let tenths = elapsed.as_millis() / 100;
    let seconds = tenths / 10;
    format!(
        "+{}:{:02}:{:02}.{}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60,
        tenths % 10
    )
}

/// Route log output to a file, or to stdout when no path is given.
///
/// Safe to call more than once; only the first subscriber is installed.
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(RunClock::new())
                    .with_ansi(false);
                if Registry::default().with(file_layer).try_init().is_ok() {
                    info!("Output will be written to: {}", path);
                }
            }
            Err(err) => {
                eprintln!("Could not create output file {}: {}", path, err);
                init_stdout();
            }
        },
        None => init_stdout(),
    }
}

fn init_stdout() {
    let stdout_layer = layer()
        .with_writer(std::io::stdout)
        .with_timer(RunClock::new())
        .with_ansi(true);
    if Registry::default().with(stdout_layer).try_init().is_ok() {
        info!("Output will be printed to stdout");
    }
}
