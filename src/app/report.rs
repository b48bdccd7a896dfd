use crate::control::{MagnetizationHistory, Snapshot};
use crate::ising::analysis::critical_temperature;
use crate::scan::ScanPoint;
use tracing::info;

pub fn report_progress(tick: u64, snapshot: &Snapshot) {
    let sites = (snapshot.frame.width() * snapshot.frame.height()) as f64;
    info!(
        "tick {:>6} | sweeps {:>8} | T = {:.3} h = {:+.3} | E/N = {:+.5} | m = {:+.5} | <|m|> = {:.5}",
        tick,
        snapshot.sweeps,
        snapshot.parameters.temperature(),
        snapshot.parameters.field(),
        snapshot.observables.energy / sites,
        snapshot.observables.magnetization,
        snapshot.mean_abs_magnetization
    );
}

pub fn report_final(snapshot: &Snapshot, history: &MagnetizationHistory) {
    let sites = (snapshot.frame.width() * snapshot.frame.height()) as f64;
    info!("\nSimulation finished after {} sweeps.", snapshot.sweeps);
    info!("  Final energy per site:        {:+.6}", snapshot.observables.energy / sites);
    info!("  Final magnetization per site: {:+.6}", snapshot.observables.magnetization);
    info!(
        "  Averages over {} samples: <E>/N = {:+.6}, <|m|> = {:.6}",
        snapshot.samples,
        snapshot.mean_energy / sites,
        snapshot.mean_abs_magnetization
    );
    if !history.is_empty() {
        let points: Vec<String> = history.points().map(|m| format!("{:+.3}", m)).collect();
        info!("  Magnetization history (newest first): {}", points.join(" "));
    }
    info!(
        "  Reference: T_c = {:.4} for the square lattice",
        critical_temperature()
    );
}

pub fn report_scan(points: &[ScanPoint]) {
    info!("\nTemperature scan results (T_c = {:.4}):", critical_temperature());
    info!(
        "  {:>8} {:>12} {:>10} {:>12} {:>12} {:>8}",
        "T", "E/N", "<|m|>", "C", "chi", "acc"
    );
    for p in points {
        info!(
            "  {:>8.4} {:>12.6} {:>10.6} {:>12.6} {:>12.6} {:>8.4}",
            p.temperature,
            p.energy_per_site,
            p.abs_magnetization,
            p.specific_heat,
            p.susceptibility,
            p.acceptance_ratio
        );
    }
}
