use super::*;
use crate::error::SimError;
use approx::*;
use rand::SeedableRng;

fn params(temperature: f64, field: f64, coupling: f64) -> SimulationParameters {
    SimulationParameters::new(temperature, field, coupling).unwrap()
}

fn flipped_sites(before: &Lattice, after: &Lattice) -> Vec<(usize, usize)> {
    let mut sites = Vec::new();
    for y in 0..before.height() {
        for x in 0..before.width() {
            if before.get(x, y) != after.get(x, y) {
                sites.push((x, y));
            }
        }
    }
    sites
}

#[test]
fn test_lattice_creation() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let lattice = Lattice::new(8, 5, InitialState::Up, &mut rng).unwrap();
    assert_eq!(lattice.width(), 8);
    assert_eq!(lattice.height(), 5);
    assert_eq!(lattice.len(), 40);
    assert!(lattice.spins().iter().all(|&s| s == Spin::Up));

    let lattice = Lattice::new(3, 3, InitialState::Down, &mut rng).unwrap();
    assert_eq!(lattice.spin_sum(), -9);
}

#[test]
fn test_invalid_dimensions() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    assert_eq!(
        Lattice::new(0, 4, InitialState::Up, &mut rng),
        Err(SimError::InvalidDimensions {
            width: 0,
            height: 4
        })
    );
    assert!(Lattice::uniform(4, 0, Spin::Up).is_err());
}

#[test]
fn test_random_state_is_mixed() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
    let lattice = Lattice::new(32, 32, InitialState::Random, &mut rng).unwrap();
    let m = statistics::magnetization(&lattice);
    assert!(m.abs() < 0.2, "random start is too polarised: m = {}", m);
}

#[test]
fn test_ordered_state() {
    let lattice = Lattice::uniform(5, 5, Spin::Up).unwrap();
    let observables = sample(&lattice, &params(2.0, 0.0, 1.0));
    assert_eq!(observables.magnetization, analysis::magnetization_at_zero_temp());
    assert_relative_eq!(observables.energy / 25.0, -2.0, epsilon = 1e-10);

    let lattice = Lattice::uniform(5, 5, Spin::Down).unwrap();
    let observables = sample(&lattice, &params(2.0, 0.5, 1.0));
    assert_eq!(observables.magnetization, -1.0);
    // -J * 2N - h * (-N)
    assert_relative_eq!(observables.energy, -50.0 + 12.5, epsilon = 1e-10);
}

#[test]
fn test_energy_calculation() {
    let p = params(2.0, 0.0, 1.0);
    let mut lattice = Lattice::uniform(3, 3, Spin::Up).unwrap();
    let initial_energy = statistics::total_energy(&lattice, &p);

    // Flip one spin and check energy change
    assert_relative_eq!(update::delta_energy(&lattice, 1, 1, &p), 8.0);
    lattice.flip(1, 1);
    let new_energy = statistics::total_energy(&lattice, &p);

    // The energy should increase by 8J (one spin surrounded by 4 opposite neighbors)
    assert_relative_eq!(new_energy - initial_energy, 8.0, epsilon = 1e-10);
}

#[test]
fn test_delta_energy_with_field() {
    let p = params(2.0, 0.5, 1.0);
    let lattice = Lattice::uniform(4, 4, Spin::Up).unwrap();
    // 2 * J * 4 + 2 * h
    assert_relative_eq!(update::delta_energy(&lattice, 2, 3, &p), 9.0);

    let p = params(2.0, 0.0, -1.0);
    // antiferromagnetic coupling favours the flip
    assert_relative_eq!(update::delta_energy(&lattice, 0, 0, &p), -8.0);
}

#[test]
fn test_thin_lattice_delta_matches_recompute() {
    let p = params(1.5, 0.3, 1.0);
    for (w, h) in [(1, 6), (6, 1), (1, 1), (2, 3)] {
        let mut lattice = Lattice::uniform(w, h, Spin::Up).unwrap();
        lattice.set(0, 0, Spin::Down);
        let before = statistics::total_energy(&lattice, &p);
        let delta = update::delta_energy(&lattice, 0, 0, &p);
        lattice.flip(0, 0);
        let after = statistics::total_energy(&lattice, &p);
        assert_relative_eq!(after - before, delta, epsilon = 1e-10);
    }
}

#[test]
fn test_periodic_boundary_conditions() {
    let mut lattice = Lattice::uniform(3, 3, Spin::Up).unwrap();
    lattice.set(2, 0, Spin::Down);
    lattice.set(1, 2, Spin::Down);

    assert_eq!(lattice.get_periodic(-1, 0), Spin::Down); // wraps to (2, 0)
    assert_eq!(lattice.get_periodic(3, 1), Spin::Up); // wraps to (0, 1)
    assert_eq!(lattice.get_periodic(1, -1), Spin::Down); // wraps to (1, 2)
    assert_eq!(lattice.get_periodic(1, 3), Spin::Up); // wraps to (1, 0)
    assert_eq!(lattice.get(5, 3), Spin::Down); // wraps to (2, 0)
}

#[test]
fn test_neighbors_wrap() {
    let mut lattice = Lattice::uniform(4, 3, Spin::Up).unwrap();
    lattice.set(3, 0, Spin::Down);
    lattice.set(0, 2, Spin::Down);

    // left, right, up, down of the corner (0, 0)
    assert_eq!(
        lattice.neighbors(0, 0),
        [Spin::Down, Spin::Up, Spin::Down, Spin::Up]
    );
    assert_eq!(lattice.neighbor_sum(0, 0), 0);
    assert_eq!(lattice.neighbor_sum(1, 1), 4);
}

#[test]
fn test_flip_returns_new_spin() {
    let mut lattice = Lattice::uniform(2, 2, Spin::Up).unwrap();
    assert_eq!(lattice.flip(1, 1), Spin::Down);
    assert_eq!(lattice.flip(1, 1), Spin::Up);
    assert_eq!(i8::from(Spin::Down), -1);
}

#[test]
fn test_resize_keeps_lattice_on_error() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    let mut lattice = Lattice::new(4, 4, InitialState::Down, &mut rng).unwrap();
    assert!(lattice.resize(0, 2, InitialState::Up, &mut rng).is_err());
    assert_eq!((lattice.width(), lattice.height()), (4, 4));
    assert_eq!(lattice.spin_sum(), -16);

    lattice.resize(6, 2, InitialState::Up, &mut rng).unwrap();
    assert_eq!(lattice.len(), 12);
    assert_eq!(lattice.spin_sum(), 12);
}

#[test]
fn test_tracker_matches_recompute() {
    for rule in [UpdateRule::Metropolis, UpdateRule::Glauber] {
        for (t, h) in [(1.5, 0.0), (2.3, 0.4), (5.0, -1.2)] {
            let p = params(t, h, 1.0);
            let mut engine = UpdateEngine::new(rule, Xoshiro256PlusPlus::seed_from_u64(17));
            let mut lattice =
                Lattice::new(12, 9, InitialState::Random, engine.rng_mut()).unwrap();
            let mut tracker = ObservableTracker::new(&lattice, &p);

            for _ in 0..200 {
                let outcome = engine.sweep(&mut lattice, &p);
                tracker.apply(&outcome);
                assert_eq!(outcome.attempted, 108);
            }

            let exact = sample(&lattice, &p);
            let tracked = tracker.observables();
            assert_relative_eq!(tracked.energy, exact.energy, epsilon = 1e-8);
            assert_relative_eq!(tracked.magnetization, exact.magnetization, epsilon = 1e-12);
            assert_eq!(tracker.spin_sum(), lattice.spin_sum());
        }
    }
}

#[test]
fn test_magnetization_bounds() {
    let p = params(2.5, 0.0, 1.0);
    let mut engine = UpdateEngine::new(UpdateRule::Metropolis, Xoshiro256PlusPlus::seed_from_u64(5));
    let mut lattice = Lattice::new(10, 10, InitialState::Random, engine.rng_mut()).unwrap();
    for _ in 0..50 {
        engine.sweep(&mut lattice, &p);
        let m = statistics::magnetization(&lattice);
        assert!((-1.0..=1.0).contains(&m));
    }
}

#[test]
fn test_low_temperature_only_downhill() {
    // at tiny T an uphill move is accepted with probability exp(-8 / 1e-6) = 0
    let p = params(1e-6, 0.0, 1.0);
    let mut engine = UpdateEngine::new(UpdateRule::Metropolis, Xoshiro256PlusPlus::seed_from_u64(8));
    let mut lattice = Lattice::uniform(6, 6, Spin::Up).unwrap();
    let outcome = engine.run(&mut lattice, &p, 20);
    assert_eq!(outcome.accepted, 0);
    assert_eq!(lattice.spin_sum(), 36);

    // an isolated minority spin always flips back
    lattice.set(2, 2, Spin::Down);
    let outcome = engine.sweep(&mut lattice, &p);
    assert_eq!(outcome.accepted, 1);
    assert_relative_eq!(outcome.delta_energy, -8.0);
    assert_eq!(lattice.spin_sum(), 36);
}

#[test]
fn test_accept_rules() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(21);
    for _ in 0..100 {
        assert!(update::accept(UpdateRule::Metropolis, -4.0, 1.0, &mut rng));
        assert!(update::accept(UpdateRule::Metropolis, 0.0, 1.0, &mut rng));
        assert!(!update::accept(UpdateRule::Glauber, 1e4, 1.0, &mut rng));
    }

    // Glauber accepts a neutral move half the time
    let accepted = (0..20_000)
        .filter(|_| update::accept(UpdateRule::Glauber, 0.0, 1.0, &mut rng))
        .count();
    assert_relative_eq!(accepted as f64 / 20_000.0, 0.5, epsilon = 0.02);
}

#[test]
fn test_reproducible_sweep() {
    let p = params(2.0, 0.0, 1.0);
    let mut engine = UpdateEngine::new(UpdateRule::Metropolis, Xoshiro256PlusPlus::seed_from_u64(13));
    let start = Lattice::uniform(4, 4, Spin::Up).unwrap();
    let mut lattice = start.clone();

    let outcome = engine.sweep(&mut lattice, &p);

    assert_eq!(flipped_sites(&start, &lattice), vec![(0, 0), (1, 0)]);
    assert_eq!(outcome.attempted, 16);
    assert_eq!(outcome.accepted, 2);
    // 8 for the first flip, 4 for its right neighbor
    assert_relative_eq!(outcome.delta_energy, 12.0);
    assert_eq!(outcome.delta_magnetization, -4);

    // the same seed replays the same trajectory
    let mut again = UpdateEngine::new(UpdateRule::Metropolis, Xoshiro256PlusPlus::seed_from_u64(13));
    let mut replay = start.clone();
    assert_eq!(again.sweep(&mut replay, &p), outcome);
    assert_eq!(replay, lattice);
}

#[test]
fn test_frame_sizes() {
    let lattice = Lattice::uniform(7, 3, Spin::Up).unwrap();
    for format in [PixelFormat::Rgba8, PixelFormat::Rgb8, PixelFormat::Gray8] {
        let frame = FrameProducer::new(Palette::default(), format).render(&lattice);
        assert_eq!(frame.as_bytes().len(), 7 * 3 * format.channels());
        assert_eq!((frame.width(), frame.height()), (7, 3));
    }
}

#[test]
fn test_frame_colors() {
    let palette = Palette::default();
    let mut lattice = Lattice::uniform(2, 2, Spin::Up).unwrap();
    lattice.set(1, 0, Spin::Down);

    let frame = FrameProducer::new(palette, PixelFormat::Rgba8).render(&lattice);
    let [r, g, b] = palette.up;
    assert_eq!(frame.pixel(0, 0), &[r, g, b, 255]);
    let [r, g, b] = palette.down;
    assert_eq!(frame.pixel(1, 0), &[r, g, b, 255]);

    let frame = FrameProducer::new(palette, PixelFormat::Rgb8).render(&lattice);
    assert_eq!(frame.pixel(1, 0), &palette.down);

    let frame = FrameProducer::new(palette, PixelFormat::Gray8).render(&lattice);
    assert!(frame.pixel(0, 0)[0] > frame.pixel(1, 0)[0]);
}

#[test]
fn test_render_into_reuses_buffer() {
    let producer = FrameProducer::new(Palette::default(), PixelFormat::Rgb8);
    let lattice = Lattice::uniform(3, 3, Spin::Up).unwrap();
    let mut frame = producer.render(&lattice);

    let mut flipped = lattice.clone();
    flipped.flip(0, 0);
    producer.render_into(&flipped, &mut frame);
    assert_eq!(frame, producer.render(&flipped));
}

#[test]
fn test_parameter_validation() {
    assert!(SimulationParameters::new(2.0, 0.0, 1.0).is_ok());
    assert_eq!(
        SimulationParameters::new(0.0, 0.0, 1.0),
        Err(SimError::InvalidTemperature(0.0))
    );
    assert!(SimulationParameters::new(-1.0, 0.0, 1.0).is_err());
    assert!(SimulationParameters::new(f64::NAN, 0.0, 1.0).is_err());
    assert!(SimulationParameters::new(2.0, f64::INFINITY, 1.0).is_err());
    assert_eq!(
        SimulationParameters::new(2.0, 0.0, 0.0),
        Err(SimError::InvalidCoupling(0.0))
    );

    let p = SimulationParameters::default();
    let changed = p.with(Parameter::Field, 0.25).unwrap();
    assert_eq!(changed.field(), 0.25);
    assert_eq!(changed.get(Parameter::Temperature), 2.0);
    assert!(p.with(Parameter::Temperature, -3.0).is_err());
}

#[test]
fn test_parameter_names() {
    assert_eq!("temperature".parse::<Parameter>(), Ok(Parameter::Temperature));
    assert_eq!("T".parse::<Parameter>(), Ok(Parameter::Temperature));
    assert_eq!(" Field ".parse::<Parameter>(), Ok(Parameter::Field));
    assert_eq!("magnetic_field".parse::<Parameter>(), Ok(Parameter::Field));
    assert_eq!("j".parse::<Parameter>(), Ok(Parameter::Coupling));
    assert_eq!(
        "pressure".parse::<Parameter>(),
        Err(SimError::UnknownParameter("pressure".to_string()))
    );
    assert_eq!(Parameter::Coupling.to_string(), "coupling");
}

#[test]
fn test_statistics_accumulation() {
    let mut stats = Statistics::new();
    assert_eq!(stats.specific_heat(2.0, 4), 0.0);

    stats.record(Observables {
        energy: -8.0,
        magnetization: 1.0,
    });
    stats.record(Observables {
        energy: -4.0,
        magnetization: -0.5,
    });

    assert_eq!(stats.sample_count(), 2);
    assert_relative_eq!(stats.mean_energy(), -6.0);
    assert_relative_eq!(stats.mean_magnetization(), 0.25);
    assert_relative_eq!(stats.mean_abs_magnetization(), 0.75);
    assert_relative_eq!(stats.energy_variance(), 4.0);
    // Var(E) / (T^2 N)
    assert_relative_eq!(stats.specific_heat(2.0, 4), 0.25);
    // N (<m^2> - <|m|>^2) / T = 4 * (0.625 - 0.5625) / 2
    assert_relative_eq!(stats.susceptibility(2.0, 4), 0.125, epsilon = 1e-12);

    stats.clear();
    assert_eq!(stats.sample_count(), 0);
}

#[test]
fn test_critical_temperature() {
    let t_c = analysis::critical_temperature();
    assert_relative_eq!(t_c, 2.269, epsilon = 0.001);
    assert!(analysis::mean_field_critical_temperature() > t_c);
    assert_eq!(analysis::coordination_number(), 4);
    assert_relative_eq!(analysis::energy_per_site_at_zero_temp(), -2.0);
}

#[test]
fn test_structure_factor_ordered() {
    let lattice = Lattice::uniform(8, 8, Spin::Up).unwrap();
    let modes = analysis::StructureFactor::new(8).modes(&lattice);
    // σ(0) = N / sqrt(N) and the q_min mode cancels for a uniform state
    assert_relative_eq!(modes.s_q0(), 64.0, epsilon = 1e-10);
    assert_relative_eq!(modes.s_qx(), 0.0, epsilon = 1e-10);
    assert_eq!(analysis::correlation_length(modes.s_q0(), modes.s_qx(), 8), None);
}

#[test]
fn test_structure_factor_stripe() {
    // one full wavelength along x: s = +1 for x < 4, -1 otherwise
    let mut lattice = Lattice::uniform(8, 2, Spin::Up).unwrap();
    for y in 0..2 {
        for x in 4..8 {
            lattice.set(x, y, Spin::Down);
        }
    }
    let modes = analysis::StructureFactor::new(8).modes(&lattice);
    assert_relative_eq!(modes.s_q0(), 0.0, epsilon = 1e-10);
    assert!(modes.s_qx() > 1.0);
}

#[test]
fn test_correlation_length() {
    assert_eq!(analysis::correlation_length(1.0, 0.0, 8), None);
    assert_eq!(analysis::correlation_length(1.0, 2.0, 8), None);
    assert_relative_eq!(
        analysis::correlation_length(2.0, 1.0, 8).unwrap(),
        1.0 / (2.0 * (std::f64::consts::PI / 8.0).sin()),
        epsilon = 1e-12
    );
}

#[test]
fn test_arange() {
    let values = analysis::arange(1.0, 2.0, 0.25).unwrap();
    assert_eq!(values.len(), 4);
    assert_relative_eq!(values[3], 1.75);
    assert_eq!(analysis::arange(3.0, 1.0, -1.0).unwrap(), vec![3.0, 2.0]);
    assert_eq!(analysis::arange(1.0, 1.0, 0.5).unwrap(), Vec::<f64>::new());

    // a trailing partial step still contributes a value
    let values = analysis::arange(0.0, 1.0, 0.3).unwrap();
    assert_eq!(values.len(), 4);
    assert_relative_eq!(values[3], 0.9, epsilon = 1e-12);
    assert_eq!(analysis::arange(1.0, 1.1, 0.3).unwrap(), vec![1.0]);

    // exact multiples do not gain the endpoint through rounding
    let values = analysis::arange(1.5, 3.5, 0.1).unwrap();
    assert_eq!(values.len(), 20);
    assert!(values[19] < 3.5 - 0.05);
    assert_eq!(analysis::arange(1.0, 2.0, 0.0), None);
    assert_eq!(analysis::arange(1.0, 2.0, -0.5), None);
}
