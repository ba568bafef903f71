//! Time-of-day shaping signals and the jitter source behind them.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Half-width of the additive wind jitter.
pub const WIND_JITTER: f64 = 0.1;
/// Half-width of the multiplicative data-centre jitter around 1.0.
pub const DATACENTER_JITTER: f64 = 0.05;
/// Half-width of the additive frequency jitter (Hz).
pub const FREQUENCY_JITTER: f64 = 0.02;

/// Source of the random perturbations in the dispatch formulas.
///
/// `Seeded` draws from a [`StdRng`], so a fixed seed replays the same run;
/// `Off` returns zero noise everywhere, which makes every formula exact.
#[derive(Debug, Clone)]
pub enum Jitter {
    Seeded(StdRng),
    Off,
}

impl Jitter {
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(StdRng::seed_from_u64(seed))
    }

    /// Seeds from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::Seeded(StdRng::from_os_rng())
    }

    /// Uniform draw in `[-half_width, half_width]`.
    pub fn uniform(&mut self, half_width: f64) -> f64 {
        match self {
            Self::Seeded(rng) if half_width > 0.0 => rng.random_range(-half_width..=half_width),
            _ => 0.0,
        }
    }
}

/// Normalised demand multiplier: a 0.6 floor plus afternoon and evening peaks.
pub fn demand_curve(hour: f64) -> f64 {
    0.6 + gaussian(hour, 14.0, 8.0) + 0.7 * gaussian(hour, 19.0, 6.0)
}

/// Solar availability in `[0, 1]`: a half-sine over 06:00–20:00 peaking at 13:00.
pub fn solar_factor(hour: f64) -> f64 {
    if !(6.0..=20.0).contains(&hour) {
        return 0.0;
    }
    (PI * (hour - 6.0) / 14.0).sin().max(0.0)
}

/// Wind availability in `[0, 1]`: a daily cosine peaking at 03:00 plus `jitter`.
pub fn wind_factor(hour: f64, jitter: f64) -> f64 {
    (0.45 + 0.25 * (2.0 * PI * (hour - 3.0) / 24.0).cos() + jitter).clamp(0.0, 1.0)
}

/// EV charging factor: a 0.2 floor with a bump centred on 20:00.
pub fn ev_factor(hour: f64) -> f64 {
    0.2 + 0.8 * gaussian(hour, 20.0, 4.0)
}

fn gaussian(x: f64, centre: f64, width: f64) -> f64 {
    (-(x - centre).powi(2) / width).exp()
}

/// All shaping signals for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayProfile {
    pub hour: f64,
    pub demand: f64,
    pub solar: f64,
    pub wind: f64,
    pub ev: f64,
}

impl DayProfile {
    /// Evaluates every curve at `hour`, drawing the wind jitter from `jitter`.
    pub fn at(hour: f64, jitter: &mut Jitter) -> Self {
        Self {
            hour,
            demand: demand_curve(hour),
            solar: solar_factor(hour),
            wind: wind_factor(hour, jitter.uniform(WIND_JITTER)),
            ev: ev_factor(hour),
        }
    }

    /// Whether the demand curve is in its peak band (batteries discharge).
    pub fn is_peak(&self) -> bool {
        self.demand > 0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_peaks_at_one_pm_and_is_dark_at_night() {
        assert!((solar_factor(13.0) - 1.0).abs() < 1e-12);
        assert!(solar_factor(12.0) > 0.97);
        assert_eq!(solar_factor(2.0), 0.0);
        assert_eq!(solar_factor(21.0), 0.0);
        assert!(solar_factor(6.0).abs() < 1e-12);
    }

    #[test]
    fn demand_has_floor_and_evening_peak() {
        assert!((demand_curve(3.0) - 0.6).abs() < 0.01);
        assert!(demand_curve(19.0) > demand_curve(10.0));
        assert!(demand_curve(15.0) > 1.5);
    }

    #[test]
    fn wind_stays_in_unit_interval() {
        for h in 0..24 {
            let w = wind_factor(h as f64, 0.9);
            assert!((0.0..=1.0).contains(&w));
            let w = wind_factor(h as f64, -0.9);
            assert!((0.0..=1.0).contains(&w));
        }
        assert!((wind_factor(3.0, 0.0) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn ev_peaks_at_eight_pm() {
        assert!((ev_factor(20.0) - 1.0).abs() < 1e-12);
        assert!(ev_factor(8.0) < 0.21);
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let mut a = Jitter::seeded(7);
        let mut b = Jitter::seeded(7);
        for _ in 0..16 {
            let x = a.uniform(0.1);
            assert_eq!(x, b.uniform(0.1));
            assert!(x.abs() <= 0.1);
        }
    }

    #[test]
    fn disabled_jitter_is_silent() {
        let mut j = Jitter::Off;
        assert_eq!(j.uniform(5.0), 0.0);
        let p = DayProfile::at(3.0, &mut j);
        assert!((p.wind - 0.7).abs() < 1e-12);
    }
}
