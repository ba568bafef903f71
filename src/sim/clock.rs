use crate::error::PlaybackError;

/// Playback speed multipliers the clock accepts.
pub const SPEEDS: [f64; 4] = [0.5, 1.0, 2.0, 4.0];

/// Simulated time-of-day driving the dispatch curves.
///
/// Each call to [`advance`](SimClock::advance) moves the hour forward by
/// `tick_hours × speed`, wrapping at midnight, but only while playing.
///
/// # Examples
///
/// ```
/// use grid_sim::sim::clock::SimClock;
///
/// let mut clock = SimClock::new(23.5, 0.25);
/// clock.advance();
/// clock.advance();
/// assert_eq!(clock.hour(), 0.0);
///
/// clock.set_playing(false);
/// clock.advance();
/// assert_eq!(clock.hour(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    /// Hour of day in `[0, 24)`
    hour: f64,
    playing: bool,
    speed: f64,
    /// Hours advanced per tick at 1x
    tick_hours: f64,
}

impl SimClock {
    /// Creates a playing clock at 1x speed.
    ///
    /// # Arguments
    ///
    /// * `start_hour` - Initial hour, wrapped into `[0, 24)`
    /// * `tick_hours` - Simulated hours per tick at 1x
    pub fn new(start_hour: f64, tick_hours: f64) -> Self {
        Self {
            hour: wrap_hour(start_hour),
            playing: true,
            speed: 1.0,
            tick_hours,
        }
    }

    pub fn hour(&self) -> f64 {
        self.hour
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn tick_hours(&self) -> f64 {
        self.tick_hours
    }

    /// Advances one tick. Time is frozen while paused.
    ///
    /// # Returns
    ///
    /// The hour after advancing.
    pub fn advance(&mut self) -> f64 {
        if self.playing {
            self.hour = wrap_hour(self.hour + self.tick_hours * self.speed);
        }
        self.hour
    }

    /// Jumps to `hour`, wrapped into `[0, 24)`.
    pub fn set_hour(&mut self, hour: f64) {
        self.hour = wrap_hour(hour);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Sets the playback multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::UnsupportedSpeed`] unless `speed` is one of
    /// [`SPEEDS`]; the current speed is kept.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), PlaybackError> {
        if !SPEEDS.contains(&speed) {
            return Err(PlaybackError::UnsupportedSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Moves to the next faster (`+1`) or slower (`-1`) speed, saturating.
    pub fn step_speed(&mut self, direction: i32) {
        let idx = SPEEDS.iter().position(|s| *s == self.speed).unwrap_or(1);
        let next = if direction > 0 {
            (idx + 1).min(SPEEDS.len() - 1)
        } else {
            idx.saturating_sub(1)
        };
        self.speed = SPEEDS[next];
    }
}

fn wrap_hour(hour: f64) -> f64 {
    if hour.is_finite() {
        let h = hour.rem_euclid(24.0);
        // rem_euclid can round up to exactly 24.0 for tiny negatives
        if h >= 24.0 { 0.0 } else { h }
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock_wraps_start() {
        assert_eq!(SimClock::new(25.0, 0.25).hour(), 1.0);
        assert_eq!(SimClock::new(-1.0, 0.25).hour(), 23.0);
    }

    #[test]
    fn test_advance_scales_with_speed() {
        let mut clock = SimClock::new(10.0, 0.25);
        clock.set_speed(4.0).unwrap();
        assert_eq!(clock.advance(), 11.0);
    }

    #[test]
    fn test_paused_clock_is_frozen() {
        let mut clock = SimClock::new(10.0, 0.25);
        clock.set_playing(false);
        for _ in 0..10 {
            clock.advance();
        }
        assert_eq!(clock.hour(), 10.0);
    }

    #[test]
    fn test_unsupported_speed_rejected() {
        let mut clock = SimClock::new(0.0, 0.25);
        assert_eq!(
            clock.set_speed(3.0),
            Err(PlaybackError::UnsupportedSpeed(3.0))
        );
        assert_eq!(clock.speed(), 1.0);
    }

    #[test]
    fn test_step_speed_saturates() {
        let mut clock = SimClock::new(0.0, 0.25);
        for _ in 0..6 {
            clock.step_speed(1);
        }
        assert_eq!(clock.speed(), 4.0);
        for _ in 0..6 {
            clock.step_speed(-1);
        }
        assert_eq!(clock.speed(), 0.5);
    }

    #[test]
    fn test_non_finite_hour_resets_to_midnight() {
        let mut clock = SimClock::new(5.0, 0.25);
        clock.set_hour(f64::NAN);
        assert_eq!(clock.hour(), 0.0);
    }
}
