//! Session statistics and their on-screen formatting.

/// Counters for the current session.
///
/// Time values are seconds on the frame clock passed to [`crate::Game::frame`].
#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    clicks: u32,
    hits: u32,
    fps: f32,
    last_fps_sample: Option<f64>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_click(&mut self) {
        self.clicks += 1;
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    /// Last sampled frames per second.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Hits per click in `[0, 1]`; zero before the first click.
    pub fn accuracy(&self) -> f32 {
        if self.clicks == 0 {
            0.0
        } else {
            self.hits as f32 / self.clicks as f32
        }
    }

    /// Hits per minute over `elapsed` seconds; zero when no time has passed.
    pub fn hits_per_minute(&self, elapsed: f64) -> f32 {
        if elapsed > 0.0 {
            (self.hits as f64 / elapsed * 60.0) as f32
        } else {
            0.0
        }
    }

    /// Resample FPS from the last frame's `dt` once more than a second has
    /// passed since the previous sample. The first call only starts the clock.
    pub fn sample_fps(&mut self, now: f64, dt: f64) {
        match self.last_fps_sample {
            None => self.last_fps_sample = Some(now),
            Some(last) if now - last > 1.0 => {
                self.last_fps_sample = Some(now);
                if dt > 0.0 {
                    self.fps = (1.0 / dt) as f32;
                }
            }
            Some(_) => {}
        }
    }

    /// The five telemetry lines, top to bottom.
    pub fn telemetry_lines(&self, elapsed: f64) -> [String; 5] {
        [
            format!("FPS         : {:.1}", self.fps),
            format!("Time        : {:.1}", elapsed),
            format!("Hits        : {}", self.hits),
            format!("Accuracy    : {:.1}%", self.accuracy() * 100.0),
            format!("KPM         : {:.1}", self.hits_per_minute(elapsed)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_are_zero_before_any_input() {
        let stats = SessionStats::new();
        assert_eq!(stats.accuracy(), 0.0);
        assert_eq!(stats.hits_per_minute(0.0), 0.0);
        assert_eq!(stats.hits_per_minute(12.0), 0.0);
    }

    #[test]
    fn accuracy_and_kpm() {
        let mut stats = SessionStats::new();
        for _ in 0..4 {
            stats.record_click();
        }
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();

        assert!((stats.accuracy() - 0.75).abs() < 1e-6);
        assert!((stats.hits_per_minute(30.0) - 6.0).abs() < 1e-5);
    }

    #[test]
    fn fps_resamples_at_most_once_per_second() {
        let mut stats = SessionStats::new();
        stats.sample_fps(0.5, 0.016);
        assert_eq!(stats.fps(), 0.0);

        stats.sample_fps(1.2, 0.02);
        assert_eq!(stats.fps(), 0.0);

        stats.sample_fps(1.6, 0.02);
        assert!((stats.fps() - 50.0).abs() < 1e-3);

        stats.sample_fps(2.0, 0.01);
        assert!((stats.fps() - 50.0).abs() < 1e-3);

        stats.sample_fps(2.7, 0.01);
        assert!((stats.fps() - 100.0).abs() < 1e-2);
    }

    #[test]
    fn telemetry_formatting() {
        let mut stats = SessionStats::new();
        stats.record_click();
        stats.record_click();
        stats.record_click();
        stats.record_hit();
        stats.sample_fps(0.0, 0.0);
        stats.sample_fps(1.5, 1.0 / 144.0);

        let lines = stats.telemetry_lines(20.0);
        assert_eq!(lines[0], "FPS         : 144.0");
        assert_eq!(lines[1], "Time        : 20.0");
        assert_eq!(lines[2], "Hits        : 1");
        assert_eq!(lines[3], "Accuracy    : 33.3%");
        assert_eq!(lines[4], "KPM         : 3.0");
    }
}
