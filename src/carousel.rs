//! Day-by-day themes carousel.
//!
//! Each day of the event unlocks one more slide; visitors can page back
//! through unlocked days but never ahead of the schedule.

/// Number of themed days at the event.
pub const TOTAL_SLIDES: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct Carousel {
    start_ms: f64,
    unlock_interval_ms: f64,
    current: u32,
    available: u32,
}

impl Carousel {
    /// `start_ms` is the epoch instant the first slide unlocks;
    /// `unlock_interval_ms` the period between unlocks (one day in
    /// production).
    pub fn new(start_ms: f64, unlock_interval_ms: f64) -> Self {
        Carousel {
            start_ms,
            unlock_interval_ms,
            current: 1,
            available: 1,
        }
    }

    /// 1-based index of the slide on screen.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Number of slides unlocked so far.
    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn can_advance(&self) -> bool {
        self.current < self.available
    }

    pub fn can_rewind(&self) -> bool {
        self.current > 1
    }

    /// Re-derive the unlocked range from wall-clock time and jump to the
    /// newest slide.
    pub fn sync(&mut self, now_ms: f64) {
        let elapsed = now_ms - self.start_ms;
        let units = if elapsed >= 0.0 && self.unlock_interval_ms > 0.0 {
            (elapsed / self.unlock_interval_ms) as u32
        } else {
            0
        };
        self.available = (units + 1).clamp(1, TOTAL_SLIDES);
        self.current = self.available;
    }

    pub fn advance(&mut self) {
        if self.can_advance() {
            self.current += 1;
        }
    }

    pub fn rewind(&mut self) {
        if self.can_rewind() {
            self.current -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: f64 = 86_400_000.0;

    #[test]
    fn starts_with_one_slide() {
        let c = Carousel::new(0.0, DAY);
        assert_eq!(c.current(), 1);
        assert_eq!(c.available(), 1);
        assert!(!c.can_advance());
        assert!(!c.can_rewind());
    }

    #[test]
    fn unlocks_one_slide_per_interval() {
        let mut c = Carousel::new(0.0, DAY);
        c.sync(3.5 * DAY);
        assert_eq!(c.available(), 4);
        assert_eq!(c.current(), 4);
    }

    #[test]
    fn never_unlocks_past_the_last_day() {
        let mut c = Carousel::new(0.0, DAY);
        c.sync(100.0 * DAY);
        assert_eq!(c.available(), TOTAL_SLIDES);
    }

    #[test]
    fn before_the_event_only_the_first_slide_exists() {
        let mut c = Carousel::new(10.0 * DAY, DAY);
        c.sync(0.0);
        assert_eq!(c.available(), 1);
    }

    #[test]
    fn paging_clamps_to_the_unlocked_range() {
        let mut c = Carousel::new(0.0, DAY);
        c.sync(2.0 * DAY);
        assert_eq!(c.current(), 3);

        c.advance();
        assert_eq!(c.current(), 3, "cannot page ahead of the schedule");

        c.rewind();
        c.rewind();
        assert_eq!(c.current(), 1);
        c.rewind();
        assert_eq!(c.current(), 1, "cannot page before the first slide");

        c.advance();
        assert_eq!(c.current(), 2);
    }
}
