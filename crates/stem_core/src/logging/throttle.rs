//! Progress log throttling.

/// Decides which progress values are worth a log line.
///
/// Only values that reach a new step boundary (e.g. 0, 20, 40, ...) are
/// logged, plus 100. Repeats of the last logged value are dropped. A value
/// below the last logged one starts a new bar and is always logged, so tools
/// that print several 0-100 bars keep showing up.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    step: u32,
    last: Option<u32>,
}

impl ProgressThrottle {
    pub fn new(step: u32) -> Self {
        Self {
            step: step.max(1),
            last: None,
        }
    }

    /// Forget the last logged value (call at the start of each run).
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Returns true if `percent` should be logged, recording it if so.
    pub fn should_log(&mut self, percent: u32) -> bool {
        if let Some(last) = self.last {
            if percent == last {
                return false;
            }
            let same_step = percent / self.step <= last / self.step;
            if percent > last && same_step && percent < 100 {
                return false;
            }
        }
        self.last = Some(percent);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_only_step_boundaries() {
        let mut throttle = ProgressThrottle::new(20);
        let logged: Vec<u32> = [0, 5, 19, 20, 21, 45, 59, 60, 79, 99, 100, 100]
            .into_iter()
            .filter(|p| throttle.should_log(*p))
            .collect();
        assert_eq!(logged, vec![0, 20, 45, 60, 99, 100]);
    }

    #[test]
    fn each_new_bar_is_logged_again() {
        let mut throttle = ProgressThrottle::new(20);
        let logged: Vec<u32> = [0, 50, 100, 0, 20, 40, 60, 80, 99, 100]
            .into_iter()
            .filter(|p| throttle.should_log(*p))
            .collect();
        assert_eq!(logged, vec![0, 50, 100, 0, 20, 40, 60, 80, 100]);
    }

    #[test]
    fn drop_within_a_bar_is_logged() {
        let mut throttle = ProgressThrottle::new(20);
        assert!(throttle.should_log(45));
        assert!(throttle.should_log(41));
        assert!(!throttle.should_log(42));
    }

    #[test]
    fn reset_starts_over() {
        let mut throttle = ProgressThrottle::new(10);
        assert!(throttle.should_log(50));
        assert!(!throttle.should_log(55));
        throttle.reset();
        assert!(throttle.should_log(5));
    }

    #[test]
    fn zero_step_is_treated_as_one() {
        let mut throttle = ProgressThrottle::new(0);
        assert!(throttle.should_log(1));
        assert!(throttle.should_log(2));
    }
}
