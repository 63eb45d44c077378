//! Bounded retry loop with a fixed delay and an injectable sleeper.

use std::time::Duration;

use tracing::warn;

/// Something that can block the current thread for a duration.
///
/// Any `Fn(Duration)` closure is a sleeper, so tests can record delays
/// instead of sleeping.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<F> Sleeper for F
where
    F: Fn(Duration),
{
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}

/// Sleeps the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `operation` up to `attempts` times (at least once), sleeping `delay`
/// between failed attempts but not after the final one. The closure receives
/// the 1-based attempt number.
pub fn retry<T, E, F>(
    operation_name: &str,
    attempts: u32,
    delay: Duration,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T, Exhausted<E>>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(last) if attempt == attempts => return Err(Exhausted { attempts, last }),
            Err(e) => {
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                    operation_name,
                    attempt,
                    attempts,
                    e,
                    delay.as_millis()
                );
                sleeper.sleep(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn succeeds_first_try_without_sleeping() {
        let slept = RefCell::new(Vec::new());
        let sleeper = |d: Duration| slept.borrow_mut().push(d);
        let result: Result<&str, Exhausted<String>> =
            retry("test", 3, Duration::from_secs(1), &sleeper, |_| Ok("done"));
        assert_eq!(result.unwrap(), "done");
        assert!(slept.borrow().is_empty());
    }

    #[test]
    fn retries_until_success() {
        let slept = RefCell::new(Vec::new());
        let sleeper = |d: Duration| slept.borrow_mut().push(d);
        let result = retry("test", 3, Duration::from_secs(1), &sleeper, |attempt| {
            if attempt < 3 {
                Err(format!("attempt {attempt} failed"))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(*slept.borrow(), vec![Duration::from_secs(1); 2]);
    }

    #[test]
    fn exhausts_and_keeps_last_error() {
        let slept = RefCell::new(Vec::new());
        let sleeper = |d: Duration| slept.borrow_mut().push(d);
        let mut calls = 0;
        let result: Result<(), _> = retry("test", 4, Duration::from_millis(5), &sleeper, |attempt| {
            calls += 1;
            Err(format!("failure #{attempt}"))
        });
        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last, "failure #4");
        assert_eq!(calls, 4);
        // No sleep after the final attempt.
        assert_eq!(slept.borrow().len(), 3);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let sleeper = |_: Duration| {
            panic!("must not sleep");
        };
        let result: Result<(), _> = retry("test", 0, Duration::ZERO, &sleeper, |_| Err("nope"));
        assert_eq!(result.unwrap_err().attempts, 1);
    }
}
