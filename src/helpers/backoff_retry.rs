use std::fmt::Display;
use std::time::Duration;

use backoff::{retry_notify, Error, ExponentialBackoff};

pub fn backoff_retry<F, T, E>(fn_to_try: F, max_elapsed: Option<Duration>) -> Result<T, Error<E>>
where
    F: FnMut() -> Result<T, Error<E>>,
    E: Display,
{
    let notify = |err, dur: Duration| {
        log::error!(
            "Temporary error after {:.1}s: {}",
            dur.as_secs_f32(),
            err
        );
    };

    let backoff = ExponentialBackoff {
        max_elapsed_time: max_elapsed,
        ..ExponentialBackoff::default()
    };

    retry_notify(backoff, fn_to_try, notify)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_transient_until_success() {
        let mut attempts = 0;
        let res: Result<u32, Error<String>> = backoff_retry(
            || {
                attempts += 1;
                if attempts < 3 {
                    Err(Error::transient("not yet".to_string()))
                } else {
                    Ok(attempts)
                }
            },
            Some(Duration::from_secs(30)),
        );
        assert_eq!(res.unwrap(), 3);
    }

    #[test]
    fn permanent_error_stops_immediately() {
        let mut attempts = 0;
        let res: Result<(), Error<String>> = backoff_retry(
            || {
                attempts += 1;
                Err(Error::permanent("nope".to_string()))
            },
            None,
        );
        assert!(matches!(res, Err(Error::Permanent(_))));
        assert_eq!(attempts, 1);
    }
}
