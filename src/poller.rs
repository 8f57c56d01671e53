use std::{error::Error, time::Duration};

use crate::utils::sleep;

pub(crate) type PollCondition<'a> = dyn FnMut() -> Result<bool, Box<dyn Error>> + 'a;

pub(crate) trait Poller {
    /// Calls `condition` until it reports done or fails, waiting `interval`
    /// between attempts. There is no attempt limit.
    fn poll(&self, interval: Duration, condition: &mut PollCondition<'_>)
        -> Result<(), Box<dyn Error>>;
}

#[derive(Debug, Default)]
pub(crate) struct IntervalPoller;

impl Poller for IntervalPoller {
    fn poll(
        &self,
        interval: Duration,
        condition: &mut PollCondition<'_>,
    ) -> Result<(), Box<dyn Error>> {
        let mut attempt: usize = 0;
        loop {
            attempt += 1;
            log::trace!("Poll attempt {attempt}");
            if condition()? {
                log::debug!("Poll finished after {attempt} attempts");
                return Ok(());
            }
            sleep(interval);
        }
    }
}
