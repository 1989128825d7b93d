//! Host event loop
//!
//! Drives an asynchronous batch from the calling thread by processing the
//! job's status messages at a fixed interval.

use std::thread;
use std::time::Duration;

use crate::batch::BatchController;
use crate::utils::progress::ProgressTracker;

/// Default delay between two rounds of status processing
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Process status messages until the batch in flight has finished
///
/// # Arguments
/// * `controller` - Controller running the batch
/// * `poll_interval` - Delay between two rounds
/// * `progress` - Optional spinner updated with the current region
///
/// # Returns
/// Number of rounds processed
pub fn run_until_idle(controller: &mut BatchController,
                      poll_interval: Duration,
                      progress: Option<&ProgressTracker>) -> usize {
    let mut rounds = 0;

    while controller.is_running() {
        if let Some(progress) = progress {
            if let Some(summary) = controller.summary() {
                progress.set_position(summary.regions as u64);
            }
            if let Some(region) = controller.current_region() {
                progress.set_message(region);
            }
        }

        if !controller.process_events() {
            break;
        }
        rounds += 1;
        thread::sleep(poll_interval);
    }

    if let Some(progress) = progress {
        progress.finish();
    }
    rounds
}
