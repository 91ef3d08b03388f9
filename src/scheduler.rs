// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Periodic driver for the refresh cycle.
//!
//! The first cycle starts immediately, later ones on a fixed interval. A
//! cycle that overruns the interval delays the next tick instead of
//! triggering a burst. The loop stops when the shutdown signal flips, even in
//! the middle of a cycle.

use std::time::Duration;

use clap::ValueEnum;
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{info, warn};

use crate::{error::Error, exporter::Cycle};

/// What to do when a cycle fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum,)]
pub enum CyclePolicy
{
    /// Stop the scheduler and return the error.
    #[default]
    Exit,
    /// Log the error and wait for the next tick.
    Continue,
}

/// Runs a [`Cycle`] on a fixed interval.
#[derive(Debug,)]
pub struct Scheduler<C,>
{
    cycle:    C,
    interval: Duration,
    policy:   CyclePolicy,
}

impl<C,> Scheduler<C,>
where
    C: Cycle,
{
    pub fn new(cycle: C, interval: Duration, policy: CyclePolicy,) -> Self
    {
        Self {
            cycle,
            interval,
            policy,
        }
    }

    /// Runs cycles until `shutdown` changes or its sender is dropped.
    ///
    /// # Errors
    ///
    /// With [`CyclePolicy::Exit`], returns the error of the first failed
    /// cycle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool,>,) -> Result<(), Error,>
    {
        let mut ticker = tokio::time::interval(self.interval,);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay,);
        let mut cycles = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            cycles += 1;
            let outcome = tokio::select! {
                outcome = self.cycle.run() => outcome,
                _ = shutdown.changed() => break,
            };

            match outcome {
                Ok(report,) => info!(
                    "Cycle {} published {} pull requests from {} repositories in {:?}",
                    cycles, report.pull_requests, report.collections, report.elapsed
                ),
                Err(error,) if self.policy == CyclePolicy::Continue => {
                    warn!("Cycle {} failed, keeping previous series: {}", cycles, error);
                }
                Err(error,) => return Err(error,),
            }
        }

        info!("Scheduler stopped after {} cycles", cycles);
        Ok((),)
    }
}
