use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Timelike, Utc};
use serde::Serialize;

/// When a job fires. All calendar triggers are evaluated in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fixed interval after the previous fire.
    Every(Duration),
    /// Minute 0 of every hour divisible by `hours` (`0 */4 * * *`).
    EveryHours { hours: u32 },
    /// Once a day at `hour:minute`.
    DailyAt { hour: u32, minute: u32 },
}

impl Trigger {
    /// The first fire time strictly after `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Trigger::Every(interval) => {
                now + ChronoDuration::from_std(interval).unwrap_or(ChronoDuration::zero())
            }
            Trigger::EveryHours { hours } => {
                let hours = hours.clamp(1, 24);
                let top_of_hour = now.duration_trunc(ChronoDuration::hours(1)).unwrap_or(now);
                (1..=24)
                    .map(|k| top_of_hour + ChronoDuration::hours(k))
                    .find(|t| t.hour() % hours == 0)
                    .unwrap_or(top_of_hour + ChronoDuration::days(1))
            }
            Trigger::DailyAt { hour, minute } => {
                let midnight = now.duration_trunc(ChronoDuration::days(1)).unwrap_or(now);
                let today = midnight
                    + ChronoDuration::hours(hour.min(23) as i64)
                    + ChronoDuration::minutes(minute.min(59) as i64);
                if today > now {
                    today
                } else {
                    today + ChronoDuration::days(1)
                }
            }
        }
    }

    /// Time to wait from `now` until the next fire.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        (self.next_fire(now) - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Observable state of one scheduled job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    /// `Succeeded` or `Failed` once the job has run at least once.
    pub last_outcome: Option<JobState>,
    pub last_error: Option<String>,
    pub last_started: Option<DateTime<Utc>>,
    pub last_finished: Option<DateTime<Utc>>,
    pub next_fire: Option<DateTime<Utc>>,
    pub runs: u64,
    pub failures: u64,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: JobState::Idle,
            last_outcome: None,
            last_error: None,
            last_started: None,
            last_finished: None,
            next_fire: None,
            runs: 0,
            failures: 0,
        }
    }
}

/// Shared per-job status table.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    jobs: Arc<Mutex<BTreeMap<String, JobStatus>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, job: &str, f: impl FnOnce(&mut JobStatus)) {
        // A poisoned table only loses bookkeeping, never scheduling
        let mut jobs = match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(jobs.entry(job.to_string()).or_default());
    }

    pub fn idle(&self, job: &str, next_fire: DateTime<Utc>) {
        self.update(job, |s| {
            s.state = JobState::Idle;
            s.next_fire = Some(next_fire);
        });
    }

    pub fn started(&self, job: &str) {
        self.update(job, |s| {
            s.state = JobState::Running;
            s.last_started = Some(Utc::now());
        });
    }

    pub fn finished(&self, job: &str, result: Result<(), String>) {
        self.update(job, |s| {
            s.runs += 1;
            s.last_finished = Some(Utc::now());
            match result {
                Ok(()) => {
                    s.state = JobState::Succeeded;
                    s.last_error = None;
                }
                Err(e) => {
                    s.state = JobState::Failed;
                    s.failures += 1;
                    s.last_error = Some(e);
                }
            }
            s.last_outcome = Some(s.state);
        });
    }

    pub fn get(&self, job: &str) -> Option<JobStatus> {
        let jobs = match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        jobs.get(job).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, JobStatus> {
        match self.jobs.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
