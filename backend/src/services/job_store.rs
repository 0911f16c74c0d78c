use crate::models::{JobState, JobStatus};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-wide job id → status table shared between the runner and the
/// status endpoint. Entries are never evicted.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<Mutex<HashMap<String, JobStatus>>>,
}

impl JobStore {
    pub fn new() -> Self {
        JobStore {
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a fresh job. Returns false if the id is already taken.
    pub fn insert_new(&self, job_id: &str) -> bool {
        if let Ok(mut jobs) = self.jobs.lock() {
            if jobs.contains_key(job_id) {
                return false;
            }
            jobs.insert(job_id.to_string(), JobStatus::started());
            true
        } else {
            false
        }
    }

    /// Write a status for `job_id`. Once a job is terminal the write is
    /// dropped, so each job sees exactly one terminal transition.
    pub fn put(&self, job_id: &str, status: JobStatus) -> bool {
        if let Ok(mut jobs) = self.jobs.lock() {
            match jobs.get(job_id) {
                Some(current) if current.status.is_terminal() => {
                    warn!("Ignoring status write for finished job {job_id}");
                    false
                }
                _ => {
                    jobs.insert(job_id.to_string(), status);
                    true
                }
            }
        } else {
            false
        }
    }

    /// Move a tracked job to the terminal status built from its current record.
    pub fn finish(&self, job_id: &str, to_terminal: impl FnOnce(JobStatus) -> JobStatus) -> bool {
        match self.get(job_id) {
            Some(current) => self.put(job_id, to_terminal(current)),
            None => {
                warn!("Cannot finish unknown job {job_id}");
                false
            }
        }
    }

    pub fn get(&self, job_id: &str) -> Option<JobStatus> {
        if let Ok(jobs) = self.jobs.lock() {
            jobs.get(job_id).cloned()
        } else {
            None
        }
    }

    /// Apply a raw percent string from the engine, e.g. `" 45.2%"`.
    /// Unparsable payloads leave the status untouched.
    pub fn update_progress(&self, job_id: &str, raw: &str) {
        let Some(percent) = parse_percent(raw) else {
            debug!("Ignoring malformed progress '{raw}' for job {job_id}");
            return;
        };

        if let Ok(mut jobs) = self.jobs.lock() {
            if let Some(job) = jobs.get_mut(job_id) {
                if job.status == JobState::Downloading {
                    job.progress = percent;
                }
            }
        }
    }

    /// Replace the message (and optionally title) of a running job.
    pub fn set_message(&self, job_id: &str, message: String, title: Option<String>) {
        if let Ok(mut jobs) = self.jobs.lock() {
            if let Some(job) = jobs.get_mut(job_id) {
                if job.status == JobState::Downloading {
                    job.message = message;
                    if title.is_some() {
                        job.title = title;
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        if let Ok(jobs) = self.jobs.lock() {
            jobs.len()
        } else {
            0
        }
    }
}

fn parse_percent(raw: &str) -> Option<f64> {
    let value = raw.trim().trim_end_matches('%').trim().parse::<f64>().ok()?;
    value.is_finite().then(|| value.clamp(0.0, 100.0))
}
