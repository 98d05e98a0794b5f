use susu_common::db::job_registry::Dao as JobRegistryDao;
use susu_common::db::DbAsyncPool;

use futures::future;
use std::time::{Duration, Instant, SystemTime};
use tokio::time;

use crate::jobs::Job;

struct JobContainer {
    job: Box<dyn Job>,
    run_frequency: Duration,
    last_run_time: SystemTime,
}

pub struct JobRunner {
    jobs: Vec<JobContainer>,
    update_frequency: Duration,
    job_registry_dao: JobRegistryDao,
}

impl JobRunner {
    pub fn new(update_frequency: Duration, db_async_pool: &DbAsyncPool) -> Self {
        Self {
            jobs: Vec::new(),
            update_frequency,
            job_registry_dao: JobRegistryDao::new(db_async_pool),
        }
    }

    pub async fn register(&mut self, job: Box<dyn Job>, run_frequency: Duration) {
        let job_name_ref = job.name();

        log::info!(
            "Registered job \"{}\" to run every {} seconds",
            job_name_ref,
            run_frequency.as_secs()
        );

        let last_run_time = self
            .job_registry_dao
            .get_job_last_run_timestamp(job_name_ref)
            .await
            .unwrap_or_else(|e| {
                log::error!(
                    "Failed to get last run timestamp for job '{}': {}",
                    job_name_ref,
                    e
                );
                None
            });

        let job_container = JobContainer {
            job,
            run_frequency,
            last_run_time: last_run_time.unwrap_or(SystemTime::now()),
        };

        self.jobs.push(job_container);
    }

    pub async fn start(&mut self) -> ! {
        loop {
            self.run_due_jobs().await;
            time::sleep(self.update_frequency).await;
        }
    }

    async fn run_due_jobs(&mut self) {
        let before = Instant::now();
        let now = SystemTime::now();

        let mut job_names = Vec::with_capacity(self.jobs.len());
        let mut job_futures = Vec::with_capacity(self.jobs.len());

        for job_container in &mut self.jobs {
            let job = &mut job_container.job;

            if is_due(job_container.last_run_time, job_container.run_frequency, now)
                && job.is_ready()
            {
                let name_ref = job.name();
                log::info!("Executing job \"{}\"", name_ref);

                job_container.last_run_time = now;
                job_names.push(name_ref);
                job_futures.push(job.execute());
            }
        }

        let job_results = future::join_all(job_futures).await;

        for (name, result) in job_names.iter().zip(job_results) {
            if let Err(e) = result {
                log::error!("Job \"{}\" failed: {}", name, e);
            } else {
                log::info!("Job \"{}\" finished successfully", name);
            }
        }

        let recording_results = future::join_all(
            job_names
                .iter()
                .map(|name| self.job_registry_dao.set_job_last_run_timestamp(name, now)),
        )
        .await;

        for result in recording_results {
            if let Err(e) = result {
                log::error!("Error recording job run: {}", e);
            }
        }

        log::debug!("Job runner pass took {:?}", Instant::now() - before);
    }
}

fn is_due(last_run_time: SystemTime, run_frequency: Duration, now: SystemTime) -> bool {
    let time_elapsed_since_last_run = now
        .duration_since(last_run_time)
        .unwrap_or(Duration::from_nanos(0));

    time_elapsed_since_last_run >= run_frequency
}
