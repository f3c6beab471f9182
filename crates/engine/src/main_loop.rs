//! Main loop / scheduler (spec §4.10-§4.11, C9): drives per-iteration
//! evaluation across all hosts, honors `min_run_every`, and detects
//! suspension (e.g. a laptop sleeping) between iterations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use health_core::{Expression, MetricQuery, Status};

use crate::dispatcher::log_process;
use crate::gate::evaluate_runnable;
use crate::host::Host;
use crate::repeat::emit_repeats;
use crate::silencer_policy::update_disabled_silenced;
use crate::state_machine::{derive_status, on_transition, value_to_status, ValueStatus};

pub fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

/// Detects a wall-clock jump relative to elapsed monotonic time between
/// samples (spec §4.10) — the signature of the process having been
/// suspended (e.g. laptop sleep, paused container) rather than just slow.
struct SuspensionDetector {
    last_realtime: Option<i64>,
    last_monotonic: Option<Instant>,
}

impl SuspensionDetector {
    fn new() -> Self {
        Self {
            last_realtime: None,
            last_monotonic: None,
        }
    }

    fn sample(&mut self, now_unix: i64) -> bool {
        let now_instant = Instant::now();
        let suspended = match (self.last_realtime, self.last_monotonic) {
            (Some(last_rt), Some(last_mono)) => {
                let realtime_delta = now_unix - last_rt;
                let monotonic_delta = now_instant.duration_since(last_mono).as_secs().max(1) as i64;
                realtime_delta > 2 * monotonic_delta
            }
            _ => false,
        };
        self.last_realtime = Some(now_unix);
        self.last_monotonic = Some(now_instant);
        suspended
    }
}

pub struct MainLoop {
    hosts: Vec<Arc<Host>>,
    query: Arc<dyn MetricQuery>,
    min_run_every: i64,
    hibernation_delay: i64,
    exit: Arc<AtomicBool>,
    detector: SuspensionDetector,
}

impl MainLoop {
    pub fn new(
        hosts: Vec<Arc<Host>>,
        query: Arc<dyn MetricQuery>,
        min_run_every: i64,
        hibernation_delay: i64,
        exit: Arc<AtomicBool>,
    ) -> Self {
        Self {
            hosts,
            query,
            min_run_every: min_run_every.max(1),
            hibernation_delay,
            exit,
            detector: SuspensionDetector::new(),
        }
    }

    /// Runs until the exit flag is set or a Ctrl-C signal arrives.
    pub async fn run(&mut self) {
        while !self.exit.load(Ordering::Acquire) {
            let now = unix_now();
            let next_run = self.run_iteration(now).await;

            if self.exit.load(Ordering::Acquire) {
                break;
            }

            let sleep_secs = (next_run - unix_now()).max(0) as u64;
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(sleep_secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received");
                    self.exit.store(true, Ordering::Release);
                }
            }
        }
        tracing::info!("main loop exiting");
    }

    /// One pass over every host (spec §4.11). Returns the next wall-clock
    /// timestamp the loop should wake up at.
    pub async fn run_iteration(&mut self, now: i64) -> i64 {
        let mut next_run = now + self.min_run_every;

        if self.detector.sample(now) {
            tracing::warn!(hibernation_delay = self.hibernation_delay, "suspension detected, postponing host evaluation");
            for host in &self.hosts {
                host.postpone_until(now + self.hibernation_delay);
            }
        }

        for host in self.hosts.clone() {
            if self.exit.load(Ordering::Acquire) {
                break;
            }
            if !host.is_evaluation_due(now) {
                continue;
            }

            let host_next_run = run_host_iteration(Arc::clone(&host), Arc::clone(&self.query), now).await;
            next_run = next_run.min(host_next_run);

            emit_repeats(&host, now).await;

            if self.exit.load(Ordering::Acquire) {
                break;
            }
            log_process(&host, now).await;
        }

        next_run
    }
}

async fn run_host_iteration(host: Arc<Host>, query: Arc<dyn MetricQuery>, now: i64) -> i64 {
    let result = tokio::task::spawn_blocking(move || evaluate_host_sync(&host, &*query, now)).await;
    match result {
        Ok(next_run) => next_run,
        Err(err) => {
            tracing::error!(error = %err, "host evaluation task panicked");
            now + 10
        }
    }
}

/// Pass A + Pass B (spec §4.11), run synchronously under `spawn_blocking`
/// since they hold the host's rule-set lock across multiple rule
/// evaluations and may call into a blocking metric store.
fn evaluate_host_sync(host: &Host, query: &dyn MetricQuery, now: i64) -> i64 {
    let mut next_run = i64::MAX;
    let any_runnable = pass_a(host, query, now, &mut next_run);
    if any_runnable {
        pass_b(host, now, &mut next_run);
    }
    next_run
}

fn pass_a(host: &Host, query: &dyn MetricQuery, now: i64, next_run: &mut i64) -> bool {
    let silencers = host.silencers.read().unwrap().clone();
    let mut rules = host.rules.write().unwrap();
    let mut any_runnable = false;

    for rule in rules.iter_mut() {
        if update_disabled_silenced(rule, &host.hostname, &silencers) {
            rule.flags.runnable = false;
            continue;
        }

        if !evaluate_runnable(rule, now, next_run, query) {
            rule.flags.runnable = false;
            continue;
        }

        rule.flags.runnable = true;
        any_runnable = true;
        rule.old_value = rule.value;

        if let Some(lookup) = rule.db_lookup.clone() {
            let chart = rule.chart.clone().unwrap_or_default();
            match query.query(&chart, &lookup.dimensions, 1, lookup.after, lookup.before, &lookup.group, &lookup.options) {
                Ok(result) if !result.value_is_null => {
                    rule.value = result.value;
                    rule.flags.db_error = false;
                    rule.flags.db_nan = false;
                }
                Ok(_) => {
                    rule.value = f64::NAN;
                    rule.flags.db_nan = true;
                    rule.flags.db_error = false;
                }
                Err(_) => {
                    rule.value = f64::NAN;
                    rule.flags.db_error = true;
                    rule.flags.db_nan = false;
                }
            }
        }

        if let Some(calc) = rule.calculation.as_mut() {
            match calc.evaluate() {
                Ok(()) => {
                    rule.value = calc.result();
                    rule.flags.calc_error = false;
                }
                Err(_) => {
                    rule.flags.calc_error = true;
                }
            }
        }
    }

    any_runnable
}

fn pass_b(host: &Host, now: i64, next_run: &mut i64) {
    let mut rules = host.rules.write().unwrap();

    for rule in rules.iter_mut() {
        if !rule.flags.runnable || rule.flags.disabled {
            continue;
        }

        let warn_status = eval_expr_status(&mut rule.warning, &mut rule.flags.warn_error);
        let crit_status = eval_expr_status(&mut rule.critical, &mut rule.flags.crit_error);

        let new_status = if rule.flags.db_error || rule.flags.calc_error {
            Status::Undefined
        } else {
            derive_status(warn_status, crit_status)
        };

        if let Some(event) = on_transition(rule, new_status, now) {
            host.event_log.append(event);
        }

        rule.last_updated = now;
        rule.next_update = now + rule.update_every;
        *next_run = (*next_run).min(rule.next_update);
    }
}

fn eval_expr_status(expr: &mut Option<Box<dyn Expression>>, error_flag: &mut bool) -> ValueStatus {
    match expr {
        None => ValueStatus::Undefined,
        Some(e) => match e.evaluate() {
            Ok(()) => {
                *error_flag = false;
                value_to_status(e.result())
            }
            Err(_) => {
                *error_flag = true;
                ValueStatus::Undefined
            }
        },
    }
}
