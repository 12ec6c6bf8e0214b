//! Per-provider circuit breaker.
//!
//! ```text
//!            failures >= threshold
//!   CLOSED ─────────────────────────► OPEN
//!     ▲                                │
//!     │ trial succeeds                 │ first consult after reset_timeout
//!     │                                ▼
//!     └──────────────────────────── HALF_OPEN ──► OPEN (trial fails,
//!                                                      cooldown restarts)
//! ```
//!
//! The OPEN → HALF_OPEN move happens when the breaker is consulted, not on
//! a timer. While HALF_OPEN exactly one trial attempt is admitted; further
//! callers are turned away until that trial reports back or is abandoned.
//!
//! A trial handed out through a [`BreakerPermit`] settles through that
//! permit only; direct `report_*` calls while HALF_OPEN are late reports
//! and are ignored. A trial taken with [`CircuitBreaker::admit`] has no
//! permit, so the next direct report settles it. If nothing reports within
//! `reset_timeout`, the trial is presumed lost and the slot is reopened.
//!
//! Time is read through `tokio::time::Instant` so tests can drive the
//! cooldown with a paused clock.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::telemetry;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Admitting every request.
    Closed,
    /// Rejecting every request until the cooldown elapses.
    Open,
    /// Admitting a single trial request.
    HalfOpen,
}

impl BreakerState {
    fn label(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds for a [`CircuitBreaker`].
///
/// ```rust
/// # use bifrost::BreakerConfig;
/// # use std::time::Duration;
/// let config = BreakerConfig::new()
///     .failure_threshold(3)
///     .reset_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit. Default: 5.
    pub failure_threshold: u32,
    /// Cooldown before a trial request is admitted. Default: 60s.
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

impl BreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub opened_at: Option<Instant>,
}

/// Holder of the HALF_OPEN trial slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trial {
    /// Settled by a [`BreakerPermit`].
    Permit,
    /// Taken through [`CircuitBreaker::admit`]; settled by the next direct
    /// report, or released once `reset_timeout` passes without one.
    Direct { since: Instant },
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial: Option<Trial>,
}

impl Inner {
    /// Whether a direct report would settle the HALF_OPEN trial.
    fn holds_direct_trial(&self) -> bool {
        self.state == BreakerState::HalfOpen && matches!(self.trial, Some(Trial::Direct { .. }))
    }
}

/// Health gate for one provider.
///
/// All transitions happen under one lock, so concurrent reports cannot race
/// past the threshold check or open on a stale count.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial: None,
            }),
        }
    }

    /// Provider this breaker guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Whether a request may be sent to the provider now.
    ///
    /// Must be checked before every attempt. When this admits the HALF_OPEN
    /// trial, the caller owes exactly one [`report_success`](Self::report_success)
    /// or [`report_failure`](Self::report_failure).
    pub fn admit(&self) -> bool {
        self.take(Trial::Direct {
            since: Instant::now(),
        })
        .is_some()
    }

    /// Record a successful attempt.
    ///
    /// While HALF_OPEN this only counts if the trial was taken with
    /// [`admit`](Self::admit).
    pub fn report_success(&self) {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        let trial = inner.holds_direct_trial();
        self.on_success(&mut inner, trial);
    }

    /// Record a failed attempt.
    ///
    /// While HALF_OPEN this only counts if the trial was taken with
    /// [`admit`](Self::admit).
    pub fn report_failure(&self) {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        let trial = inner.holds_direct_trial();
        self.on_failure(&mut inner, trial);
    }

    /// Admit a request and hand back a permit that settles it.
    ///
    /// Dropping the permit without settling (e.g. the request future was
    /// cancelled) records nothing; if it held the HALF_OPEN trial slot, the
    /// slot is released for the next caller.
    pub fn acquire(&self) -> Option<BreakerPermit<'_>> {
        self.take(Trial::Permit)
            .map(|trial| BreakerPermit::new(self, trial))
    }

    /// Current state, applying the lazy OPEN → HALF_OPEN move if due.
    pub fn state(&self) -> BreakerState {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        inner.state
    }

    /// Whether the breaker is not OPEN. Does not take the trial slot.
    pub fn is_available(&self) -> bool {
        self.state() != BreakerState::Open
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            opened_at: inner.opened_at,
        }
    }

    // ========================================================================
    // Transitions (caller holds the lock)
    // ========================================================================

    /// Admission check shared by `admit` and `acquire`. Returns whether the
    /// admission is the HALF_OPEN trial, recording `holder` if it is.
    fn take(&self, holder: Trial) -> Option<bool> {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        match inner.state {
            BreakerState::Closed => Some(false),
            BreakerState::Open => None,
            BreakerState::HalfOpen if inner.trial.is_some() => None,
            BreakerState::HalfOpen => {
                inner.trial = Some(holder);
                Some(true)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner is plain data with no cross-field invariant a panic could break.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh(&self, inner: &mut Inner) {
        match inner.state {
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .is_none_or(|at| at.elapsed() >= self.config.reset_timeout);
                if cooled {
                    inner.trial = None;
                    self.transition(inner, BreakerState::HalfOpen);
                }
            }
            BreakerState::HalfOpen => {
                let lapsed = match inner.trial {
                    Some(Trial::Direct { since }) => since.elapsed() >= self.config.reset_timeout,
                    _ => false,
                };
                if lapsed {
                    debug!(provider = %self.name, "unreported trial released");
                    inner.trial = None;
                }
            }
            BreakerState::Closed => {}
        }
    }

    fn on_success(&self, inner: &mut Inner, trial: bool) {
        match inner.state {
            BreakerState::Closed => inner.consecutive_failures = 0,
            BreakerState::HalfOpen if trial => {
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.trial = None;
                self.transition(inner, BreakerState::Closed);
            }
            // Late report from a request admitted before the circuit opened.
            BreakerState::HalfOpen | BreakerState::Open => {}
        }
    }

    fn on_failure(&self, inner: &mut Inner, trial: bool) {
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.config.failure_threshold.max(1) {
                    inner.opened_at = Some(Instant::now());
                    self.transition(inner, BreakerState::Open);
                }
            }
            BreakerState::HalfOpen if trial => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                inner.opened_at = Some(Instant::now());
                inner.trial = None;
                self.transition(inner, BreakerState::Open);
            }
            BreakerState::HalfOpen | BreakerState::Open => {}
        }
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        if inner.state == BreakerState::HalfOpen && inner.trial == Some(Trial::Permit) {
            inner.trial = None;
        }
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState) {
        let from = inner.state;
        inner.state = to;
        match to {
            BreakerState::Open => warn!(
                provider = %self.name,
                %from,
                consecutive_failures = inner.consecutive_failures,
                cooldown_secs = self.config.reset_timeout.as_secs_f64(),
                "circuit opened"
            ),
            BreakerState::HalfOpen => {
                info!(provider = %self.name, "circuit half-open, admitting trial request")
            }
            BreakerState::Closed => info!(provider = %self.name, "circuit closed"),
        }
        metrics::counter!(telemetry::BREAKER_TRANSITIONS_TOTAL,
            "provider" => self.name.clone(),
            "state" => to.label(),
        )
        .increment(1);
    }
}

/// Admission handed out by [`CircuitBreaker::acquire`].
///
/// Settle with [`succeed`](Self::succeed) or [`fail`](Self::fail). A permit
/// dropped unsettled counts as neither.
#[must_use = "an unsettled permit records nothing"]
#[derive(Debug)]
pub struct BreakerPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> BreakerPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    /// Whether this permit is the HALF_OPEN trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn succeed(mut self) {
        self.settled = true;
        let mut inner = self.breaker.lock();
        self.breaker.on_success(&mut inner, self.trial);
    }

    pub fn fail(mut self) {
        self.settled = true;
        let mut inner = self.breaker.lock();
        self.breaker.on_failure(&mut inner, self.trial);
    }
}

impl Drop for BreakerPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, reset_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            BreakerConfig::new()
                .failure_threshold(threshold)
                .reset_timeout(Duration::from_secs(reset_secs)),
        )
    }

    #[test]
    fn config_defaults() {
        let config = BreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.reset_timeout, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold() {
        let b = breaker(5, 60);
        for _ in 0..5 {
            assert!(b.admit());
            b.report_failure();
        }
        assert!(!b.admit());
        assert_eq!(b.state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_consecutive_count() {
        let b = breaker(5, 60);
        for _ in 0..4 {
            b.report_failure();
        }
        b.report_success();
        assert_eq!(b.snapshot().consecutive_failures, 0);
        for _ in 0..4 {
            b.report_failure();
        }
        assert!(b.admit());
        assert_eq!(b.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_open_until_cooldown() {
        let b = breaker(1, 60);
        b.report_failure();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!b.admit());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(b.state(), BreakerState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_admits_single_trial() {
        let b = breaker(1, 10);
        b.report_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(b.admit());
        assert!(!b.admit(), "only one trial while half-open");
    }

    #[tokio::test(start_paused = true)]
    async fn trial_success_closes() {
        let b = breaker(2, 10);
        b.report_failure();
        b.report_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(b.admit());
        b.report_success();
        let snap = b.snapshot();
        assert_eq!(snap.state, BreakerState::Closed);
        assert_eq!(snap.consecutive_failures, 0);
        assert!(snap.opened_at.is_none());
        assert!(b.admit());
    }

    #[tokio::test(start_paused = true)]
    async fn trial_failure_restarts_cooldown() {
        let b = breaker(1, 10);
        b.report_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(b.admit());
        b.report_failure();
        assert_eq!(b.state(), BreakerState::Open);

        // Cooldown counts from the trial failure, not the original opening.
        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!b.admit());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(b.admit());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_trial_permit_releases_slot() {
        let b = breaker(1, 10);
        b.report_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        let permit = b.acquire().expect("trial admitted");
        assert!(permit.is_trial());
        assert!(b.acquire().is_none());
        drop(permit);

        assert_eq!(b.state(), BreakerState::HalfOpen);
        assert_eq!(b.snapshot().consecutive_failures, 1);
        assert!(b.acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_closed_permit_records_nothing() {
        let b = breaker(1, 10);
        let permit = b.acquire().expect("closed admits");
        drop(permit);
        assert_eq!(b.state(), BreakerState::Closed);
        assert_eq!(b.snapshot().consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_report_after_open_is_ignored() {
        let b = breaker(1, 10);
        let early = b.acquire().expect("closed admits");
        b.report_failure();
        assert_eq!(b.state(), BreakerState::Open);

        early.succeed();
        assert_eq!(b.state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn is_available_does_not_consume_trial() {
        let b = breaker(1, 10);
        b.report_failure();
        assert!(!b.is_available());
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(b.is_available());
        assert!(b.is_available());
        assert!(b.admit());
    }

    #[tokio::test(start_paused = true)]
    async fn direct_report_cannot_settle_permit_trial() {
        let b = breaker(1, 10);
        b.report_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        let trial = b.acquire().expect("trial admitted");
        b.report_success();
        assert_eq!(b.state(), BreakerState::HalfOpen);

        trial.fail();
        assert_eq!(b.state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_report_without_trial_is_ignored() {
        let b = breaker(1, 10);
        b.report_failure();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(b.state(), BreakerState::HalfOpen);

        b.report_success();
        b.report_failure();
        assert_eq!(b.state(), BreakerState::HalfOpen);
        assert_eq!(b.snapshot().consecutive_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreported_admitted_trial_lapses() {
        let b = breaker(1, 10);
        b.report_failure();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(b.admit());
        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!b.admit());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(b.admit(), "slot reopens once the trial goes unreported");
        b.report_success();
        assert_eq!(b.state(), BreakerState::Closed);
    }
}
