use givewise_core::{CoreError, ErrorExt};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
    /// Consecutive failed operations before the circuit opens
    pub failure_threshold: u32,
    /// Time the circuit stays open before a trial request (in seconds)
    pub recovery_timeout_s: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            failure_threshold: 3,
            recovery_timeout_s: 60,
        }
    }
}

impl RetryConfig {
    /// Retry config for embedding requests with `max_retries` retries after the first attempt.
    pub fn embeddings(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries + 1,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitBreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Stops calling a provider that keeps failing so callers fall back immediately.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitBreakerState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    /// Start of the single request allowed through while half-open.
    trial_started: Option<Instant>,
    failure_threshold: u32,
    recovery_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            state: CircuitBreakerState::Closed,
            failure_count: 0,
            last_failure_time: None,
            trial_started: None,
            failure_threshold: config.failure_threshold.max(1),
            recovery_timeout: Duration::from_secs(config.recovery_timeout_s),
        }
    }

    /// Half-open admits one trial request. Others are refused until it
    /// reports back, or until it has been outstanding for a full recovery
    /// timeout (the caller may have been cancelled).
    pub fn allow_request(&mut self) -> bool {
        match self.state {
            CircuitBreakerState::Closed => true,
            CircuitBreakerState::HalfOpen => match self.trial_started {
                Some(started) if started.elapsed() < self.recovery_timeout => false,
                _ => {
                    debug!("Circuit breaker trial request went unanswered, allowing another");
                    self.trial_started = Some(Instant::now());
                    true
                }
            },
            CircuitBreakerState::Open => match self.last_failure_time {
                Some(last_failure) if last_failure.elapsed() >= self.recovery_timeout => {
                    debug!("Circuit breaker transitioning to half-open for recovery test");
                    self.state = CircuitBreakerState::HalfOpen;
                    self.trial_started = Some(Instant::now());
                    true
                }
                _ => false,
            },
        }
    }

    pub fn record_success(&mut self) {
        if self.state == CircuitBreakerState::HalfOpen {
            info!("Circuit breaker recovery successful, returning to closed state");
        }
        self.state = CircuitBreakerState::Closed;
        self.failure_count = 0;
        self.last_failure_time = None;
        self.trial_started = None;
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure_time = Some(Instant::now());
        self.trial_started = None;

        match self.state {
            CircuitBreakerState::Closed if self.failure_count >= self.failure_threshold => {
                warn!(
                    "Circuit breaker opening due to {} consecutive failures",
                    self.failure_count
                );
                self.state = CircuitBreakerState::Open;
            }
            CircuitBreakerState::HalfOpen => {
                warn!("Circuit breaker recovery failed, returning to open state");
                self.state = CircuitBreakerState::Open;
            }
            _ => {}
        }
    }

    pub fn state(&self) -> CircuitBreakerState {
        self.state
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let max_delay = Duration::from_millis(config.max_delay_ms);

    let multiplier = config.backoff_multiplier.powi(attempt as i32);
    let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
    let exponential_delay = Duration::from_millis(delay_ms.min(config.max_delay_ms));

    // Jitter keeps concurrent ranking requests from retrying in lockstep
    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);

    (exponential_delay + Duration::from_millis(jitter)).min(max_delay)
}

/// Runs provider calls with bounded retries behind a circuit breaker.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
    circuit_breaker: Arc<Mutex<CircuitBreaker>>,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        let circuit_breaker = Arc::new(Mutex::new(CircuitBreaker::new(&config)));
        Self {
            config,
            circuit_breaker,
        }
    }

    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        if !self.breaker().allow_request() {
            warn!(
                "Circuit breaker is open, blocking request for {}",
                operation_name
            );
            return Err(CoreError::Internal {
                message: format!("Circuit breaker is open for {}", operation_name),
            });
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    self.breaker().record_success();
                    if attempt > 0 {
                        info!("Operation {} succeeded after {} retries", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    let can_retry = attempt + 1 < max_attempts && error.is_retryable();
                    if !can_retry {
                        debug!(
                            "Giving up on {} after {} attempt(s): {}",
                            operation_name,
                            attempt + 1,
                            error
                        );
                        self.breaker().record_failure();
                        return Err(error);
                    }

                    let backoff = calculate_delay(attempt, &self.config);
                    let delay = match error.retry_after() {
                        Some(hint) => hint.max(backoff),
                        None => backoff,
                    }
                    .min(Duration::from_millis(self.config.max_delay_ms));

                    info!("Retrying {} in {:?} due to: {}", operation_name, delay, error);
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    pub fn circuit_breaker_state(&self) -> CircuitBreakerState {
        self.breaker().state()
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        // A panic while holding the lock leaves plain counters behind; keep using them.
        self.circuit_breaker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use givewise_core::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..Default::default()
        }
    }

    fn unavailable() -> CoreError {
        CoreError::Provider(ProviderError::ServiceUnavailable {
            provider: "openai".to_string(),
            status_code: 503,
        })
    }

    #[test]
    fn test_calculate_delay_respects_max() {
        let config = RetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 3000,
            jitter_factor: 0.5,
            ..Default::default()
        };

        assert!(calculate_delay(0, &config) >= Duration::from_millis(1000));
        assert!(calculate_delay(0, &config) <= Duration::from_millis(1500));
        assert_eq!(calculate_delay(5, &config), Duration::from_millis(3000));
    }

    #[test]
    fn test_embeddings_config_counts_first_attempt() {
        assert_eq!(RetryConfig::embeddings(2).max_attempts, 3);
        assert_eq!(RetryConfig::embeddings(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let executor = RetryExecutor::new(fast_config(3));
        let attempts = Arc::new(AtomicU32::new(0));

        let result = executor
            .execute("embed", || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(unavailable())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(executor.circuit_breaker_state(), CircuitBreakerState::Closed);
    }

    #[tokio::test]
    async fn test_no_retry_on_invalid_key() {
        let executor = RetryExecutor::new(fast_config(3));
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<i32, CoreError> = executor
            .execute("embed", || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(CoreError::Provider(ProviderError::InvalidApiKey {
                        provider: "openai".to_string(),
                    }))
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(CoreError::Provider(ProviderError::InvalidApiKey { .. }))
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_circuit_opens_after_repeated_failures() {
        let config = RetryConfig {
            failure_threshold: 2,
            ..fast_config(2)
        };
        let executor = RetryExecutor::new(config);

        for _ in 0..2 {
            let result: Result<i32, CoreError> =
                executor.execute("embed", || async { Err(unavailable()) }).await;
            assert!(result.is_err());
        }
        assert_eq!(executor.circuit_breaker_state(), CircuitBreakerState::Open);

        let blocked = executor.execute("embed", || async { Ok(1) }).await;
        assert!(blocked
            .unwrap_err()
            .to_string()
            .contains("Circuit breaker is open"));
    }

    fn open_breaker_past_recovery() -> CircuitBreaker {
        let config = RetryConfig {
            failure_threshold: 1,
            recovery_timeout_s: 1,
            ..Default::default()
        };
        let mut breaker = CircuitBreaker::new(&config);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitBreakerState::Open);
        assert!(!breaker.allow_request());

        breaker.last_failure_time = Instant::now().checked_sub(Duration::from_secs(2));
        breaker
    }

    #[test]
    fn test_half_open_admits_a_single_trial() {
        let mut breaker = open_breaker_past_recovery();

        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitBreakerState::HalfOpen);
        assert!(!breaker.allow_request());
        assert!(!breaker.allow_request());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert!(breaker.allow_request());
        assert!(breaker.allow_request());
    }

    #[test]
    fn test_failed_trial_reopens_the_circuit() {
        let mut breaker = open_breaker_past_recovery();

        assert!(breaker.allow_request());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitBreakerState::Open);
        assert!(!breaker.allow_request());
    }

    #[test]
    fn test_abandoned_trial_is_replaced_after_recovery_timeout() {
        let mut breaker = open_breaker_past_recovery();

        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());

        breaker.trial_started = Instant::now().checked_sub(Duration::from_secs(2));
        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());
    }
}
