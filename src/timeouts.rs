use std::time::Duration;

use tokio::time::Instant;

use crate::value::{ResourceData, Value};

/// Default per-phase timeout when the user sets none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

// ─── Phases ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Read,
    Update,
    Delete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Create => "create",
            Phase::Read => "read",
            Phase::Update => "update",
            Phase::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── Timeouts Block ─────────────────────────────────────────────────────────

/// The per-resource `timeouts` nested block: phase → duration overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeouts {
    pub create: Option<Duration>,
    pub read: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
}

impl Timeouts {
    /// Extract the block from resource data; missing or malformed entries
    /// fall back to the default at use time.
    pub fn from_data(data: &ResourceData) -> Self {
        let mut timeouts = Timeouts::default();
        if let Value::Map(entries) = data.get("timeouts") {
            for (phase, value) in &entries {
                let parsed = value.as_str().and_then(parse_duration);
                match phase.as_str() {
                    "create" => timeouts.create = parsed,
                    "read" => timeouts.read = parsed,
                    "update" => timeouts.update = parsed,
                    "delete" => timeouts.delete = parsed,
                    _ => {}
                }
            }
        }
        timeouts
    }

    /// The effective deadline duration for a phase.
    pub fn for_phase(&self, phase: Phase) -> Duration {
        let configured = match phase {
            Phase::Create => self.create,
            Phase::Read => self.read,
            Phase::Update => self.update,
            Phase::Delete => self.delete,
        };
        configured.unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Parse a duration string of the form "30s", "10m", "1h" or a combination
/// ("1h30m"). Bare digits are seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let mut total = Duration::ZERO;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let n: u64 = digits.parse().ok()?;
        digits.clear();
        total += match c {
            's' => Duration::from_secs(n),
            'm' => Duration::from_secs(n * 60),
            'h' => Duration::from_secs(n * 3600),
            _ => return None,
        };
    }
    if !digits.is_empty() {
        total += Duration::from_secs(digits.parse().ok()?);
    }
    if total.is_zero() {
        None
    } else {
        Some(total)
    }
}

// ─── Operation Context ──────────────────────────────────────────────────────

/// Deadline exceeded for a lifecycle phase.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("{phase} timed out after {}s", timeout.as_secs())]
pub struct TimeoutError {
    pub phase: Phase,
    pub timeout: Duration,
}

/// Deadline scope for one handler invocation. Cancellation is cooperative:
/// handlers call `check` before each SDK call, inside poll loops, and
/// between phases of composite operations.
#[derive(Debug, Clone)]
pub struct OpContext {
    phase: Phase,
    timeout: Duration,
    deadline: Instant,
}

impl OpContext {
    pub fn new(phase: Phase, timeouts: &Timeouts) -> Self {
        let timeout = timeouts.for_phase(phase);
        Self {
            phase,
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn with_timeout(phase: Phase, timeout: Duration) -> Self {
        Self {
            phase,
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    /// Deadline for one phase, derived from the resource's `timeouts` block.
    pub fn for_resource(phase: Phase, data: &ResourceData) -> Self {
        Self::new(phase, &Timeouts::from_data(data))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Err when the phase deadline has passed; no further remote calls may
    /// be issued after this returns an error.
    pub fn check(&self) -> Result<(), TimeoutError> {
        if Instant::now() >= self.deadline {
            Err(TimeoutError {
                phase: self.phase,
                timeout: self.timeout,
            })
        } else {
            Ok(())
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
