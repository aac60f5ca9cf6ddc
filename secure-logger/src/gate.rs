use crate::environment::EnvironmentPolicy;
use crate::severity::Severity;

/// True when `level` ranks at or above the policy minimum.
#[inline]
pub fn should_emit(level: Severity, policy: &EnvironmentPolicy) -> bool {
    passes(level, policy.min_severity)
}

#[inline]
pub fn passes(level: Severity, minimum: Severity) -> bool {
    level.rank() >= minimum.rank()
}
