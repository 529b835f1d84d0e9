//! Capability gating for checks.
//!
//! An [`Activation`] is a list of independent boolean predicates combined with
//! logical AND. Hosts attach one to a check to turn it off on platforms or
//! versions where it cannot work, without the check knowing why.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A single availability condition.
pub type Predicate = Box<dyn Fn() -> bool + Send + Sync>;

/// Supplies a raw version string (e.g. "1.20.4-SNAPSHOT"), or `None` if the
/// component is absent.
pub type VersionSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

/// Conjunction of availability predicates with an optional description.
///
/// An activation with no conditions is always available.
#[derive(Default)]
pub struct Activation {
    conditions: Vec<Predicate>,
    neutral_description: Option<String>,
}

impl Activation {
    /// Creates an activation that is always available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a human-readable description of what is being gated.
    pub fn neutral_description(mut self, description: impl Into<String>) -> Self {
        self.neutral_description = Some(description.into());
        self
    }

    /// The description, if one was set.
    pub fn description(&self) -> Option<&str> {
        self.neutral_description.as_deref()
    }

    /// Adds an arbitrary predicate.
    pub fn condition(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.conditions.push(Box::new(predicate));
        self
    }

    /// Requires the version reported by `source` to be above `version`
    /// (or equal, with `allow_eq`).
    pub fn version_at_least(self, source: VersionSource, version: &str, allow_eq: bool) -> Self {
        let version = version.to_string();
        self.condition(move || {
            version_of(&source).is_some_and(|found| match compare_versions(&found, &version) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => allow_eq,
                _ => false,
            })
        })
    }

    /// Requires the version reported by `source` to be below `version`
    /// (or equal, with `allow_eq`).
    pub fn version_at_most(self, source: VersionSource, version: &str, allow_eq: bool) -> Self {
        let version = version.to_string();
        self.condition(move || {
            version_of(&source).is_some_and(|found| match compare_versions(&found, &version) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => allow_eq,
                _ => false,
            })
        })
    }

    /// Requires the version reported by `source` to lie between `low` and
    /// `high`, each bound inclusive when its flag is set.
    pub fn version_between(
        self,
        source: VersionSource,
        low: &str,
        allow_eq_low: bool,
        high: &str,
        allow_eq_high: bool,
    ) -> Self {
        let (low, high) = (low.to_string(), high.to_string());
        self.condition(move || {
            version_of(&source).is_some_and(|found| {
                is_version_between(&found, &low, allow_eq_low, &high, allow_eq_high)
            })
        })
    }

    /// Returns `true` if every condition holds.
    pub fn is_available(&self) -> bool {
        self.conditions.iter().all(|condition| condition())
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation")
            .field("conditions", &self.conditions.len())
            .field("neutral_description", &self.neutral_description)
            .finish()
    }
}

fn version_of(source: &VersionSource) -> Option<String> {
    source().as_deref().and_then(guess_usable_version)
}

// ---------------------------------------------------------------------------
// Version strings
// ---------------------------------------------------------------------------

/// Extracts a dotted numeric version (at least `major.minor`) from a
/// free-form version string such as `"v1.20.4-SNAPSHOT"` or `"2.1-b34"`.
pub fn guess_usable_version(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    let start = lower.find(|c: char| c.is_ascii_digit())?;
    let collected: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let collected = collected.trim_end_matches('.');

    let parts: Vec<&str> = collected.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(collected.to_string())
}

fn parse_parts(version: &str) -> Option<Vec<u32>> {
    version
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect()
}

/// Compares two dotted numeric versions, padding the shorter one with zeros.
/// Returns `None` if either is not purely numeric.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let a = parse_parts(a)?;
    let b = parse_parts(b)?;
    let len = a.len().max(b.len());
    let at = |v: &[u32], i: usize| v.get(i).copied().unwrap_or(0);
    Some(
        (0..len)
            .map(|i| at(&a, i).cmp(&at(&b, i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal),
    )
}

/// Returns `true` if `version` lies between `low` and `high`.
pub fn is_version_between(
    version: &str,
    low: &str,
    allow_eq_low: bool,
    high: &str,
    allow_eq_high: bool,
) -> bool {
    let above = match compare_versions(version, low) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => allow_eq_low,
        _ => false,
    };
    let below = match compare_versions(version, high) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => allow_eq_high,
        _ => false,
    };
    above && below
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

    fn fixed(version: &'static str) -> VersionSource {
        Arc::new(move || Some(version.to_string()))
    }

    #[test]
    fn test_empty_activation_is_available() {
        assert!(Activation::new().is_available());
    }

    #[test]
    fn test_conditions_are_anded() {
        let flag = Arc::new(AtomicBool::new(true));
        let probe = Arc::clone(&flag);
        let activation = Activation::new()
            .neutral_description("visibility raycast")
            .condition(|| true)
            .condition(move || probe.load(AtomicOrdering::Relaxed));

        assert!(activation.is_available());
        flag.store(false, AtomicOrdering::Relaxed);
        assert!(!activation.is_available());
        assert_eq!(activation.description(), Some("visibility raycast"));
    }

    #[test]
    fn test_guess_usable_version() {
        assert_eq!(guess_usable_version("1.20.4"), Some("1.20.4".into()));
        assert_eq!(guess_usable_version("v3.16.1-SNAPSHOT"), Some("3.16.1".into()));
        assert_eq!(guess_usable_version("2.1-b34"), Some("2.1".into()));
        assert_eq!(guess_usable_version("build 7"), None);
        assert_eq!(guess_usable_version("dev"), None);
    }

    #[test]
    fn test_compare_versions_pads() {
        assert_eq!(compare_versions("1.20", "1.20.0"), Some(Ordering::Equal));
        assert_eq!(compare_versions("1.9", "1.10"), Some(Ordering::Less));
        assert_eq!(compare_versions("2.0", "1.99.9"), Some(Ordering::Greater));
        assert_eq!(compare_versions("1.x", "1.0"), None);
    }

    #[test]
    fn test_version_gates() {
        assert!(Activation::new().version_at_least(fixed("1.20.4"), "1.20", false).is_available());
        assert!(!Activation::new().version_at_least(fixed("1.20"), "1.20", false).is_available());
        assert!(Activation::new().version_at_least(fixed("1.20"), "1.20", true).is_available());
        assert!(Activation::new().version_at_most(fixed("1.8.8"), "1.9", false).is_available());
        assert!(
            Activation::new()
                .version_between(fixed("1.13.2"), "1.13", true, "1.14", false)
                .is_available()
        );
        assert!(
            !Activation::new()
                .version_between(fixed("1.14"), "1.13", true, "1.14", false)
                .is_available()
        );
    }

    #[test]
    fn test_missing_version_is_unavailable() {
        let absent: VersionSource = Arc::new(|| None);
        assert!(!Activation::new().version_at_least(absent, "1.0", true).is_available());
    }
}
