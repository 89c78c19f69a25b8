//! Activation options.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default upper bound on nested activations.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Tunables for the [`FactoryActivator`].
///
/// With the `config` feature enabled the options can be loaded from any
/// serde format; missing fields fall back to their defaults.
///
/// # Examples
///
/// ```rust
/// use scoped_di::ActivationOptions;
///
/// let options = ActivationOptions::default();
/// assert!(options.detect_cycles);
/// assert_eq!(options.max_depth, scoped_di::options::DEFAULT_MAX_DEPTH);
/// ```
///
/// [`FactoryActivator`]: crate::FactoryActivator
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ActivationOptions {
    /// Maximum number of nested activations on one thread
    pub max_depth: usize,
    /// Fail with `Circular` when a concrete type re-enters its own activation
    pub detect_cycles: bool,
}

impl Default for ActivationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            detect_cycles: true,
        }
    }
}
