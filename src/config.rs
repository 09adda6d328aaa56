//! Construction parameters shared by both table families.

use thiserror::Error;

/// Rejected construction arguments.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("illegal max load factor {0}: must be a finite number greater than zero")]
    IllegalLoadFactor(f64),
    #[error("max load factor {0} is too high for open addressing: it must stay below 1 so an empty slot always ends a probe")]
    LoadFactorTooHigh(f64),
}

/// Requested capacity and load factor for a new table.
///
/// The capacity is a lower bound: each table raises it to its own default
/// minimum, and open addressing further adjusts it to suit the probing
/// strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    pub capacity: usize,
    pub max_load_factor: f64,
}

impl TableConfig {
    pub const fn new(capacity: usize, max_load_factor: f64) -> Self {
        Self {
            capacity,
            max_load_factor,
        }
    }

    pub const fn with_capacity(self, capacity: usize) -> Self {
        Self { capacity, ..self }
    }

    pub const fn with_max_load_factor(self, max_load_factor: f64) -> Self {
        Self {
            max_load_factor,
            ..self
        }
    }

    /// Checks the load factor for a chained table: any finite positive value.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let lf = self.max_load_factor;
        if !lf.is_finite() || lf <= 0.0 {
            return Err(ConfigError::IllegalLoadFactor(lf));
        }
        Ok(())
    }

    /// Checks the load factor for an open-addressing table, which must
    /// additionally keep at least one slot empty.
    pub(crate) fn validate_open(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.max_load_factor >= 1.0 {
            return Err(ConfigError::LoadFactorTooHigh(self.max_load_factor));
        }
        Ok(())
    }
}

/// Number of used slots (or entries) at which a table of `capacity` grows.
#[inline]
pub(crate) fn threshold(capacity: usize, max_load_factor: f64) -> usize {
    (capacity as f64 * max_load_factor) as usize
}
