//! Resource flags for the analysis tool command line.

use crate::settings::ActionSettings;
use std::num::IntErrorKind;
use sysinfo::System;
use thiserror::Error;

/// Memory left for the runner and the rest of the job when the RAM input is empty.
pub const RESERVED_MEMORY_MB: u64 = 256;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlagError {
    #[error("Invalid RAM setting \"{0}\", specified.")]
    InvalidRam(String),

    #[error("Invalid threads setting \"{0}\", specified.")]
    InvalidThreads(String),
}

/// Totals of the machine the tool will run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostResources {
    pub total_memory_mb: u64,
    pub logical_cores: usize,
}

impl HostResources {
    /// Inspect the current machine.
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_memory();

        Self {
            total_memory_mb: system.total_memory() / (1024 * 1024),
            logical_cores: num_cpus::get(),
        }
    }
}

/// Compute the `--ram` flag.
///
/// An empty input uses all memory except [`RESERVED_MEMORY_MB`]. Fractional
/// values are rounded down.
///
/// # Errors
/// [`FlagError::InvalidRam`] when the input is not a number or not positive,
/// or when the host has too little memory to honour the reservation.
pub fn memory_flag(input: &str, host: &HostResources) -> Result<String, FlagError> {
    let input = input.trim();
    let megabytes = if input.is_empty() {
        host.total_memory_mb as f64 - RESERVED_MEMORY_MB as f64
    } else {
        input
            .parse::<f64>()
            .map_err(|_| FlagError::InvalidRam(input.to_string()))?
    };

    if !megabytes.is_finite() || megabytes <= 0.0 {
        return Err(FlagError::InvalidRam(input.to_string()));
    }

    Ok(format!("--ram={}", megabytes.floor() as u64))
}

/// Compute the `--threads` flag.
///
/// An empty input uses every logical core. `0` is passed through, positive
/// values are capped at the core count and negative values ("leave N cores
/// free") at its negation.
///
/// # Errors
/// [`FlagError::InvalidThreads`] when the input is not an integer.
pub fn threads_flag(input: &str, host: &HostResources) -> Result<String, FlagError> {
    let input = input.trim();
    let max_threads = host.logical_cores as i64;

    if input.is_empty() {
        return Ok(format!("--threads={}", max_threads));
    }

    // Integers too large for i64 are still integers and get clamped below
    let mut threads = match input.parse::<i64>() {
        Ok(threads) => threads,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => i64::MIN,
        Err(_) => return Err(FlagError::InvalidThreads(input.to_string())),
    };

    if threads > max_threads {
        tracing::info!(
            "Clamping desired number of threads ({}) to max available ({}).",
            threads,
            max_threads
        );
        threads = max_threads;
    }

    let min_threads = -max_threads;
    if threads < min_threads {
        tracing::info!(
            "Clamping desired number of free threads ({}) to max available ({}).",
            threads,
            min_threads
        );
        threads = min_threads;
    }

    Ok(format!("--threads={}", threads))
}

/// `--ram` flag for this machine from the `ram` input.
pub fn get_memory_flag(settings: &ActionSettings) -> Result<String, FlagError> {
    memory_flag(&settings.ram, &HostResources::detect())
}

/// `--threads` flag for this machine from the `threads` input.
pub fn get_threads_flag(settings: &ActionSettings) -> Result<String, FlagError> {
    threads_flag(&settings.threads, &HostResources::detect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOST: HostResources = HostResources {
        total_memory_mb: 8192,
        logical_cores: 4,
    };

    #[test]
    fn test_memory_flag_default_reserves_memory() {
        assert_eq!(memory_flag("", &HOST).unwrap(), "--ram=7936");
        assert_eq!(memory_flag("  ", &HOST).unwrap(), "--ram=7936");
    }

    #[test]
    fn test_memory_flag_explicit() {
        assert_eq!(memory_flag("512", &HOST).unwrap(), "--ram=512");
        assert_eq!(memory_flag("1024.9", &HOST).unwrap(), "--ram=1024");
    }

    #[test]
    fn test_memory_flag_invalid() {
        for input in ["-1", "0", "abc", "NaN", "inf"] {
            assert_eq!(
                memory_flag(input, &HOST),
                Err(FlagError::InvalidRam(input.to_string())),
                "input {input}"
            );
        }
    }

    #[test]
    fn test_memory_flag_tiny_host() {
        let host = HostResources {
            total_memory_mb: 200,
            logical_cores: 1,
        };
        assert!(memory_flag("", &host).is_err());
    }

    #[test]
    fn test_threads_flag() {
        assert_eq!(threads_flag("", &HOST).unwrap(), "--threads=4");
        assert_eq!(threads_flag("0", &HOST).unwrap(), "--threads=0");
        assert_eq!(threads_flag("1", &HOST).unwrap(), "--threads=1");
        assert_eq!(threads_flag("-2", &HOST).unwrap(), "--threads=-2");
        assert_eq!(threads_flag("12", &HOST).unwrap(), "--threads=4");
        assert_eq!(threads_flag("-12", &HOST).unwrap(), "--threads=-4");
        assert_eq!(threads_flag("+3", &HOST).unwrap(), "--threads=3");
    }

    #[test]
    fn test_threads_flag_beyond_i64_is_clamped() {
        assert_eq!(
            threads_flag("99999999999999999999", &HOST).unwrap(),
            "--threads=4"
        );
        assert_eq!(
            threads_flag("-99999999999999999999", &HOST).unwrap(),
            "--threads=-4"
        );
    }

    #[test]
    fn test_threads_flag_invalid() {
        for input in ["many", "1.5", "0x4"] {
            assert_eq!(
                threads_flag(input, &HOST),
                Err(FlagError::InvalidThreads(input.to_string()))
            );
        }
    }

    #[test]
    fn test_detect_reports_at_least_one_core() {
        assert!(HostResources::detect().logical_cores >= 1);
    }

    proptest! {
        #[test]
        fn threads_always_within_core_range(threads in any::<i32>(), cores in 1usize..256) {
            let host = HostResources { total_memory_mb: 1024, logical_cores: cores };
            let flag = threads_flag(&threads.to_string(), &host).unwrap();
            let value: i64 = flag.trim_start_matches("--threads=").parse().unwrap();
            prop_assert!(value.abs() <= cores as i64);
        }

        #[test]
        fn oversized_threads_clamp_by_sign(digits in "[1-9][0-9]{19,30}", negative: bool, cores in 1usize..256) {
            let host = HostResources { total_memory_mb: 1024, logical_cores: cores };
            let input = if negative { format!("-{digits}") } else { digits };
            let expected = if negative { -(cores as i64) } else { cores as i64 };
            prop_assert_eq!(threads_flag(&input, &host).unwrap(), format!("--threads={}", expected));
        }
    }
}
