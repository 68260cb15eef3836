//! Benchmark profiles for the Tally scoring core.
//!
//! - [`reference_config`]: dose scoring over 100 regions and 8 media
//!   plus range rejection, the shape of a typical depth-dose run
//! - [`stress_config`]: the same observers over 10K regions
//! - [`reference_session`]: a session built from a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tally_engine::{ScoringSession, SessionConfig, SessionError};
use tally_observer::{ObserverDecl, ObserverFactory};

/// Dose over `regions` regions and 8 media, range rejection over the
/// first half of the regions.
fn profile(regions: i64) -> SessionConfig {
    SessionConfig::new()
        .with_observer(
            ObserverDecl::new("dose", "dose_scoring")
                .with("region_count", regions)
                .with("media", 8i64),
        )
        .with_observer(
            ObserverDecl::new("rr", "range_rejection")
                .with("e_max", 0.1)
                .with("regions", (0..regions / 2).collect::<Vec<i64>>()),
        )
}

/// 100 regions, 8 media.
pub fn reference_config() -> SessionConfig {
    profile(100)
}

/// 10K regions, 8 media.
pub fn stress_config() -> SessionConfig {
    profile(10_000)
}

/// A session built from `config` with the built-in observer kinds.
pub fn reference_session(config: &SessionConfig) -> Result<ScoringSession, SessionError> {
    ScoringSession::from_config(config, &ObserverFactory::with_builtins())
}
