use voxgate_audio::TrimConfig;
use voxgate_mfcc::MfccConfig;

use crate::matcher::Metric;

/// Default distance threshold for the identified decision.
///
/// Requires calibration against real enrollment data for a deployment;
/// this value is a starting point, not a derived constant.
pub const DEFAULT_THRESHOLD: f32 = 50.0;

/// Pipeline configuration, constructed once per process and passed by
/// argument; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Distance below which an attempt is identified (strict less-than;
    /// default: [`DEFAULT_THRESHOLD`]).
    pub threshold: f32,
    /// Distance metric (default: Euclidean).
    pub metric: Metric,
    /// Silence trimming parameters.
    pub trim: TrimConfig,
    /// Feature extraction parameters.
    pub mfcc: MfccConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metric: Metric::default(),
            trim: TrimConfig::default(),
            mfcc: MfccConfig::default(),
        }
    }
}
