use serde::{Deserialize, Serialize};

/// Closed set of methods the consensus engine (C7) implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMethod {
    /// Median of numeric values, falling back to `MajorityVote` if none are numeric.
    #[default]
    Median,
    /// Provider-weight-weighted average, falling back to `MajorityVote` if none are numeric.
    WeightedAverage,
    /// Canonical-serialization majority vote; the only method that handles non-numeric values.
    MajorityVote,
    /// Response-confidence-weighted average, falling back to `MajorityVote` if none are numeric.
    ConfidenceWeighted,
}

impl ConsensusMethod {
    /// The wire token for this method, per the public API's consensus-method tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Median => "median",
            Self::WeightedAverage => "weighted_average",
            Self::MajorityVote => "majority_vote",
            Self::ConfidenceWeighted => "confidence_weighted",
        }
    }

    /// Parse a wire token into a method. Unknown tokens are the caller's
    /// responsibility to reject as `UnsupportedMethod`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "median" => Some(Self::Median),
            "weighted_average" => Some(Self::WeightedAverage),
            "majority_vote" => Some(Self::MajorityVote),
            "confidence_weighted" => Some(Self::ConfidenceWeighted),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConsensusMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
