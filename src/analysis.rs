// Analysis results returned by the remote service. Two incompatible shapes
// exist across deployments; the configured `ResponseShape` decides which one
// incoming JSON is validated against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Boolean-verdict response: is the product suitable for this person.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub healthy: bool,
    pub reasoning: String,
    pub recommendation: String,
}

/// Product details attached to a scored response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    pub name: String,
    pub brands: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutri_score: Option<String>,
    pub barcode: String,
}

/// Scored response: a 1-5 suitability score plus the scanned product.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScoredAnalysis {
    pub score: u8,
    pub reasoning: String,
    pub product_info: ProductInfo,
}

impl ScoredAnalysis {
    pub const MIN_SCORE: u8 = 1;
    pub const MAX_SCORE: u8 = 5;
}

/// A validated server verdict in whichever shape the deployment uses.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnalysisResult {
    Verdict(Verdict),
    Scored(ScoredAnalysis),
}

impl AnalysisResult {
    /// Server explanation, present in both shapes.
    pub fn reasoning(&self) -> &str {
        match self {
            AnalysisResult::Verdict(v) => &v.reasoning,
            AnalysisResult::Scored(s) => &s.reasoning,
        }
    }

    /// The boolean verdict, if this deployment returns one.
    pub fn as_verdict(&self) -> Option<&Verdict> {
        match self {
            AnalysisResult::Verdict(v) => Some(v),
            AnalysisResult::Scored(_) => None,
        }
    }

    /// The scored analysis, if this deployment returns one.
    pub fn as_scored(&self) -> Option<&ScoredAnalysis> {
        match self {
            AnalysisResult::Scored(s) => Some(s),
            AnalysisResult::Verdict(_) => None,
        }
    }
}

/// Response shape expected from a deployment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `{healthy, reasoning, recommendation}`
    #[default]
    Verdict,
    /// `{score, reasoning, product_info}`
    Scored,
}

impl ResponseShape {
    /// Parse a response body strictly against this shape.
    ///
    /// Unknown extra fields are ignored; missing fields, wrong types and
    /// out-of-range scores are reported as an error string.
    pub fn parse(self, body: &[u8]) -> Result<AnalysisResult, String> {
        match self {
            ResponseShape::Verdict => serde_json::from_slice::<Verdict>(body)
                .map(AnalysisResult::Verdict)
                .map_err(|e| e.to_string()),
            ResponseShape::Scored => {
                let scored: ScoredAnalysis =
                    serde_json::from_slice(body).map_err(|e| e.to_string())?;
                if !(ScoredAnalysis::MIN_SCORE..=ScoredAnalysis::MAX_SCORE).contains(&scored.score)
                {
                    return Err(format!(
                        "score {} outside {}-{}",
                        scored.score,
                        ScoredAnalysis::MIN_SCORE,
                        ScoredAnalysis::MAX_SCORE
                    ));
                }
                Ok(AnalysisResult::Scored(scored))
            }
        }
    }
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseShape::Verdict => f.write_str("verdict"),
            ResponseShape::Scored => f.write_str("scored"),
        }
    }
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verdict" | "healthy" | "boolean" => Ok(ResponseShape::Verdict),
            "scored" | "score" => Ok(ResponseShape::Scored),
            other => Err(format!("unknown response shape '{}'", other)),
        }
    }
}
