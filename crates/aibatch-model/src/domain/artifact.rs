use std::fmt;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What an uploaded bucket object is used for.
///
/// Every uploaded object carries its kind explicitly, so consumers never have
/// to inspect the declared resource to tell model files from input data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// File of the model directory (weights, schemas, variables).
    ModelArtifact,
    /// File consumed by the batch prediction job.
    InputData,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::ModelArtifact => "model-artifact",
            ArtifactKind::InputData => "input-data",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ArtifactKind;

    #[test]
    fn serializes_as_kebab_case() {
        let json = serde_json::to_string(&ArtifactKind::ModelArtifact).unwrap();
        assert_eq!(json, "\"model-artifact\"");

        let back: ArtifactKind = serde_json::from_str("\"input-data\"").unwrap();
        assert_eq!(back, ArtifactKind::InputData);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(ArtifactKind::InputData.to_string(), "input-data");
    }
}
