use serde::{Deserialize, Serialize};

/// Parameters handed to a [`TextRecognizer`](super::TextRecognizer).
///
/// `psm` and `oem` are engine-specific integers passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionParams {
    /// Language code, `+`-joined for several (e.g. `"eng+deu"`).
    pub language: String,
    /// Page segmentation mode.
    pub psm: i32,
    /// Engine mode.
    pub oem: i32,
}

impl Default for RecognitionParams {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: 6,
            oem: 3,
        }
    }
}

/// Text recognized for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
    pub language: String,
}
