// Grounding sources - citations attached to a generation response

use serde::{Deserialize, Serialize};

/// A citation shown under the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// Web or maps payload inside a grounding chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// One entry of `groundingMetadata.groundingChunks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<SourceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<SourceInfo>,
}

impl GroundingChunk {
    /// Chunks without a URI are dropped; a missing title falls back to the URI.
    pub fn to_source(&self) -> Option<Source> {
        let info = self.maps.as_ref().or(self.web.as_ref())?;
        let uri = info.uri.as_deref()?.trim();
        if uri.is_empty() {
            return None;
        }
        let title = info
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(uri);
        Some(Source {
            uri: uri.to_string(),
            title: title.to_string(),
        })
    }
}

impl Source {
    /// Convert chunks to sources, dropping duplicates by URI.
    pub fn from_chunks(chunks: &[GroundingChunk]) -> Vec<Source> {
        let mut out: Vec<Source> = Vec::new();
        for source in chunks.iter().filter_map(GroundingChunk::to_source) {
            if !out.iter().any(|s| s.uri == source.uri) {
                out.push(source);
            }
        }
        out
    }
}
