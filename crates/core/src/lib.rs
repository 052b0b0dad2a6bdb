// Core types - leads, strategies, grounding sources, verification results

pub mod extract;
pub mod geo;
pub mod lead;
pub mod request;
pub mod source;
pub mod strategy;
pub mod verification;

mod lenient;

pub use extract::{extract_json, ExtractError, Fragment};
pub use geo::{globe_markers, to_sphere_point, Coordinates, GeoError, GlobeMarker, SpherePoint, GLOBE_RADIUS};
pub use lead::{decorate, update_status, GeneratedLeads, Lead, LeadStatus, RawLead};
pub use request::{LeadRequest, RequestError, CURRENT_LOCATION_LABEL, DEFAULT_LEAD_COUNT, MAX_LEADS, MIN_LEADS};
pub use source::{GroundingChunk, Source, SourceInfo};
pub use strategy::{FormPrefill, Strategy};
pub use verification::VerificationResult;
