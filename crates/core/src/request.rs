// Lead generation request - validated form input

use std::fmt;

use crate::geo::Coordinates;

pub const MIN_LEADS: u32 = 1;
pub const MAX_LEADS: u32 = 50;
pub const DEFAULT_LEAD_COUNT: u32 = 10;

/// Location text shown while the device position is in use.
pub const CURRENT_LOCATION_LABEL: &str = "My Current Location";

#[derive(Debug, Clone, PartialEq)]
pub struct LeadRequest {
    pub business_type: String,
    pub location: String,
    pub count: u32,
    pub requirements: Option<String>,
    /// Retrieval bias for maps grounding.
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    MissingBusinessType,
    MissingLocation,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingBusinessType => write!(f, "business type is required"),
            RequestError::MissingLocation => write!(f, "location is required"),
        }
    }
}

impl std::error::Error for RequestError {}

impl LeadRequest {
    pub fn new(business_type: impl Into<String>, location: impl Into<String>) -> Self {
        LeadRequest {
            business_type: business_type.into(),
            location: location.into(),
            count: DEFAULT_LEAD_COUNT,
            requirements: None,
            coordinates: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = clamp_count(count);
        self
    }

    /// Blank requirements are treated as none.
    pub fn with_requirements(mut self, requirements: Option<String>) -> Self {
        self.requirements = requirements
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self
    }

    pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.coordinates = coordinates;
        self
    }

    /// Trim text fields, clamp the count and reject blank required fields.
    pub fn validate(mut self) -> Result<Self, RequestError> {
        self.business_type = self.business_type.trim().to_string();
        self.location = self.location.trim().to_string();
        if self.business_type.is_empty() {
            return Err(RequestError::MissingBusinessType);
        }
        if self.location.is_empty() {
            return Err(RequestError::MissingLocation);
        }
        self.count = clamp_count(self.count);
        let requirements = self.requirements.take();
        Ok(self.with_requirements(requirements))
    }
}

pub fn clamp_count(count: u32) -> u32 {
    count.clamp(MIN_LEADS, MAX_LEADS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_clamped() {
        assert_eq!(LeadRequest::new("a", "b").with_count(0).count, 1);
        assert_eq!(LeadRequest::new("a", "b").with_count(500).count, 50);
        assert_eq!(LeadRequest::new("a", "b").with_count(25).count, 25);
        assert_eq!(LeadRequest::new("a", "b").count, DEFAULT_LEAD_COUNT);
    }

    #[test]
    fn test_validate_rejects_blank() {
        assert_eq!(
            LeadRequest::new("  ", "Kyoto").validate(),
            Err(RequestError::MissingBusinessType)
        );
        assert_eq!(
            LeadRequest::new("Hotels", "").validate(),
            Err(RequestError::MissingLocation)
        );
    }

    #[test]
    fn test_validate_normalizes() {
        let mut req = LeadRequest::new(" Hotels ", " Kyoto ");
        req.count = 0;
        req.requirements = Some("   ".into());
        let req = req.validate().unwrap();
        assert_eq!(req.business_type, "Hotels");
        assert_eq!(req.location, "Kyoto");
        assert_eq!(req.count, 1);
        assert_eq!(req.requirements, None);
    }
}
