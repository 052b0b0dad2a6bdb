// Leads - raw records from the model, decorated with id and status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::Coordinates;
use crate::lenient;
use crate::source::Source;

/// Triage status of a lead. Session-scoped; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Interested,
    #[serde(rename = "Not Interested")]
    NotInterested,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Interested,
        LeadStatus::NotInterested,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Interested => "Interested",
            LeadStatus::NotInterested => "Not Interested",
        }
    }

    /// Next status in display order, wrapping around.
    pub fn next(self) -> LeadStatus {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    /// Case-insensitive; accepts "not-interested" and "not_interested".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "interested" => Ok(LeadStatus::Interested),
            "notinterested" => Ok(LeadStatus::NotInterested),
            _ => Err(format!(
                "unknown status '{}' (expected: New, Contacted, Interested, Not Interested)",
                s
            )),
        }
    }
}

/// A business record as the model returns it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLead {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// A lead with its batch-local id and triage status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// 0-based position in the batch that produced it.
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub status: LeadStatus,
}

impl Lead {
    pub fn from_raw(id: u32, raw: RawLead) -> Self {
        Lead {
            id,
            name: raw.name,
            category: raw.category,
            address: raw.address,
            phone: raw.phone,
            website: raw.website,
            rating: raw.rating,
            reviews_count: raw.reviews_count,
            opening_hours: raw.opening_hours,
            latitude: raw.latitude,
            longitude: raw.longitude,
            status: LeadStatus::New,
        }
    }

    /// Website as a clickable URL: bare hosts get an `https://` prefix.
    pub fn website_url(&self) -> Option<String> {
        let site = self.website.as_deref()?.trim();
        if site.is_empty() {
            None
        } else if site.starts_with("http") {
            Some(site.to_string())
        } else {
            Some(format!("https://{}", site))
        }
    }

    /// Coordinates when both components are present and in range.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?).ok()
    }

    /// "4.5 / 5 (120 reviews)"; "N/A" stands in for a missing count.
    pub fn rating_label(&self) -> Option<String> {
        let rating = self.rating?;
        let reviews = match self.reviews_count {
            Some(n) => n.to_string(),
            None => "N/A".to_string(),
        };
        Some(format!("{} / 5 ({} reviews)", rating, reviews))
    }
}

/// Leads plus the grounding sources from one generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedLeads {
    pub leads: Vec<RawLead>,
    pub sources: Vec<Source>,
}

/// Assign ids `0..N-1` in order and the default status.
pub fn decorate(raw: Vec<RawLead>) -> Vec<Lead> {
    raw.into_iter()
        .enumerate()
        .map(|(i, r)| Lead::from_raw(i as u32, r))
        .collect()
}

/// Set the status of the lead with `id`. Returns false when no lead matches.
pub fn update_status(leads: &mut [Lead], id: u32, status: LeadStatus) -> bool {
    match leads.iter_mut().find(|l| l.id == id) {
        Some(lead) => {
            lead.status = status;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> RawLead {
        RawLead {
            name: name.to_string(),
            address: format!("{} Street", name),
            ..Default::default()
        }
    }

    #[test]
    fn test_decorate_assigns_sequential_ids() {
        let leads = decorate(vec![raw("A"), raw("B"), raw("C")]);
        let ids: Vec<u32> = leads.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(leads.iter().all(|l| l.status == LeadStatus::New));
        assert_eq!(leads[1].name, "B");
    }

    #[test]
    fn test_decorate_empty() {
        assert!(decorate(Vec::new()).is_empty());
    }

    #[test]
    fn test_update_status_touches_only_target() {
        let mut leads = decorate((0..5).map(|i| raw(&format!("L{}", i))).collect());
        assert!(update_status(&mut leads, 2, LeadStatus::Interested));
        for lead in &leads {
            let expected = if lead.id == 2 { LeadStatus::Interested } else { LeadStatus::New };
            assert_eq!(lead.status, expected);
        }
        assert!(!update_status(&mut leads, 99, LeadStatus::Contacted));
    }

    #[test]
    fn test_raw_lead_tolerates_model_quirks() {
        let json = r#"{
            "name": "Hotel Kanra",
            "category": "Boutique Hotel",
            "address": null,
            "phone": "",
            "website": "hotelkanra.jp",
            "rating": "4.6",
            "reviewsCount": "1,204 reviews",
            "openingHours": ["Check-in 15:00", "Check-out 11:00"],
            "latitude": 34.99,
            "longitude": "135.76",
            "extra": "ignored"
        }"#;
        let lead: RawLead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.address, "");
        assert_eq!(lead.phone, None);
        assert_eq!(lead.rating, Some(4.6));
        assert_eq!(lead.reviews_count, Some(1204));
        assert_eq!(lead.opening_hours.as_deref(), Some("Check-in 15:00; Check-out 11:00"));
        assert_eq!(lead.longitude, Some(135.76));
    }

    #[test]
    fn test_raw_lead_missing_fields() {
        let lead: RawLead = serde_json::from_str(r#"{"name": "Only Name"}"#).unwrap();
        assert_eq!(lead.name, "Only Name");
        assert_eq!(lead.address, "");
        assert!(lead.website.is_none());
        assert!(lead.latitude.is_none());
    }

    #[test]
    fn test_website_url() {
        let mut lead = Lead::from_raw(0, raw("A"));
        assert_eq!(lead.website_url(), None);
        lead.website = Some("example.com".into());
        assert_eq!(lead.website_url().as_deref(), Some("https://example.com"));
        lead.website = Some("http://example.com".into());
        assert_eq!(lead.website_url().as_deref(), Some("http://example.com"));
    }

    #[test]
    fn test_rating_label() {
        let mut lead = Lead::from_raw(0, raw("A"));
        assert_eq!(lead.rating_label(), None);
        lead.rating = Some(4.5);
        assert_eq!(lead.rating_label().as_deref(), Some("4.5 / 5 (N/A reviews)"));
        lead.reviews_count = Some(87);
        assert_eq!(lead.rating_label().as_deref(), Some("4.5 / 5 (87 reviews)"));
    }

    #[test]
    fn test_coordinates_require_both() {
        let mut lead = Lead::from_raw(0, raw("A"));
        lead.latitude = Some(35.0);
        assert!(lead.coordinates().is_none());
        lead.longitude = Some(135.7);
        assert!(lead.coordinates().is_some());
        lead.latitude = Some(120.0);
        assert!(lead.coordinates().is_none());
    }

    #[test]
    fn test_status_parse_and_serde() {
        assert_eq!("not interested".parse::<LeadStatus>(), Ok(LeadStatus::NotInterested));
        assert_eq!("Not-Interested".parse::<LeadStatus>(), Ok(LeadStatus::NotInterested));
        assert_eq!("CONTACTED".parse::<LeadStatus>(), Ok(LeadStatus::Contacted));
        assert!("maybe".parse::<LeadStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&LeadStatus::NotInterested).unwrap(),
            "\"Not Interested\""
        );
        assert_eq!(LeadStatus::NotInterested.next(), LeadStatus::New);
    }
}
