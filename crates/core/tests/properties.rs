// Property tests for extraction, decoration and the sphere projection

use leadgen_core::{decorate, extract_json, to_sphere_point, Fragment, LeadStatus, RawLead};
use proptest::prelude::*;
use serde_json::Value;

fn prose() -> impl Strategy<Value = String> {
    // no brackets or braces, so the payload is the only candidate
    "[a-zA-Z0-9 .,:!?\n]{0,60}"
}

proptest! {
    #[test]
    fn array_surrounded_by_prose_extracts_exactly(
        before in prose(),
        after in prose(),
        names in prop::collection::vec("[a-zA-Z ]{1,20}", 0..8),
    ) {
        let payload: Vec<Value> = names
            .iter()
            .map(|n| serde_json::json!({ "name": n, "tags": ["x", "]"] }))
            .collect();
        let encoded = serde_json::to_string(&payload).unwrap();
        let text = format!("{}{}{}", before, encoded, after);
        let extracted: Vec<Value> = extract_json(&text, Fragment::Array).unwrap();
        prop_assert_eq!(extracted, payload);
    }

    #[test]
    fn decorate_assigns_positions(names in prop::collection::vec("[a-z]{1,10}", 0..60)) {
        let raw: Vec<RawLead> = names
            .iter()
            .map(|n| RawLead { name: n.clone(), ..Default::default() })
            .collect();
        let leads = decorate(raw);
        prop_assert_eq!(leads.len(), names.len());
        for (i, lead) in leads.iter().enumerate() {
            prop_assert_eq!(lead.id as usize, i);
            prop_assert_eq!(&lead.name, &names[i]);
            prop_assert_eq!(lead.status, LeadStatus::New);
        }
    }

    #[test]
    fn sphere_points_lie_on_radius(
        lat in -90.0f64..=90.0,
        lon in -180.0f64..=180.0,
        radius in 0.1f64..100.0,
    ) {
        let p = to_sphere_point(lat, lon, radius);
        let len = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt();
        prop_assert!((len - radius).abs() < 1e-9 * radius.max(1.0));
        // y depends only on latitude
        prop_assert!((p.y - radius * lat.to_radians().sin()).abs() < 1e-9 * radius.max(1.0));
    }
}
