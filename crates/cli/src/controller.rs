//! View/state controller.
//!
//! Owns everything the app shows: the lead form, the current batch of
//! leads and its sources, the suggested strategy, per-lead verification
//! slots, the view mode and the selection. Front-ends (the TUI, the
//! `generate`/`strategy` commands) only call into it.
//!
//! Every AI call is issued as a [`Ticket`]. A completion is applied only if
//! its ticket is still the latest one for that operation; anything older is
//! dropped. Starting a new lead batch also invalidates all verification
//! tickets of the previous batch.

use std::collections::HashMap;
use std::path::Path;

use leadgen_config::FormDefaults;
use leadgen_core::{
    decorate, globe_markers, update_status, Coordinates, GeneratedLeads, GlobeMarker, Lead,
    LeadRequest, LeadStatus, RequestError, Source, Strategy, VerificationResult,
    CURRENT_LOCATION_LABEL, GLOBE_RADIUS,
};
use leadgen_gemini::{AiError, LeadGateway};
use leadgen_io::ExportError;

// ============================================================================
// Operation state
// ============================================================================

/// Lifecycle of one operation: `Idle -> Loading -> Succeeded | Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum OpState<T> {
    Idle,
    Loading { generation: u64 },
    Succeeded(T),
    /// User-facing message
    Failed(String),
}

impl<T> Default for OpState<T> {
    fn default() -> Self {
        OpState::Idle
    }
}

impl<T> OpState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, OpState::Loading { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OpState::Succeeded(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OpState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Strategy,
    Leads,
    /// Verification of the lead with this id
    Verify(u32),
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Globe,
}

impl ViewMode {
    pub fn toggled(self) -> ViewMode {
        match self {
            ViewMode::List => ViewMode::Globe,
            ViewMode::Globe => ViewMode::List,
        }
    }
}

/// What the current batch was generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub request: LeadRequest,
}

/// Arguments of a verification call, captured when it is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyJob {
    pub lead_id: u32,
    pub business_name: String,
    pub website_url: String,
    pub requirement: String,
}

// ============================================================================
// Lead form
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LeadForm {
    pub business_type: String,
    pub location: String,
    pub count: u32,
    pub requirements: String,
    /// Set while the location reads "My Current Location"
    pub coordinates: Option<Coordinates>,
}

impl LeadForm {
    pub fn from_defaults(defaults: &FormDefaults) -> Self {
        LeadForm {
            business_type: defaults.business_type.clone(),
            location: defaults.location.clone(),
            count: leadgen_core::request::clamp_count(defaults.count),
            requirements: String::new(),
            coordinates: None,
        }
    }

    /// Edit the location; moving away from the current-location label drops
    /// the coordinates.
    pub fn set_location(&mut self, text: impl Into<String>) {
        self.location = text.into();
        if self.location != CURRENT_LOCATION_LABEL {
            self.coordinates = None;
        }
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = leadgen_core::request::clamp_count(count);
    }

    pub fn to_request(&self) -> LeadRequest {
        LeadRequest::new(self.business_type.clone(), self.location.clone())
            .with_count(self.count)
            .with_requirements(Some(self.requirements.clone()))
            .with_coordinates(self.coordinates)
    }
}

/// Message shown when the device position is unavailable.
pub fn geolocation_error_message(reason: &str) -> String {
    format!("Error: {}. Please enter a location manually.", reason.trim_end_matches('.'))
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug)]
pub struct Controller {
    form: LeadForm,
    /// Bumped whenever the form is replaced from outside (strategy, location)
    form_revision: u64,
    leads: Vec<Lead>,
    sources: Vec<Source>,
    leads_state: OpState<Batch>,
    strategy_state: OpState<Strategy>,
    verifications: HashMap<u32, OpState<VerificationResult>>,
    view_mode: ViewMode,
    selected: Option<u32>,
    notice: Option<String>,
    next_generation: u64,
    current: HashMap<Operation, u64>,
}

impl Controller {
    pub fn new(defaults: &FormDefaults) -> Self {
        Controller {
            form: LeadForm::from_defaults(defaults),
            form_revision: 0,
            leads: Vec::new(),
            sources: Vec::new(),
            leads_state: OpState::Idle,
            strategy_state: OpState::Idle,
            verifications: HashMap::new(),
            view_mode: ViewMode::List,
            selected: None,
            notice: None,
            next_generation: 0,
            current: HashMap::new(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn form(&self) -> &LeadForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut LeadForm {
        &mut self.form
    }

    pub fn form_revision(&self) -> u64 {
        self.form_revision
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn leads_state(&self) -> &OpState<Batch> {
        &self.leads_state
    }

    pub fn strategy_state(&self) -> &OpState<Strategy> {
        &self.strategy_state
    }

    pub fn verification(&self, lead_id: u32) -> Option<&OpState<VerificationResult>> {
        self.verifications.get(&lead_id)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// "3 Leads Found", "1 Lead Found"
    pub fn results_header(&self) -> String {
        let n = self.leads.len();
        format!("{} Lead{} Found", n, if n == 1 { "" } else { "s" })
    }

    // ── Tickets ────────────────────────────────────────────────────────

    fn issue(&mut self, operation: Operation) -> Ticket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.current.insert(operation, generation);
        Ticket { operation, generation }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.get(&ticket.operation) == Some(&ticket.generation)
    }

    fn retire(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            log::debug!("dropping stale completion {:?}", ticket);
            return false;
        }
        self.current.remove(&ticket.operation);
        true
    }

    // ── Strategy ───────────────────────────────────────────────────────

    /// Start a strategy request. The previous strategy is discarded.
    pub fn begin_strategy(&mut self, problem: &str) -> Result<(Ticket, String), String> {
        let problem = problem.trim();
        if problem.is_empty() {
            return Err("Please describe the problem you want leads for.".to_string());
        }
        let ticket = self.issue(Operation::Strategy);
        self.strategy_state = OpState::Loading {
            generation: ticket.generation,
        };
        Ok((ticket, problem.to_string()))
    }

    /// Apply a strategy completion. Returns false for stale tickets.
    pub fn finish_strategy(&mut self, ticket: Ticket, result: Result<Strategy, AiError>) -> bool {
        if !self.retire(ticket) {
            return false;
        }
        self.strategy_state = match result {
            Ok(strategy) => OpState::Succeeded(strategy),
            Err(e) => OpState::Failed(e.to_string()),
        };
        true
    }

    /// Copy the suggested strategy into the form.
    pub fn use_strategy(&mut self) -> bool {
        let prefill = match &self.strategy_state {
            OpState::Succeeded(strategy) => strategy.to_prefill(),
            _ => return false,
        };
        self.form.business_type = prefill.business_type;
        self.form.set_location(prefill.location);
        self.form.requirements = prefill.requirements;
        self.form_revision += 1;
        true
    }

    // ── Location ───────────────────────────────────────────────────────

    /// Apply the outcome of a position lookup.
    pub fn use_current_location(&mut self, position: Result<Coordinates, String>) {
        match position {
            Ok(coordinates) => {
                self.form.location = CURRENT_LOCATION_LABEL.to_string();
                self.form.coordinates = Some(coordinates);
                self.notice = None;
            }
            Err(reason) => {
                self.form.coordinates = None;
                if self.form.location == CURRENT_LOCATION_LABEL {
                    self.form.location.clear();
                }
                self.notice = Some(geolocation_error_message(&reason));
            }
        }
        self.form_revision += 1;
    }

    // ── Leads ──────────────────────────────────────────────────────────

    /// Validate the form and start a lead batch. Clears the previous batch,
    /// its sources, verifications and selection.
    pub fn begin_leads(&mut self) -> Result<(Ticket, LeadRequest), RequestError> {
        let request = self.form.to_request().validate()?;

        self.leads.clear();
        self.sources.clear();
        self.verifications.clear();
        self.current.retain(|op, _| !matches!(op, Operation::Verify(_)));
        self.selected = None;

        let ticket = self.issue(Operation::Leads);
        self.leads_state = OpState::Loading {
            generation: ticket.generation,
        };
        Ok((ticket, request))
    }

    /// Apply a lead batch completion. Returns false for stale tickets.
    pub fn finish_leads(
        &mut self,
        ticket: Ticket,
        request: LeadRequest,
        result: Result<GeneratedLeads, AiError>,
    ) -> bool {
        if !self.retire(ticket) {
            return false;
        }
        match result {
            Ok(generated) => {
                self.leads = decorate(generated.leads);
                self.sources = generated.sources;
                self.selected = self.leads.first().map(|l| l.id);
                self.leads_state = OpState::Succeeded(Batch { request });
            }
            Err(e) => {
                self.leads_state = OpState::Failed(e.to_string());
            }
        }
        true
    }

    pub fn update_status(&mut self, lead_id: u32, status: LeadStatus) -> bool {
        update_status(&mut self.leads, lead_id, status)
    }

    /// Advance the status of a lead to the next value.
    pub fn cycle_status(&mut self, lead_id: u32) -> Option<LeadStatus> {
        let next = self.lead(lead_id)?.status.next();
        self.update_status(lead_id, next);
        Some(next)
    }

    pub fn lead(&self, lead_id: u32) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == lead_id)
    }

    // ── Verification ───────────────────────────────────────────────────

    /// Requirement the current batch was generated with.
    pub fn batch_requirement(&self) -> Option<&str> {
        self.leads_state.value()?.request.requirements.as_deref()
    }

    /// Verification is offered only when the batch has a requirement and
    /// the lead has a website.
    pub fn can_verify(&self, lead_id: u32) -> bool {
        self.verify_job(lead_id).is_some()
    }

    fn verify_job(&self, lead_id: u32) -> Option<VerifyJob> {
        let requirement = self.batch_requirement()?;
        let lead = self.lead(lead_id)?;
        let website_url = lead.website_url()?;
        Some(VerifyJob {
            lead_id,
            business_name: lead.name.clone(),
            website_url,
            requirement: requirement.to_string(),
        })
    }

    pub fn begin_verification(&mut self, lead_id: u32) -> Option<(Ticket, VerifyJob)> {
        let job = self.verify_job(lead_id)?;
        let ticket = self.issue(Operation::Verify(lead_id));
        self.verifications.insert(
            lead_id,
            OpState::Loading {
                generation: ticket.generation,
            },
        );
        Some((ticket, job))
    }

    pub fn finish_verification(&mut self, ticket: Ticket, result: Result<VerificationResult, AiError>) -> bool {
        let lead_id = match ticket.operation {
            Operation::Verify(id) => id,
            _ => return false,
        };
        if !self.retire(ticket) {
            return false;
        }
        let state = match result {
            Ok(v) => OpState::Succeeded(v),
            Err(e) => OpState::Failed(e.to_string()),
        };
        self.verifications.insert(lead_id, state);
        true
    }

    // ── View ───────────────────────────────────────────────────────────

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.view_mode = self.view_mode.toggled();
        self.view_mode
    }

    pub fn selected(&self) -> Option<u32> {
        self.selected
    }

    pub fn selected_lead(&self) -> Option<&Lead> {
        self.lead(self.selected?)
    }

    pub fn select_lead(&mut self, lead_id: u32) -> bool {
        if self.lead(lead_id).is_some() {
            self.selected = Some(lead_id);
            true
        } else {
            false
        }
    }

    /// Move the selection by `delta` positions in list order, clamped.
    pub fn move_selection(&mut self, delta: isize) {
        if self.leads.is_empty() {
            self.selected = None;
            return;
        }
        let pos = self
            .selected
            .and_then(|id| self.leads.iter().position(|l| l.id == id))
            .unwrap_or(0) as isize;
        let last = self.leads.len() as isize - 1;
        let next = (pos + delta).clamp(0, last) as usize;
        self.selected = Some(self.leads[next].id);
    }

    /// Move the selection among leads that appear on the globe, wrapping.
    pub fn cycle_marker(&mut self, forward: bool) -> Option<u32> {
        let markers = self.globe_markers();
        if markers.is_empty() {
            return None;
        }
        let pos = self
            .selected
            .and_then(|id| markers.iter().position(|m| m.lead_id == id));
        let next = match (pos, forward) {
            (None, _) => 0,
            (Some(p), true) => (p + 1) % markers.len(),
            (Some(p), false) => (p + markers.len() - 1) % markers.len(),
        };
        self.selected = Some(markers[next].lead_id);
        self.selected
    }

    pub fn globe_markers(&self) -> Vec<GlobeMarker> {
        globe_markers(&self.leads, GLOBE_RADIUS)
    }

    // ── Export ─────────────────────────────────────────────────────────

    pub fn export_csv(&mut self, path: &Path) -> Result<usize, ExportError> {
        match leadgen_io::export(&self.leads, path) {
            Ok(()) => {
                self.notice = Some(format!("Exported {} leads to {}", self.leads.len(), path.display()));
                Ok(self.leads.len())
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                Err(e)
            }
        }
    }

    // ── Synchronous helpers ────────────────────────────────────────────

    /// Issue, run and apply a strategy request on the calling thread.
    pub fn run_strategy(&mut self, gateway: &dyn LeadGateway, problem: &str) -> Result<&Strategy, String> {
        let (ticket, problem) = self.begin_strategy(problem)?;
        let result = gateway.request_strategy(&problem);
        self.finish_strategy(ticket, result);
        match &self.strategy_state {
            OpState::Succeeded(strategy) => Ok(strategy),
            OpState::Failed(msg) => Err(msg.clone()),
            _ => Err("strategy request did not complete".to_string()),
        }
    }

    /// Issue, run and apply a lead batch on the calling thread.
    pub fn run_leads(&mut self, gateway: &dyn LeadGateway) -> Result<Result<&[Lead], AiError>, RequestError> {
        let (ticket, request) = self.begin_leads()?;
        let result = gateway.request_leads(&request);
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.finish_leads(ticket, request, result);
        Ok(outcome.map(|()| self.leads.as_slice()))
    }

    /// Issue, run and apply a verification on the calling thread.
    pub fn run_verification(
        &mut self,
        gateway: &dyn LeadGateway,
        lead_id: u32,
    ) -> Option<&OpState<VerificationResult>> {
        let (ticket, job) = self.begin_verification(lead_id)?;
        let result = gateway.verify_requirement(&job.business_name, &job.website_url, &job.requirement);
        self.finish_verification(ticket, result);
        self.verification(lead_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadgen_core::RawLead;
    use leadgen_gemini::{AiErrorKind, AiOperation};
    use std::sync::Mutex;

    /// Gateway returning canned answers and recording calls.
    #[derive(Default)]
    struct FakeGateway {
        leads: Mutex<Option<Result<GeneratedLeads, AiError>>>,
        strategy: Mutex<Option<Result<Strategy, AiError>>>,
        verification: Mutex<Option<Result<VerificationResult, AiError>>>,
        verify_calls: Mutex<Vec<(String, String, String)>>,
    }

    impl LeadGateway for FakeGateway {
        fn request_strategy(&self, _problem: &str) -> Result<Strategy, AiError> {
            self.strategy.lock().unwrap().take().expect("no canned strategy")
        }

        fn request_leads(&self, _request: &LeadRequest) -> Result<GeneratedLeads, AiError> {
            self.leads.lock().unwrap().take().expect("no canned leads")
        }

        fn verify_requirement(&self, name: &str, url: &str, requirement: &str) -> Result<VerificationResult, AiError> {
            self.verify_calls
                .lock()
                .unwrap()
                .push((name.into(), url.into(), requirement.into()));
            self.verification.lock().unwrap().take().expect("no canned verification")
        }
    }

    fn raw(name: &str, website: Option<&str>, coords: Option<(f64, f64)>) -> RawLead {
        RawLead {
            name: name.into(),
            address: format!("{} address", name),
            website: website.map(String::from),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            ..Default::default()
        }
    }

    fn batch(n: usize) -> GeneratedLeads {
        GeneratedLeads {
            leads: (0..n).map(|i| raw(&format!("Lead {}", i), Some("example.com"), None)).collect(),
            sources: vec![Source {
                uri: "https://maps.google.com/?cid=1".into(),
                title: "Maps".into(),
            }],
        }
    }

    fn controller() -> Controller {
        Controller::new(&FormDefaults::default())
    }

    fn strategy() -> Strategy {
        Strategy {
            business_type: "Dental Clinics".into(),
            locations: vec!["Austin, TX".into(), "Denver, CO".into()],
            requirements: "online booking".into(),
        }
    }

    #[test]
    fn test_form_defaults() {
        let c = controller();
        assert_eq!(c.form().business_type, "Boutique Hotels");
        assert_eq!(c.form().location, "Kyoto, Japan");
        assert_eq!(c.form().count, 10);
        assert_eq!(c.leads_state(), &OpState::Idle);
        assert_eq!(c.view_mode(), ViewMode::List);
    }

    #[test]
    fn test_leads_success_decorates() {
        let mut c = controller();
        let (ticket, request) = c.begin_leads().unwrap();
        assert!(c.leads_state().is_loading());
        assert!(c.finish_leads(ticket, request, Ok(batch(3))));
        let ids: Vec<u32> = c.leads().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(c.sources().len(), 1);
        assert_eq!(c.results_header(), "3 Leads Found");
        assert_eq!(c.selected(), Some(0));
    }

    #[test]
    fn test_new_batch_clears_previous_and_failure_applies_nothing() {
        let mut c = controller();
        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(2)));

        let (t, r) = c.begin_leads().unwrap();
        assert!(c.leads().is_empty());
        assert!(c.sources().is_empty());
        let err = AiErrorKind::NoJson.during(AiOperation::Leads);
        assert!(c.finish_leads(t, r, Err(err)));
        assert!(c.leads().is_empty());
        assert!(!c.leads_state().is_loading());
        assert!(c.leads_state().error().unwrap().contains("did not return a valid list"));
    }

    #[test]
    fn test_network_error_ends_loading() {
        let mut c = controller();
        let gateway = FakeGateway::default();
        *gateway.leads.lock().unwrap() =
            Some(Err(AiErrorKind::Network("connection refused".into()).during(AiOperation::Leads)));
        let outcome = c.run_leads(&gateway).unwrap();
        assert!(matches!(outcome, Err(e) if !e.is_format_error()));
        assert!(!c.leads_state().is_loading());
        assert!(c.leads_state().error().is_some());
    }

    #[test]
    fn test_stale_completion_dropped() {
        let mut c = controller();
        let (old, old_req) = c.begin_leads().unwrap();
        let (new, new_req) = c.begin_leads().unwrap();
        assert!(!c.finish_leads(old, old_req, Ok(batch(5))));
        assert!(c.leads().is_empty());
        assert!(c.leads_state().is_loading());
        assert!(c.finish_leads(new, new_req, Ok(batch(1))));
        assert_eq!(c.leads().len(), 1);
        assert_eq!(c.results_header(), "1 Lead Found");
        // a ticket is applied once
        assert!(!c.finish_leads(new, LeadRequest::new("a", "b"), Ok(batch(4))));
        assert_eq!(c.leads().len(), 1);
    }

    #[test]
    fn test_invalid_form_does_not_start() {
        let mut c = controller();
        c.form_mut().business_type = "  ".into();
        assert_eq!(c.begin_leads().unwrap_err(), RequestError::MissingBusinessType);
        assert_eq!(c.leads_state(), &OpState::Idle);
    }

    #[test]
    fn test_update_status_only_target() {
        let mut c = controller();
        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(5)));
        assert!(c.update_status(2, LeadStatus::Contacted));
        for lead in c.leads() {
            let expected = if lead.id == 2 { LeadStatus::Contacted } else { LeadStatus::New };
            assert_eq!(lead.status, expected);
        }
        assert_eq!(c.cycle_status(2), Some(LeadStatus::Interested));
        assert_eq!(c.cycle_status(42), None);
    }

    #[test]
    fn test_strategy_flow_and_prefill() {
        let mut c = controller();
        assert!(c.begin_strategy("   ").is_err());
        assert!(!c.use_strategy());

        let gateway = FakeGateway::default();
        *gateway.strategy.lock().unwrap() = Some(Ok(strategy()));
        c.run_strategy(&gateway, "we sell dental chairs").unwrap();

        let revision = c.form_revision();
        assert!(c.use_strategy());
        assert_eq!(c.form_revision(), revision + 1);
        assert_eq!(c.form().business_type, "Dental Clinics");
        assert_eq!(c.form().location, "Austin, TX, Denver, CO");
        assert_eq!(c.form().requirements, "online booking");
    }

    #[test]
    fn test_strategy_failure_message() {
        let mut c = controller();
        let gateway = FakeGateway::default();
        *gateway.strategy.lock().unwrap() =
            Some(Err(AiErrorKind::Malformed("eof".into()).during(AiOperation::Strategy)));
        let err = c.run_strategy(&gateway, "problem").unwrap_err();
        assert!(err.starts_with("The AI failed to generate a strategy:"));
        assert!(c.strategy_state().error().is_some());
    }

    #[test]
    fn test_current_location() {
        let mut c = controller();
        let here = Coordinates::new(35.0, 135.7).unwrap();
        c.use_current_location(Ok(here));
        assert_eq!(c.form().location, CURRENT_LOCATION_LABEL);
        assert_eq!(c.form_mut().to_request().coordinates, Some(here));

        c.form_mut().set_location("Osaka");
        assert_eq!(c.form().coordinates, None);

        c.use_current_location(Err("Location is not configured".into()));
        assert_eq!(
            c.notice(),
            Some("Error: Location is not configured. Please enter a location manually.")
        );
        assert_eq!(c.form().location, "Osaka");
    }

    #[test]
    fn test_verification_requires_requirement_and_website() {
        let mut c = controller();
        let (t, r) = c.begin_leads().unwrap();
        let mut generated = batch(1);
        generated.leads.push(raw("No Site", None, None));
        c.finish_leads(t, r, Ok(generated));
        // batch generated without requirements
        assert!(!c.can_verify(0));

        c.form_mut().requirements = "has parking".into();
        let (t, r) = c.begin_leads().unwrap();
        let mut generated = batch(1);
        generated.leads.push(raw("No Site", None, None));
        c.finish_leads(t, r, Ok(generated));
        assert!(c.can_verify(0));
        assert!(!c.can_verify(1));
        assert!(c.begin_verification(1).is_none());
    }

    #[test]
    fn test_verification_slots_are_isolated() {
        let mut c = controller();
        c.form_mut().requirements = "has parking".into();
        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(3)));

        let (t0, job0) = c.begin_verification(0).unwrap();
        let (t2, _) = c.begin_verification(2).unwrap();
        assert_eq!(job0.website_url, "https://example.com");
        assert_eq!(job0.requirement, "has parking");

        let ok = VerificationResult {
            meets_requirement: true,
            justification: "Parking lot shown.".into(),
            application_url: None,
        };
        assert!(c.finish_verification(t2, Ok(ok.clone())));
        assert!(c.verification(0).unwrap().is_loading());
        assert_eq!(c.verification(2).unwrap().value(), Some(&ok));
        assert!(c.verification(1).is_none());

        let err = AiErrorKind::NoJson.during(AiOperation::Verification);
        assert!(c.finish_verification(t0, Err(err)));
        assert!(c.verification(0).unwrap().error().is_some());
    }

    #[test]
    fn test_new_batch_invalidates_verifications() {
        let mut c = controller();
        c.form_mut().requirements = "has parking".into();
        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(2)));
        let (vt, _) = c.begin_verification(0).unwrap();

        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(2)));
        let late = VerificationResult {
            meets_requirement: false,
            justification: String::new(),
            application_url: None,
        };
        assert!(!c.finish_verification(vt, Ok(late)));
        assert!(c.verification(0).is_none());
    }

    #[test]
    fn test_run_verification_passes_job() {
        let mut c = controller();
        c.form_mut().requirements = "vegan menu".into();
        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(1)));

        let gateway = FakeGateway::default();
        *gateway.verification.lock().unwrap() = Some(Ok(VerificationResult {
            meets_requirement: true,
            justification: "Menu lists vegan dishes.".into(),
            application_url: Some("https://example.com/contact".into()),
        }));
        let state = c.run_verification(&gateway, 0).unwrap();
        assert!(state.value().unwrap().meets_requirement);
        let calls = gateway.verify_calls.lock().unwrap();
        assert_eq!(
            calls[0],
            ("Lead 0".to_string(), "https://example.com".to_string(), "vegan menu".to_string())
        );
    }

    #[test]
    fn test_globe_markers_and_cycling() {
        let mut c = controller();
        let (t, r) = c.begin_leads().unwrap();
        let generated = GeneratedLeads {
            leads: vec![
                raw("A", None, Some((35.0, 135.7))),
                raw("B", None, None),
                raw("C", None, Some((-33.9, 151.2))),
            ],
            sources: Vec::new(),
        };
        c.finish_leads(t, r, Ok(generated));
        let ids: Vec<u32> = c.globe_markers().iter().map(|m| m.lead_id).collect();
        assert_eq!(ids, vec![0, 2]);

        assert_eq!(c.toggle_view_mode(), ViewMode::Globe);
        assert_eq!(c.cycle_marker(true), Some(2));
        assert_eq!(c.cycle_marker(true), Some(0));
        assert_eq!(c.cycle_marker(false), Some(2));
    }

    #[test]
    fn test_selection_moves_and_clamps() {
        let mut c = controller();
        c.move_selection(1);
        assert_eq!(c.selected(), None);
        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(3)));
        c.move_selection(1);
        assert_eq!(c.selected(), Some(1));
        c.move_selection(10);
        assert_eq!(c.selected(), Some(2));
        c.move_selection(-10);
        assert_eq!(c.selected(), Some(0));
        assert!(!c.select_lead(9));
        assert!(c.select_lead(2));
        assert_eq!(c.selected_lead().unwrap().name, "Lead 2");
    }

    #[test]
    fn test_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let mut c = controller();
        assert_eq!(c.export_csv(&path), Err(ExportError::NothingToExport));
        assert!(c.notice().unwrap().contains("nothing to export"));

        let (t, r) = c.begin_leads().unwrap();
        c.finish_leads(t, r, Ok(batch(2)));
        assert_eq!(c.export_csv(&path), Ok(2));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
