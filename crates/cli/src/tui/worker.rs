// Background AI calls for the interactive app
//
// Each call runs on its own thread and reports back over a channel. The
// ticket travels with the result so the controller can drop stale replies.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use leadgen_core::{GeneratedLeads, LeadRequest, Strategy, VerificationResult};
use leadgen_gemini::{AiError, LeadGateway};
use leadgen_cli::{Ticket, VerifyJob};

pub(crate) enum Outcome {
    Strategy(Ticket, Result<Strategy, AiError>),
    Leads(Ticket, LeadRequest, Result<GeneratedLeads, AiError>),
    Verification(Ticket, Result<VerificationResult, AiError>),
}

#[derive(Clone)]
pub(crate) struct Worker {
    gateway: Arc<dyn LeadGateway>,
    tx: Sender<Outcome>,
}

impl Worker {
    pub(crate) fn new(gateway: Arc<dyn LeadGateway>, tx: Sender<Outcome>) -> Self {
        Self { gateway, tx }
    }

    fn spawn<F>(&self, name: &str, job: F)
    where
        F: FnOnce(&dyn LeadGateway) -> Outcome + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("leadgen-{}", name))
            .spawn(move || {
                // The receiver is gone once the app quits
                let _ = tx.send(job(gateway.as_ref()));
            });
        if let Err(e) = spawned {
            log::error!("failed to spawn {} worker: {}", name, e);
        }
    }

    pub(crate) fn strategy(&self, ticket: Ticket, problem: String) {
        self.spawn("strategy", move |g| Outcome::Strategy(ticket, g.request_strategy(&problem)));
    }

    pub(crate) fn leads(&self, ticket: Ticket, request: LeadRequest) {
        self.spawn("leads", move |g| {
            let result = g.request_leads(&request);
            Outcome::Leads(ticket, request, result)
        });
    }

    pub(crate) fn verify(&self, ticket: Ticket, job: VerifyJob) {
        self.spawn("verify", move |g| {
            Outcome::Verification(
                ticket,
                g.verify_requirement(&job.business_name, &job.website_url, &job.requirement),
            )
        });
    }
}
