//! An in-memory [`PaymentProvider`] for tests. Sessions are created open and unpaid; tests then mark them paid or
//! expired, or make the next calls fail.
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use serde_json::json;

use crate::traits::{CheckoutRequest, PaymentProvider, ProviderError, ProviderSession, SessionSnapshot, SessionState};

#[derive(Default)]
struct FakeState {
    sessions: HashMap<String, SessionSnapshot>,
    requests: Vec<CheckoutRequest>,
    fail_checkouts: bool,
    fail_fetches: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
    counter: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake provider state poisoned")
    }

    pub fn fail_checkouts(&self, fail: bool) {
        self.state().fail_checkouts = fail;
    }

    pub fn fail_fetch_for(&self, session_id: &str) {
        self.state().fail_fetches.insert(session_id.to_string());
    }

    /// Registers a session that was not created through this provider (e.g. one bound to an order directly in a test).
    pub fn add_session(&self, session_id: &str) {
        self.state().sessions.insert(session_id.to_string(), open_session(session_id));
    }

    pub fn set_paid(&self, session_id: &str, payment_reference: &str, charge_reference: Option<&str>) {
        let mut state = self.state();
        let session = state.sessions.entry(session_id.to_string()).or_insert_with(|| open_session(session_id));
        session.state = SessionState::Complete;
        session.paid = true;
        session.payment_reference = Some(payment_reference.to_string());
        session.charge_reference = charge_reference.map(String::from);
        session.raw = json!({ "id": session_id, "status": "complete", "payment_status": "paid" });
    }

    pub fn set_expired(&self, session_id: &str) {
        let mut state = self.state();
        let session = state.sessions.entry(session_id.to_string()).or_insert_with(|| open_session(session_id));
        session.state = SessionState::Expired;
        session.raw = json!({ "id": session_id, "status": "expired", "payment_status": "unpaid" });
    }

    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.state().requests.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn open_session(session_id: &str) -> SessionSnapshot {
    SessionSnapshot {
        session_id: session_id.to_string(),
        state: SessionState::Open,
        paid: false,
        payment_reference: None,
        charge_reference: None,
        raw: json!({ "id": session_id, "status": "open", "payment_status": "unpaid" }),
    }
}

impl PaymentProvider for FakeProvider {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<ProviderSession, ProviderError> {
        let mut state = self.state();
        state.requests.push(request.clone());
        if state.fail_checkouts {
            return Err(ProviderError::Unavailable("fake provider is down".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = format!("cs_test_{n:04}");
        state.sessions.insert(session_id.clone(), open_session(&session_id));
        Ok(ProviderSession { url: Some(format!("https://checkout.example.com/pay/{session_id}")), session_id })
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionSnapshot, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.fail_fetches.contains(session_id) {
            return Err(ProviderError::Unavailable(format!("timeout fetching {session_id}")));
        }
        state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected { status: 404, message: format!("No such session: {session_id}") })
    }
}
