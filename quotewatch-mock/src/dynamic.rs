use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use quotewatch_core::{InstrumentCode, Quote, QuoteClient, QuoteError};

/// Instruction for how a `fetch_one` call should behave for a given code.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the provided quotes immediately.
    Return(Vec<Quote>),
    /// Fail immediately with the provided error.
    Fail(QuoteError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
    /// Sleep for the given duration, then return the quotes.
    Delayed(Duration, Vec<Quote>),
}

impl MockBehavior {
    /// Shorthand for a single quote at `price`.
    pub fn price(code: &str, price: &str) -> Self {
        Self::Return(vec![Quote::new(code, price)])
    }
}

/// One observed `fetch_one` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Requested code.
    pub code: InstrumentCode,
    /// Tokio clock reading when the call started.
    pub at: Instant,
}

#[derive(Default)]
struct InternalState {
    rules: HashMap<InstrumentCode, MockBehavior>,
    scripts: HashMap<InstrumentCode, VecDeque<MockBehavior>>,
    fallback: Option<MockBehavior>,
    calls: Vec<MockCall>,
}

#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn enter(counter: &Arc<InFlight>) -> Self {
        let now = counter.current.fetch_add(1, Ordering::SeqCst) + 1;
        counter.peak.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
    in_flight: Arc<InFlight>,
}

impl DynamicMockController {
    /// Set the standing behavior for a code.
    pub async fn set_behavior(&self, code: impl Into<InstrumentCode>, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(code.into(), behavior);
    }

    /// Queue one-shot behaviors for a code, consumed in order before the
    /// standing behavior applies.
    pub async fn script(
        &self,
        code: impl Into<InstrumentCode>,
        behaviors: impl IntoIterator<Item = MockBehavior>,
    ) {
        let mut guard = self.state.lock().await;
        guard
            .scripts
            .entry(code.into())
            .or_default()
            .extend(behaviors);
    }

    /// Behavior for codes without a rule or script.
    pub async fn set_fallback(&self, behavior: MockBehavior) {
        self.state.lock().await.fallback = Some(behavior);
    }

    /// Copy of every call made so far, in arrival order.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of calls made for `code`.
    pub async fn call_count(&self, code: &str) -> usize {
        let guard = self.state.lock().await;
        guard
            .calls
            .iter()
            .filter(|c| c.code.as_str() == code)
            .count()
    }

    /// Highest number of calls observed running at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak.load(Ordering::SeqCst)
    }

    /// Clear all configured behaviors and the call log.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.scripts.clear();
        guard.fallback = None;
        guard.calls.clear();
        self.in_flight.peak.store(0, Ordering::SeqCst);
    }
}

/// A client that defers all behavior to an external controller.
pub struct DynamicMockClient {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
    in_flight: Arc<InFlight>,
}

impl DynamicMockClient {
    /// Create a new dynamic mock client and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn QuoteClient>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let in_flight = Arc::new(InFlight::default());
        let controller = DynamicMockController {
            state: Arc::clone(&state),
            in_flight: Arc::clone(&in_flight),
        };
        let me = Arc::new(Self {
            name,
            state,
            in_flight,
        });
        (me as Arc<dyn QuoteClient>, controller)
    }
}

#[async_trait]
impl QuoteClient for DynamicMockClient {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_one(
        &self,
        code: &InstrumentCode,
        _timeout: Duration,
    ) -> Result<Vec<Quote>, QuoteError> {
        let _in_flight = InFlightGuard::enter(&self.in_flight);
        // Log and pick the behavior without holding the lock across await points
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push(MockCall {
                code: code.clone(),
                at: Instant::now(),
            });
            let scripted = guard.scripts.get_mut(code).and_then(VecDeque::pop_front);
            scripted
                .or_else(|| guard.rules.get(code).cloned())
                .or_else(|| guard.fallback.clone())
        };

        match behavior {
            Some(MockBehavior::Return(q)) => Ok(q),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Delayed(d, q)) => {
                tokio::time::sleep(d).await;
                Ok(q)
            }
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(QuoteError::not_found(
                code.as_str(),
                "no mock behavior configured",
            )),
        }
    }
}
