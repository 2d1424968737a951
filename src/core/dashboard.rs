use crate::core::bus::EventBus;
use crate::domain::model::{
    BusinessMetrics, BusinessQuery, DashboardEvent, DashboardSnapshot, NotificationLevel,
    Operation, RequestStatus,
};
use crate::domain::ports::BusinessBackend;
use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

pub const VALIDATION_WARNING: &str = "Please fill in both business name and location";
pub const ANALYSIS_SUCCESS: &str = "Business data loaded successfully!";
pub const REGENERATION_SUCCESS: &str = "New SEO headline generated!";
pub const REGENERATION_FAILURE: &str = "Failed to generate new headline";

/// Bookkeeping for one kind of request.
#[derive(Debug, Default)]
struct OperationState {
    in_flight: usize,
    issued: u64,
    applied: u64,
}

impl OperationState {
    fn status(&self) -> RequestStatus {
        if self.in_flight > 0 {
            RequestStatus::InFlight
        } else {
            RequestStatus::Idle
        }
    }
}

#[derive(Debug, Default)]
struct DashboardState {
    query: BusinessQuery,
    metrics: Option<BusinessMetrics>,
    // bumped whenever an analysis replaces the metrics
    metrics_epoch: u64,
    analysis: OperationState,
    regeneration: OperationState,
}

impl DashboardState {
    fn operation(&mut self, operation: Operation) -> &mut OperationState {
        match operation {
            Operation::Analysis => &mut self.analysis,
            Operation::Regeneration => &mut self.regeneration,
        }
    }
}

fn lock_state(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks one call of `operation` as outstanding. Dropping it (on success,
/// failure, or cancellation of the owning future) settles the call.
struct InFlightGuard<'a> {
    state: &'a Mutex<DashboardState>,
    bus: &'a EventBus,
    operation: Operation,
    generation: u64,
}

impl<'a> InFlightGuard<'a> {
    fn begin(state: &'a Mutex<DashboardState>, bus: &'a EventBus, operation: Operation) -> Self {
        let mut guard = lock_state(state);
        let op = guard.operation(operation);
        op.in_flight += 1;
        op.issued += 1;
        let generation = op.issued;

        if op.in_flight == 1 {
            tracing::info!("{} request started", operation);
            bus.publish(DashboardEvent::StatusChanged {
                operation,
                status: RequestStatus::InFlight,
            });
        } else {
            tracing::debug!(
                "{} request #{} overlaps {} outstanding call(s)",
                operation,
                generation,
                op.in_flight - 1
            );
        }

        Self {
            state,
            bus,
            operation,
            generation,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut guard = lock_state(self.state);
        let op = guard.operation(self.operation);
        op.in_flight = op.in_flight.saturating_sub(1);

        if op.in_flight == 0 {
            tracing::info!("{} request finished", self.operation);
            self.bus.publish(DashboardEvent::StatusChanged {
                operation: self.operation,
                status: RequestStatus::Idle,
            });
        }
    }
}

/// Request lifecycle of the business dashboard form.
///
/// Holds the form fields, the last fetched [`BusinessMetrics`] and one
/// [`RequestStatus`] per operation. Every change is published on the
/// [`EventBus`]; callers render by subscribing.
///
/// Overlapping calls of the same operation are allowed. A response is only
/// applied when no response from a later call of that operation has been
/// applied already, so a slow stale reply never overwrites newer data.
pub struct BusinessDashboard<B: BusinessBackend> {
    backend: B,
    state: Mutex<DashboardState>,
    bus: EventBus,
}

impl<B: BusinessBackend> BusinessDashboard<B> {
    pub fn new(backend: B) -> Self {
        Self::with_bus(backend, EventBus::default())
    }

    pub fn with_bus(backend: B, bus: EventBus) -> Self {
        Self {
            backend,
            state: Mutex::new(DashboardState::default()),
            bus,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.bus.subscribe()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        lock_state(&self.state).query.name = name.into();
    }

    pub fn set_location(&self, location: impl Into<String>) {
        lock_state(&self.state).query.location = location.into();
    }

    pub fn set_query(&self, query: BusinessQuery) {
        lock_state(&self.state).query = query;
    }

    pub fn query(&self) -> BusinessQuery {
        lock_state(&self.state).query.clone()
    }

    pub fn metrics(&self) -> Option<BusinessMetrics> {
        lock_state(&self.state).metrics.clone()
    }

    pub fn status(&self, operation: Operation) -> RequestStatus {
        lock_state(&self.state).operation(operation).status()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = lock_state(&self.state);
        DashboardSnapshot {
            query: state.query.clone(),
            metrics: state.metrics.clone(),
            analysis: state.analysis.status(),
            regeneration: state.regeneration.status(),
        }
    }

    /// Submits the current form fields.
    pub async fn analyze(&self) -> Result<Option<BusinessMetrics>> {
        let query = self.query();
        self.submit(query).await
    }

    /// Regenerates the headline for the current form fields.
    pub async fn regenerate(&self) -> Result<Option<String>> {
        let query = self.query();
        self.regenerate_headline(query).await
    }

    /// Validates `query` and fetches fresh metrics for it.
    ///
    /// Returns `Ok(None)` when the response was superseded by a later
    /// analysis. On failure the previous metrics stay in place.
    pub async fn submit(&self, query: BusinessQuery) -> Result<Option<BusinessMetrics>> {
        let query = self.validate_query(&query)?;
        let guard = InFlightGuard::begin(&self.state, &self.bus, Operation::Analysis);

        let metrics = match self.backend.fetch_metrics(&query).await {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::error!("Error fetching business data: {}", e);
                self.bus.notify(
                    NotificationLevel::Error,
                    format!(
                        "Failed to load business data. Please make sure the backend is running at {}.",
                        self.backend.describe()
                    ),
                );
                return Err(e);
            }
        };

        let applied = {
            let mut state = lock_state(&self.state);
            if guard.generation > state.analysis.applied {
                state.analysis.applied = guard.generation;
                state.metrics = Some(metrics.clone());
                state.metrics_epoch += 1;
                true
            } else {
                false
            }
        };

        if !applied {
            tracing::warn!(
                "Discarding analysis response #{}, a newer one was already applied",
                guard.generation
            );
            self.bus.publish(DashboardEvent::ResponseDiscarded {
                operation: Operation::Analysis,
            });
            return Ok(None);
        }

        tracing::info!(
            "Loaded metrics for {:?}: rating={} reviews={}",
            query.name,
            metrics.rating,
            metrics.review_count
        );
        self.bus.publish(DashboardEvent::MetricsUpdated(metrics.clone()));
        self.bus.notify(NotificationLevel::Success, ANALYSIS_SUCCESS);
        Ok(Some(metrics))
    }

    /// Replaces only the headline of the current metrics.
    ///
    /// A no-op returning `Ok(None)` while no metrics have been loaded; no
    /// request is made in that case. Also `Ok(None)` when the new headline
    /// was superseded, either by a later regeneration or by an analysis
    /// that replaced the metrics meanwhile.
    pub async fn regenerate_headline(&self, query: BusinessQuery) -> Result<Option<String>> {
        let epoch = {
            let state = lock_state(&self.state);
            if state.metrics.is_none() {
                tracing::debug!("Ignoring headline regeneration, no metrics loaded yet");
                return Ok(None);
            }
            state.metrics_epoch
        };

        let query = self.validate_query(&query)?;
        let guard = InFlightGuard::begin(&self.state, &self.bus, Operation::Regeneration);

        let headline = match self.backend.regenerate_headline(&query).await {
            Ok(headline) => headline,
            Err(e) => {
                tracing::error!("Error regenerating headline: {}", e);
                self.bus.notify(NotificationLevel::Error, REGENERATION_FAILURE);
                return Err(e);
            }
        };

        let updated = {
            let mut state = lock_state(&self.state);
            let fresh = state.metrics_epoch == epoch
                && guard.generation > state.regeneration.applied;
            let updated = match state.metrics.as_ref() {
                Some(current) if fresh => Some(current.with_headline(headline.clone())),
                _ => None,
            };
            if let Some(updated) = &updated {
                state.metrics = Some(updated.clone());
                state.regeneration.applied = guard.generation;
            }
            updated
        };

        let Some(updated) = updated else {
            tracing::warn!(
                "Discarding headline response #{}, superseded by a newer headline or analysis",
                guard.generation
            );
            self.bus.publish(DashboardEvent::ResponseDiscarded {
                operation: Operation::Regeneration,
            });
            return Ok(None);
        };

        tracing::info!("New headline: {:?}", headline);
        self.bus.publish(DashboardEvent::MetricsUpdated(updated));
        self.bus.notify(NotificationLevel::Success, REGENERATION_SUCCESS);
        Ok(Some(headline))
    }

    fn validate_query(&self, query: &BusinessQuery) -> Result<BusinessQuery> {
        let result = validate_non_empty_string("name", &query.name)
            .and_then(|_| validate_non_empty_string("location", &query.location));

        if let Err(e) = result {
            tracing::warn!("Rejected query: {}", e);
            self.bus.notify(NotificationLevel::Warning, VALIDATION_WARNING);
            return Err(e);
        }

        Ok(query.trimmed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::DashboardError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready};

    type Reply<T> = oneshot::Receiver<Result<T>>;

    /// Backend whose answers are handed over by the test, one per call.
    #[derive(Default)]
    struct ScriptedBackend {
        metrics: Mutex<VecDeque<Reply<BusinessMetrics>>>,
        headlines: Mutex<VecDeque<Reply<String>>>,
        metrics_calls: AtomicUsize,
        headline_calls: AtomicUsize,
        last_query: Mutex<Option<BusinessQuery>>,
    }

    impl ScriptedBackend {
        fn next_metrics(&self) -> oneshot::Sender<Result<BusinessMetrics>> {
            let (tx, rx) = oneshot::channel();
            self.metrics.lock().unwrap().push_back(rx);
            tx
        }

        fn next_headline(&self) -> oneshot::Sender<Result<String>> {
            let (tx, rx) = oneshot::channel();
            self.headlines.lock().unwrap().push_back(rx);
            tx
        }

        fn ready_metrics(&self, reply: Result<BusinessMetrics>) {
            let _ = self.next_metrics().send(reply);
        }

        fn ready_headline(&self, reply: Result<String>) {
            let _ = self.next_headline().send(reply);
        }
    }

    #[async_trait]
    impl BusinessBackend for ScriptedBackend {
        async fn fetch_metrics(&self, query: &BusinessQuery) -> Result<BusinessMetrics> {
            self.metrics_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.clone());
            let rx = self
                .metrics
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected fetch_metrics call");
            rx.await.expect("reply dropped")
        }

        async fn regenerate_headline(&self, query: &BusinessQuery) -> Result<String> {
            self.headline_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.clone());
            let rx = self
                .headlines
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected regenerate_headline call");
            rx.await.expect("reply dropped")
        }

        fn describe(&self) -> String {
            "scripted://backend".to_string()
        }
    }

    fn pizza_query() -> BusinessQuery {
        BusinessQuery::new("Joe's Pizza Palace", "New York, NY")
    }

    fn metrics(rating: f64, reviews: u64, headline: &str) -> BusinessMetrics {
        BusinessMetrics {
            rating,
            review_count: reviews,
            headline: headline.to_string(),
        }
    }

    fn offline() -> DashboardError {
        DashboardError::BackendStatusError {
            endpoint: "/business-data".to_string(),
            status: 502,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<DashboardEvent>) -> Vec<DashboardEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn notifications(events: &[DashboardEvent], level: NotificationLevel) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                DashboardEvent::Notification(n) if n.level == level => Some(n.message.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_blank_fields_never_reach_backend() {
        let dashboard = BusinessDashboard::new(ScriptedBackend::default());
        let mut rx = dashboard.subscribe();

        for query in [
            BusinessQuery::new("", "New York, NY"),
            BusinessQuery::new("Joe's Pizza Palace", "   "),
            BusinessQuery::new(" \t", "\n"),
        ] {
            let err = dashboard.submit(query).await.unwrap_err();
            assert!(matches!(err, DashboardError::ValidationError { .. }));
        }

        assert_eq!(dashboard.backend().metrics_calls.load(Ordering::SeqCst), 0);
        let events = drain(&mut rx);
        assert_eq!(notifications(&events, NotificationLevel::Warning).len(), 3);
        assert!(!events
            .iter()
            .any(|e| matches!(e, DashboardEvent::StatusChanged { .. })));
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn test_successful_analysis_populates_metrics() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Ok(metrics(4.3, 1287, "Best Slice in Manhattan")));
        let dashboard = BusinessDashboard::new(backend);
        let mut rx = dashboard.subscribe();

        let result = dashboard
            .submit(BusinessQuery::new("  Joe's Pizza Palace ", "New York, NY "))
            .await
            .unwrap();

        let expected = metrics(4.3, 1287, "Best Slice in Manhattan");
        assert_eq!(result, Some(expected.clone()));
        assert_eq!(dashboard.metrics(), Some(expected.clone()));
        assert_eq!(
            dashboard.backend().last_query.lock().unwrap().clone(),
            Some(pizza_query())
        );

        let events = drain(&mut rx);
        assert_eq!(
            notifications(&events, NotificationLevel::Success),
            vec![ANALYSIS_SUCCESS.to_string()]
        );
        assert_eq!(
            events.first(),
            Some(&DashboardEvent::StatusChanged {
                operation: Operation::Analysis,
                status: RequestStatus::InFlight
            })
        );
        assert_eq!(
            events.last(),
            Some(&DashboardEvent::StatusChanged {
                operation: Operation::Analysis,
                status: RequestStatus::Idle
            })
        );
        assert!(events.contains(&DashboardEvent::MetricsUpdated(expected)));
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_previous_metrics() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Err(offline()));
        backend.ready_metrics(Ok(metrics(4.0, 10, "first")));
        backend.ready_metrics(Err(offline()));
        let dashboard = BusinessDashboard::new(backend);
        let mut rx = dashboard.subscribe();

        assert!(dashboard.submit(pizza_query()).await.is_err());
        assert_eq!(dashboard.metrics(), None);
        let events = drain(&mut rx);
        let errors = notifications(&events, NotificationLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("scripted://backend"));
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::Idle);

        dashboard.submit(pizza_query()).await.unwrap();
        drain(&mut rx);

        assert!(dashboard.submit(pizza_query()).await.is_err());
        assert_eq!(dashboard.metrics(), Some(metrics(4.0, 10, "first")));
        let events = drain(&mut rx);
        assert_eq!(notifications(&events, NotificationLevel::Error).len(), 1);
        assert!(notifications(&events, NotificationLevel::Success).is_empty());
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn test_regenerate_changes_only_headline() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Ok(metrics(4.3, 1287, "Best Slice in Manhattan")));
        backend.ready_headline(Ok("Joe's: NYC's Favorite Pizza Since 1975".to_string()));
        let dashboard = BusinessDashboard::new(backend);
        dashboard.set_query(pizza_query());

        let before = dashboard.analyze().await.unwrap().unwrap();
        let headline = dashboard.regenerate().await.unwrap();
        let after = dashboard.metrics().unwrap();

        assert_eq!(
            headline.as_deref(),
            Some("Joe's: NYC's Favorite Pizza Since 1975")
        );
        assert_eq!(after.headline, "Joe's: NYC's Favorite Pizza Since 1975");
        assert_eq!(after.rating.to_bits(), before.rating.to_bits());
        assert_eq!(after.review_count, before.review_count);
        assert_eq!(dashboard.status(Operation::Regeneration), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn test_regenerate_without_metrics_is_guarded() {
        let dashboard = BusinessDashboard::new(ScriptedBackend::default());
        let mut rx = dashboard.subscribe();

        let result = dashboard.regenerate_headline(pizza_query()).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(dashboard.metrics(), None);
        assert_eq!(dashboard.backend().headline_calls.load(Ordering::SeqCst), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_failed_regenerate_leaves_metrics_untouched() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Ok(metrics(3.9, 88, "Original headline")));
        backend.ready_headline(Err(offline()));
        let dashboard = BusinessDashboard::new(backend);
        dashboard.submit(pizza_query()).await.unwrap();
        let mut rx = dashboard.subscribe();

        assert!(dashboard.regenerate_headline(pizza_query()).await.is_err());

        assert_eq!(dashboard.metrics(), Some(metrics(3.9, 88, "Original headline")));
        let events = drain(&mut rx);
        assert_eq!(
            notifications(&events, NotificationLevel::Error),
            vec![REGENERATION_FAILURE.to_string()]
        );
        assert_eq!(dashboard.status(Operation::Regeneration), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn test_regenerate_validates_query() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Ok(metrics(3.9, 88, "Original headline")));
        let dashboard = BusinessDashboard::new(backend);
        dashboard.submit(pizza_query()).await.unwrap();

        let err = dashboard
            .regenerate_headline(BusinessQuery::new("Joe's Pizza Palace", ""))
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::ValidationError { .. }));
        assert_eq!(dashboard.backend().headline_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_operations_have_independent_status() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Ok(metrics(4.1, 5, "first")));
        let second_analysis = backend.next_metrics();
        let headline = backend.next_headline();
        let dashboard = BusinessDashboard::new(backend);
        assert!(tokio_test::block_on(dashboard.submit(pizza_query())).is_ok());

        let mut analysis = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        let mut regeneration =
            tokio_test::task::spawn(dashboard.regenerate_headline(pizza_query()));
        assert_pending!(analysis.poll());
        assert_pending!(regeneration.poll());
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::InFlight);
        assert_eq!(dashboard.status(Operation::Regeneration), RequestStatus::InFlight);

        headline.send(Ok("fresh headline".to_string())).unwrap();
        let regenerated = assert_ready!(regeneration.poll());
        assert_eq!(regenerated.unwrap().as_deref(), Some("fresh headline"));
        assert_eq!(dashboard.status(Operation::Regeneration), RequestStatus::Idle);
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::InFlight);

        second_analysis.send(Err(offline())).unwrap();
        assert!(assert_ready!(analysis.poll()).is_err());
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::Idle);
        assert_eq!(dashboard.metrics().unwrap().headline, "fresh headline");
    }

    #[test]
    fn test_stale_analysis_response_is_discarded() {
        let backend = ScriptedBackend::default();
        let older = backend.next_metrics();
        let newer = backend.next_metrics();
        let dashboard = BusinessDashboard::new(backend);
        let mut rx = dashboard.subscribe();

        let mut first = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        let mut second = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        newer.send(Ok(metrics(4.8, 200, "newer"))).unwrap();
        let second_result = assert_ready!(second.poll()).unwrap();
        assert_eq!(second_result, Some(metrics(4.8, 200, "newer")));
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::InFlight);

        older.send(Ok(metrics(2.0, 3, "older"))).unwrap();
        let first_result = assert_ready!(first.poll()).unwrap();
        assert_eq!(first_result, None);

        assert_eq!(dashboard.metrics(), Some(metrics(4.8, 200, "newer")));
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::Idle);

        let events = drain(&mut rx);
        assert!(events.contains(&DashboardEvent::ResponseDiscarded {
            operation: Operation::Analysis
        }));
        assert_eq!(notifications(&events, NotificationLevel::Success).len(), 1);
        let status_changes = events
            .iter()
            .filter(|e| matches!(e, DashboardEvent::StatusChanged { .. }))
            .count();
        assert_eq!(status_changes, 2);
    }

    #[test]
    fn test_older_analysis_applies_when_newer_fails() {
        let backend = ScriptedBackend::default();
        let older = backend.next_metrics();
        let newer = backend.next_metrics();
        let dashboard = BusinessDashboard::new(backend);

        let mut first = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        let mut second = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        newer.send(Err(offline())).unwrap();
        assert!(assert_ready!(second.poll()).is_err());

        older.send(Ok(metrics(3.3, 33, "older"))).unwrap();
        assert!(assert_ready!(first.poll()).unwrap().is_some());
        assert_eq!(dashboard.metrics(), Some(metrics(3.3, 33, "older")));
    }

    #[test]
    fn test_older_analysis_applies_while_newer_pending() {
        let backend = ScriptedBackend::default();
        let older = backend.next_metrics();
        let newer = backend.next_metrics();
        let dashboard = BusinessDashboard::new(backend);
        let mut rx = dashboard.subscribe();

        let mut first = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        let mut second = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        older.send(Ok(metrics(2.0, 3, "older"))).unwrap();
        let first_result = assert_ready!(first.poll()).unwrap();
        assert_eq!(first_result, Some(metrics(2.0, 3, "older")));
        assert_eq!(dashboard.metrics(), Some(metrics(2.0, 3, "older")));
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::InFlight);

        newer.send(Ok(metrics(4.8, 200, "newer"))).unwrap();
        let second_result = assert_ready!(second.poll()).unwrap();
        assert_eq!(second_result, Some(metrics(4.8, 200, "newer")));
        assert_eq!(dashboard.metrics(), Some(metrics(4.8, 200, "newer")));
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::Idle);

        let events = drain(&mut rx);
        assert!(!events
            .iter()
            .any(|e| matches!(e, DashboardEvent::ResponseDiscarded { .. })));
        assert_eq!(notifications(&events, NotificationLevel::Success).len(), 2);
    }

    #[test]
    fn test_stale_headline_response_is_discarded() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Ok(metrics(4.2, 61, "original")));
        let older = backend.next_headline();
        let newer = backend.next_headline();
        let dashboard = BusinessDashboard::new(backend);
        assert!(tokio_test::block_on(dashboard.submit(pizza_query())).is_ok());
        let mut rx = dashboard.subscribe();

        let mut first = tokio_test::task::spawn(dashboard.regenerate_headline(pizza_query()));
        let mut second = tokio_test::task::spawn(dashboard.regenerate_headline(pizza_query()));
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        newer.send(Ok("new".to_string())).unwrap();
        assert_eq!(
            assert_ready!(second.poll()).unwrap().as_deref(),
            Some("new")
        );
        assert_eq!(dashboard.status(Operation::Regeneration), RequestStatus::InFlight);

        older.send(Ok("old".to_string())).unwrap();
        assert_eq!(assert_ready!(first.poll()).unwrap(), None);

        let current = dashboard.metrics().unwrap();
        assert_eq!(current.headline, "new");
        assert_eq!(current.review_count, 61);
        assert_eq!(dashboard.status(Operation::Regeneration), RequestStatus::Idle);

        let events = drain(&mut rx);
        assert!(events.contains(&DashboardEvent::ResponseDiscarded {
            operation: Operation::Regeneration
        }));
        assert_eq!(notifications(&events, NotificationLevel::Success).len(), 1);
    }

    #[test]
    fn test_headline_discarded_after_metrics_replaced() {
        let backend = ScriptedBackend::default();
        backend.ready_metrics(Ok(metrics(4.0, 40, "first")));
        let headline = backend.next_headline();
        backend.ready_metrics(Ok(metrics(4.9, 90, "second")));
        let dashboard = BusinessDashboard::new(backend);
        assert!(tokio_test::block_on(dashboard.submit(pizza_query())).is_ok());

        let mut regeneration =
            tokio_test::task::spawn(dashboard.regenerate_headline(pizza_query()));
        assert_pending!(regeneration.poll());

        assert!(tokio_test::block_on(dashboard.submit(pizza_query())).is_ok());

        headline.send(Ok("for the old metrics".to_string())).unwrap();
        assert_eq!(assert_ready!(regeneration.poll()).unwrap(), None);
        assert_eq!(dashboard.metrics(), Some(metrics(4.9, 90, "second")));
        assert_eq!(dashboard.status(Operation::Regeneration), RequestStatus::Idle);
    }

    #[test]
    fn test_dropped_request_returns_status_to_idle() {
        let backend = ScriptedBackend::default();
        let _pending = backend.next_metrics();
        let dashboard = BusinessDashboard::new(backend);

        let mut analysis = tokio_test::task::spawn(dashboard.submit(pizza_query()));
        assert_pending!(analysis.poll());
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::InFlight);

        drop(analysis);
        assert_eq!(dashboard.status(Operation::Analysis), RequestStatus::Idle);
    }
}
