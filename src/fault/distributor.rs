//! Fault Distributor
//!
//! Asynchronous fault bus for one node.
//!
//! Reporters queue faults; one dedicated worker drains the queue, groups the
//! batch by kind, and hands each kind's faults to the registered handlers in
//! ascending priority order. Kinds nobody registered for fall back to the
//! `Unknown` handlers, and if there are none, to a default handler that
//! crashes the node.
//!
//! Dispatch round:
//! 1. Drain the whole pending queue
//! 2. If the partition latch is set, drop the batch
//! 3. Group by kind, dropping same-batch duplicates
//! 4. Deliver reports, then clears, handler by handler
//!
//! Handlers run outside the registry lock, so they may register handlers,
//! acknowledge faults, report new faults, or make a partition decision
//! while they run.
//!
//! A handler error or panic is fatal: it is logged, the crash primitive is
//! invoked, and the worker stops.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::default_handler::DefaultFaultHandler;
use super::errors::{FaultError, FaultResult};
use super::handler::{priority, FaultBatch, FaultHandler, HandlerId};
use super::queue::{FaultEvent, PendingFaultQueue, WaitOutcome};
use super::registry::{HandlerRegistry, RegisteredHandler};
use super::types::{Fault, FaultKind};
use crate::config::PartitionDetectionConfig;
use crate::crash::CrashHandler;
use crate::membership::ids::join_ids;
use crate::membership::{HostId, MembershipView, SiteId};
use crate::observability::{log_event_with_fields, Event, FaultMetrics, FaultMetricsSnapshot, Logger};
use crate::partition::{
    test_partition_detection_directory, PartitionAnalysis, PartitionPolicy, PartitionVerdict,
    SnapshotDirError,
};

/// State of the dispatch worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for faults or shutdown
    Idle,
    /// Draining and invoking handlers
    Processing,
    /// Terminal
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notification {
    Occurred,
    Cleared,
}

/// One handler call planned for a dispatch round.
struct Delivery {
    registration: RegisteredHandler,
    kind: FaultKind,
    faults: HashSet<Fault>,
}

/// Bookkeeping guarded by the registry lock.
#[derive(Default)]
struct DistributorState {
    registry: HandlerRegistry,
    acknowledged: HashMap<HandlerId, HashSet<Fault>>,
}

/// Everything the worker shares with the public handle.
struct Shared {
    id: Uuid,
    queue: PendingFaultQueue,
    state: Mutex<DistributorState>,
    partition_triggered: AtomicBool,
    dispatch_state: Mutex<DispatchState>,
    /// Signalled on every dispatch state change
    state_changed: Condvar,
    metrics: FaultMetrics,
    crash: Arc<dyn CrashHandler>,
    policy: PartitionPolicy,
    partition_config: PartitionDetectionConfig,
}

/// The fault bus of one node.
pub struct FaultDistributor {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_thread: ThreadId,
}

impl FaultDistributor {
    /// Start a distributor and its dispatch worker.
    ///
    /// The partition detection flag is read here, once.
    pub fn new(
        partition_config: PartitionDetectionConfig,
        crash: Arc<dyn CrashHandler>,
    ) -> FaultResult<Self> {
        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            queue: PendingFaultQueue::new(),
            state: Mutex::new(DistributorState::default()),
            partition_triggered: AtomicBool::new(false),
            dispatch_state: Mutex::new(DispatchState::Idle),
            state_changed: Condvar::new(),
            metrics: FaultMetrics::new(),
            crash,
            policy: PartitionPolicy::new(partition_config.enabled),
            partition_config,
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("fault-distributor".to_string())
            .spawn(move || worker_shared.run())
            .map_err(FaultError::WorkerSpawn)?;

        Ok(Self {
            shared,
            worker_thread: handle.thread().id(),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Instance id, included in this distributor's log lines.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    // =========================================================================
    // REPORTING
    // =========================================================================

    /// Queue a fault for dispatch. Never waits on handlers and never logs;
    /// the worker logs the fault when it drains it.
    ///
    /// Faults reported after the partition latch is set are accepted but
    /// never reach a handler.
    pub fn report_fault(&self, fault: impl Into<Fault>) -> FaultResult<()> {
        if !self.shared.queue.offer(FaultEvent::Reported(fault.into())) {
            return Err(FaultError::ShutDown);
        }
        self.shared.metrics.increment_faults_reported();
        Ok(())
    }

    /// Queue a clear: the fault no longer applies.
    ///
    /// On dispatch, every handler forgets having acknowledged it and the
    /// handlers for its kind receive `fault_cleared`.
    pub fn report_fault_cleared(&self, fault: impl Into<Fault>) -> FaultResult<()> {
        if !self.shared.queue.offer(FaultEvent::Cleared(fault.into())) {
            return Err(FaultError::ShutDown);
        }
        self.shared.metrics.increment_clears_reported();
        Ok(())
    }

    /// Record that registration `handler` has dealt with `fault`.
    ///
    /// Equal faults reported later are not delivered to that registration
    /// again until the fault is cleared.
    pub fn report_fault_handled(&self, handler: HandlerId, fault: &Fault) -> FaultResult<()> {
        let mut state = self.shared.lock_state();
        if !state.registry.contains(handler) {
            return Err(FaultError::UnknownHandler(handler));
        }
        self.shared
            .record_acknowledged(&mut state, handler, std::iter::once(fault.clone()));
        Ok(())
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register `handler` at `priority` for each kind in `kinds`.
    ///
    /// Lower priorities run first. Handlers sharing a priority run in
    /// registration order.
    pub fn register_fault_handler(
        &self,
        priority: i32,
        handler: Arc<dyn FaultHandler>,
        kinds: &[FaultKind],
    ) -> HandlerId {
        let name = handler.name().to_string();
        let id = self.shared.lock_state().registry.register(priority, handler, kinds);

        let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        log_event_with_fields(
            Event::HandlerRegistered,
            &[
                ("handler", &name),
                ("handler_id", &id.to_string()),
                ("kinds", &kinds.join(",")),
                ("priority", &priority.to_string()),
            ],
        );
        id
    }

    /// Register a catch-all handler under `Unknown`.
    ///
    /// It sees every fault whose kind has no registration of its own. Once
    /// one exists the built-in crash handler is never installed.
    pub fn register_default_handler(&self, handler: Arc<dyn FaultHandler>) -> HandlerId {
        self.register_fault_handler(priority::DEFAULT_HANDLER, handler, &[FaultKind::Unknown])
    }

    // =========================================================================
    // PARTITION POLICY
    // =========================================================================

    /// Decide whether the failure of `failed_sites` leaves this node on the
    /// surviving side of the cluster.
    ///
    /// A `PartitionDetection` verdict sets the partition latch for good:
    /// no fault is dispatched to any handler afterwards.
    pub fn make_partition_policy_decision<V: MembershipView + ?Sized>(
        &self,
        failed_sites: &BTreeSet<SiteId>,
        view: &V,
    ) -> PartitionVerdict {
        self.analyze_partition(failed_sites, view).verdict
    }

    /// Same as [`make_partition_policy_decision`](Self::make_partition_policy_decision),
    /// returning the full analysis.
    pub fn analyze_partition<V: MembershipView + ?Sized>(
        &self,
        failed_sites: &BTreeSet<SiteId>,
        view: &V,
    ) -> PartitionAnalysis<HostId> {
        let analysis = self.shared.policy.evaluate(failed_sites, view);
        self.shared.metrics.increment_partition_decisions();

        let fields = [
            ("distributor", self.shared.id.to_string()),
            ("failed_hosts", join_ids(&analysis.failed_hosts)),
            ("failed_sites", join_ids(failed_sites)),
            ("previous_cluster_size", analysis.previous_cluster_size.to_string()),
            ("reason", format!("{:?}", analysis.reason)),
            ("verdict", analysis.verdict.as_str().to_string()),
        ];
        let fields: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        log_event_with_fields(Event::PartitionDecision, &fields);

        // A delivery already past its latch check still runs to completion.
        if analysis.verdict.is_partition()
            && !self.shared.partition_triggered.swap(true, Ordering::SeqCst)
        {
            self.shared.metrics.increment_partitions_detected();
            log_event_with_fields(Event::PartitionDetected, &fields);
        }
        analysis
    }

    /// Whether a partition verdict has been reached. Never resets.
    pub fn is_partition_triggered(&self) -> bool {
        self.shared.is_partition_triggered()
    }

    /// Whether the partition policy is applied.
    pub fn partition_detection_enabled(&self) -> bool {
        self.shared.policy.is_enabled()
    }

    /// Verify the configured partition snapshot directory.
    ///
    /// Always passes when partition detection is disabled.
    pub fn test_partition_detection_directory(&self) -> Result<(), SnapshotDirError> {
        let config = &self.shared.partition_config;
        if !config.enabled {
            return Ok(());
        }
        let path = config
            .snapshot_path
            .as_deref()
            .ok_or(SnapshotDirError::NotConfigured);
        let result = path.and_then(|path| {
            test_partition_detection_directory(path)?;
            Ok(path)
        });

        match result {
            Ok(path) => {
                log_event_with_fields(
                    Event::SnapshotDirVerified,
                    &[("path", &path.display().to_string())],
                );
                Ok(())
            }
            Err(err) => {
                Logger::error(Event::SnapshotDirInvalid.as_str(), &[("error", &err.to_string())]);
                Err(err)
            }
        }
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Current worker state.
    pub fn dispatch_state(&self) -> DispatchState {
        self.shared.dispatch_state()
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> FaultMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Events queued but not yet drained.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Wait until the queue is empty and the worker is idle, or stopped.
    ///
    /// Returns false on timeout.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock_dispatch_state();
        loop {
            if *state == DispatchState::ShuttingDown
                || (*state == DispatchState::Idle && self.shared.queue.is_empty())
            {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .shared
                .state_changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    /// Stop the worker.
    ///
    /// A handler already running is allowed to finish; queued faults are
    /// abandoned. When this returns, no handler will be invoked again.
    /// Idempotent. Called from inside a handler it only signals the worker,
    /// which stops once that handler returns.
    pub fn shut_down(&self) {
        if thread::current().id() == self.worker_thread {
            self.shared.queue.request_shutdown();
            return;
        }

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = worker.take() else {
            return;
        };

        let distributor = self.shared.id.to_string();
        log_event_with_fields(Event::ShutdownStart, &[("distributor", &distributor)]);
        self.shared.queue.request_shutdown();
        if handle.join().is_err() {
            Logger::error(
                "FAULT_DISTRIBUTOR_WORKER_PANICKED",
                &[("distributor", &distributor)],
            );
        }
        log_event_with_fields(Event::ShutdownComplete, &[("distributor", &distributor)]);
    }
}

impl Drop for FaultDistributor {
    fn drop(&mut self) {
        self.shut_down();
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, DistributorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_partition_triggered(&self) -> bool {
        self.partition_triggered.load(Ordering::SeqCst)
    }

    fn lock_dispatch_state(&self) -> MutexGuard<'_, DispatchState> {
        self.dispatch_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch_state(&self) -> DispatchState {
        *self.lock_dispatch_state()
    }

    fn set_dispatch_state(&self, state: DispatchState) {
        *self.lock_dispatch_state() = state;
        self.state_changed.notify_all();
    }

    fn run(self: Arc<Self>) {
        log_event_with_fields(Event::DistributorStart, &[("distributor", &self.id.to_string())]);
        loop {
            self.set_dispatch_state(DispatchState::Idle);
            if self.queue.wait_for_work() == WaitOutcome::Shutdown {
                break;
            }
            self.set_dispatch_state(DispatchState::Processing);

            let batch = self.queue.drain_all();
            if batch.is_empty() {
                continue;
            }
            if let Err(err) = self.process_batch(batch) {
                self.fail(err);
                break;
            }
        }
        self.set_dispatch_state(DispatchState::ShuttingDown);
    }

    /// Fatal path: log, stop accepting faults, crash.
    fn fail(&self, err: FaultError) {
        self.metrics.increment_handler_failures();
        self.queue.request_shutdown();
        log_event_with_fields(
            Event::HandlerFailed,
            &[("distributor", &self.id.to_string()), ("error", &err.to_string())],
        );
        self.crash
            .crash_local_node("fault handler failed", true, Some(&err));
    }

    fn process_batch(&self, batch: Vec<FaultEvent>) -> FaultResult<()> {
        if self.is_partition_triggered() {
            self.metrics.increment_batches_suppressed();
            log_event_with_fields(
                Event::DispatchSuppressed,
                &[("events", &batch.len().to_string())],
            );
            return Ok(());
        }

        let (reported, cleared) = self.organize(batch);
        self.metrics.increment_batches_dispatched();

        let round = Uuid::new_v4().to_string();
        log_event_with_fields(
            Event::DispatchBegin,
            &[
                ("cleared_kinds", &reported_kinds(&cleared)),
                ("reported_kinds", &reported_kinds(&reported)),
                ("round", &round),
            ],
        );

        let deliveries = self.plan_reported(&reported);
        self.deliver(deliveries, Notification::Occurred)?;

        let deliveries = self.plan_cleared(&cleared);
        self.deliver(deliveries, Notification::Cleared)?;

        log_event_with_fields(Event::DispatchComplete, &[("round", &round)]);
        Ok(())
    }

    /// Group reports and clears by kind. Same-batch duplicates are dropped.
    fn organize(
        &self,
        batch: Vec<FaultEvent>,
    ) -> (BTreeMap<FaultKind, HashSet<Fault>>, BTreeMap<FaultKind, HashSet<Fault>>) {
        let mut reported: BTreeMap<FaultKind, HashSet<Fault>> = BTreeMap::new();
        let mut cleared: BTreeMap<FaultKind, HashSet<Fault>> = BTreeMap::new();

        for event in batch {
            let (target, logged_as, fault) = match event {
                FaultEvent::Reported(fault) => (&mut reported, Event::FaultReported, fault),
                FaultEvent::Cleared(fault) => (&mut cleared, Event::FaultClearReported, fault),
            };
            let kind = fault.kind();
            log_event_with_fields(
                logged_as,
                &[("description", &fault.to_string()), ("kind", kind.as_str())],
            );
            if !target.entry(kind).or_default().insert(fault) {
                self.metrics.increment_duplicates_dropped();
                Logger::trace(
                    Event::DuplicateFaultDropped.as_str(),
                    &[("kind", kind.as_str())],
                );
            }
        }
        (reported, cleared)
    }

    fn plan_reported(&self, reported: &BTreeMap<FaultKind, HashSet<Fault>>) -> Vec<Delivery> {
        let mut state = self.lock_state();
        let mut deliveries = Vec::new();

        for (kind, faults) in reported {
            let handlers = match state.registry.handlers_for(*kind) {
                Some(handlers) => handlers,
                None => {
                    self.install_default_handler(&mut state);
                    state.registry.handlers_for(*kind).unwrap_or_default()
                }
            };

            for registration in handlers {
                let unacknowledged: HashSet<Fault> = match state.acknowledged.get(&registration.id) {
                    Some(acked) => faults.difference(acked).cloned().collect(),
                    None => faults.clone(),
                };
                if !unacknowledged.is_empty() {
                    deliveries.push(Delivery {
                        registration,
                        kind: *kind,
                        faults: unacknowledged,
                    });
                }
            }
        }
        deliveries
    }

    fn plan_cleared(&self, cleared: &BTreeMap<FaultKind, HashSet<Fault>>) -> Vec<Delivery> {
        let mut state = self.lock_state();
        let mut deliveries = Vec::new();

        for (kind, faults) in cleared {
            for acked in state.acknowledged.values_mut() {
                acked.retain(|fault| !faults.contains(fault));
            }
            let Some(handlers) = state.registry.handlers_for(*kind) else {
                continue;
            };
            for registration in handlers {
                deliveries.push(Delivery {
                    registration,
                    kind: *kind,
                    faults: faults.clone(),
                });
            }
        }
        deliveries
    }

    fn install_default_handler(&self, state: &mut DistributorState) {
        let handler = Arc::new(DefaultFaultHandler::new(Arc::clone(&self.crash)));
        let id = state
            .registry
            .register(priority::DEFAULT_HANDLER, handler, &[FaultKind::Unknown]);
        log_event_with_fields(
            Event::DefaultHandlerInstalled,
            &[("distributor", &self.id.to_string()), ("handler_id", &id.to_string())],
        );
    }

    fn deliver(&self, deliveries: Vec<Delivery>, notification: Notification) -> FaultResult<()> {
        for delivery in deliveries {
            // A handler earlier in this round may have reached a partition verdict.
            if self.is_partition_triggered() {
                self.metrics.increment_batches_suppressed();
                log_event_with_fields(
                    Event::DispatchSuppressed,
                    &[("kind", delivery.kind.as_str())],
                );
                return Ok(());
            }

            let acknowledged = self.invoke(&delivery, notification)?;
            if !acknowledged.is_empty() {
                let mut state = self.lock_state();
                self.record_acknowledged(&mut state, delivery.registration.id, acknowledged);
            }
        }
        Ok(())
    }

    fn invoke(&self, delivery: &Delivery, notification: Notification) -> FaultResult<Vec<Fault>> {
        self.metrics.increment_handler_invocations();
        let handler = &delivery.registration.handler;
        let batch = FaultBatch::new(delivery.registration.id, delivery.kind, &delivery.faults);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match notification {
            Notification::Occurred => handler.fault_occurred(&batch),
            Notification::Cleared => handler.fault_cleared(&batch),
        }));

        match outcome {
            Ok(Ok(())) => Ok(batch.into_acknowledged()),
            // Cut short by a shutdown requested while it ran; not a failure.
            Ok(Err(FaultError::ShutDown)) if self.queue.is_shut_down() => {
                log_event_with_fields(
                    Event::HandlerStoppedByShutdown,
                    &[
                        ("handler", handler.name()),
                        ("handler_id", &delivery.registration.id.to_string()),
                        ("kind", delivery.kind.as_str()),
                    ],
                );
                Ok(Vec::new())
            }
            Ok(Err(err)) if err.is_fatal() => Err(err),
            Ok(Err(err)) => Err(FaultError::handler_failed(
                handler.name(),
                delivery.kind,
                err.to_string(),
            )),
            Err(payload) => Err(FaultError::HandlerPanicked {
                handler: handler.name().to_string(),
                kind: delivery.kind,
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    fn record_acknowledged(
        &self,
        state: &mut DistributorState,
        handler: HandlerId,
        faults: impl IntoIterator<Item = Fault>,
    ) {
        let acked = state.acknowledged.entry(handler).or_default();
        let mut count = 0usize;
        for fault in faults {
            acked.insert(fault);
            count += 1;
        }
        Logger::trace(
            Event::FaultHandled.as_str(),
            &[("count", &count.to_string()), ("handler_id", &handler.to_string())],
        );
    }
}

fn reported_kinds(by_kind: &BTreeMap<FaultKind, HashSet<Fault>>) -> String {
    let kinds: Vec<String> = by_kind
        .iter()
        .map(|(kind, faults)| format!("{}={}", kind, faults.len()))
        .collect();
    kinds.join(",")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crash::RecordingCrash;
    use crate::fault::errors::HandlerResult;
    use crate::membership::ClusterMembership;

    const WAIT: Duration = Duration::from_secs(5);

    /// Records every batch it receives as `name:count`.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        acknowledge: bool,
    }

    impl FaultHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn fault_occurred(&self, batch: &FaultBatch<'_>) -> HandlerResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, batch.len()));
            if self.acknowledge {
                batch.acknowledge_all();
            }
            Ok(())
        }

        fn fault_cleared(&self, batch: &FaultBatch<'_>) -> HandlerResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:cleared:{}", self.name, batch.len()));
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>, acknowledge: bool) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            log: Arc::clone(log),
            acknowledge,
        })
    }

    fn distributor(crash: &RecordingCrash) -> FaultDistributor {
        FaultDistributor::new(PartitionDetectionConfig::enabled("/tmp"), Arc::new(crash.clone()))
            .unwrap()
    }

    #[test]
    fn test_starts_idle() {
        let crash = RecordingCrash::new();
        let distributor = distributor(&crash);
        assert!(distributor.wait_for_idle(WAIT));
        assert_eq!(distributor.dispatch_state(), DispatchState::Idle);
        assert!(!distributor.is_partition_triggered());
    }

    #[test]
    fn test_acknowledged_fault_not_redelivered() {
        let crash = RecordingCrash::new();
        let distributor = distributor(&crash);
        let log = Arc::new(Mutex::new(Vec::new()));
        distributor.register_fault_handler(1, recorder("ack", &log, true), &[FaultKind::NodeFailure]);
        distributor.register_fault_handler(2, recorder("noack", &log, false), &[FaultKind::NodeFailure]);

        distributor.report_fault(Fault::node_failure(HostId(1), "a")).unwrap();
        assert!(distributor.wait_for_idle(WAIT));
        distributor.report_fault(Fault::node_failure(HostId(1), "a")).unwrap();
        assert!(distributor.wait_for_idle(WAIT));

        assert_eq!(*log.lock().unwrap(), ["ack:1", "noack:1", "noack:1"]);
    }

    #[test]
    fn test_clear_forgets_acknowledgement() {
        let crash = RecordingCrash::new();
        let distributor = distributor(&crash);
        let log = Arc::new(Mutex::new(Vec::new()));
        distributor.register_fault_handler(1, recorder("h", &log, true), &[FaultKind::NodeFailure]);

        let fault = Fault::node_failure(HostId(4), "d");
        distributor.report_fault(fault.clone()).unwrap();
        assert!(distributor.wait_for_idle(WAIT));
        distributor.report_fault_cleared(fault.clone()).unwrap();
        assert!(distributor.wait_for_idle(WAIT));
        distributor.report_fault(fault).unwrap();
        assert!(distributor.wait_for_idle(WAIT));

        assert_eq!(*log.lock().unwrap(), ["h:1", "h:cleared:1", "h:1"]);
    }

    #[test]
    fn test_report_fault_handled_from_outside() {
        let crash = RecordingCrash::new();
        let distributor = distributor(&crash);
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = distributor.register_fault_handler(1, recorder("h", &log, false), &[FaultKind::SiteFailure]);

        let fault = Fault::site_failure([SiteId(5)]);
        distributor.report_fault_handled(id, &fault).unwrap();
        distributor.report_fault(fault).unwrap();
        assert!(distributor.wait_for_idle(WAIT));

        assert!(log.lock().unwrap().is_empty());
        assert!(matches!(
            distributor.report_fault_handled(HandlerId(99), &Fault::unknown("x")),
            Err(FaultError::UnknownHandler(HandlerId(99)))
        ));
    }

    #[test]
    fn test_report_after_shutdown_is_rejected() {
        let crash = RecordingCrash::new();
        let distributor = distributor(&crash);
        distributor.shut_down();
        distributor.shut_down();

        assert_eq!(distributor.dispatch_state(), DispatchState::ShuttingDown);
        assert!(matches!(
            distributor.report_fault(Fault::unknown("late")),
            Err(FaultError::ShutDown)
        ));
    }

    #[test]
    fn test_partition_latch_is_counted_once() {
        let crash = RecordingCrash::new();
        let distributor = distributor(&crash);
        let mut membership = ClusterMembership::uniform((0..2).map(HostId), 1);
        membership.mark_host_failed(HostId(0));
        let failed: BTreeSet<SiteId> = [SiteId(0)].into_iter().collect();

        for _ in 0..2 {
            assert_eq!(
                distributor.make_partition_policy_decision(&failed, &membership),
                PartitionVerdict::PartitionDetection
            );
        }
        let metrics = distributor.metrics();
        assert_eq!(metrics.partition_decisions, 2);
        assert_eq!(metrics.partitions_detected, 1);
    }

    #[test]
    fn test_snapshot_directory_check_disabled_passes() {
        let crash = RecordingCrash::new();
        let distributor =
            FaultDistributor::new(PartitionDetectionConfig::disabled(), Arc::new(crash)).unwrap();
        assert!(distributor.test_partition_detection_directory().is_ok());
        assert!(!distributor.partition_detection_enabled());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
