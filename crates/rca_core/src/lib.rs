//! RCA request lifecycle controller: owns the currently selected shipment,
//! drives the remote analysis call, and guarantees a report within the wait
//! budget by synthesizing one locally when the engine is slow or failing.

use std::{sync::Arc, time::Duration};

use catalog::ShipmentCatalog;
use chrono::{DateTime, Utc};
use shared::{
    domain::{AnalysisResult, ReportSource, Shipment, ShipmentId},
    protocol::GenerateReportRequest,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod config;
pub mod engine;

use engine::AnalysisEngine;

/// How long an analysis request may stay in flight before the controller
/// resolves it with a synthesized report. The engine is an opaque workflow
/// runner with no latency contract, so the budget is a deliberate product
/// choice rather than a measured value.
pub const ANALYSIS_WAIT_BUDGET: Duration = Duration::from_secs(8);

/// Placeholder cause used when a shipment record carries no `root_cause`.
pub const FALLBACK_ROOT_CAUSE: &str = "unexpected congestion along the route";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcaState {
    Idle,
    SelectingShipment,
    Analyzing,
    Completed,
}

/// The single in-flight analysis. Replaced on a new selection, cleared on
/// reset; a resolution carrying a stale `request_id` is dropped.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub shipment: Shipment,
    pub issued_at: DateTime<Utc>,
    request_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("shipment '{0}' is not part of the loaded catalog")]
    InvalidSelection(ShipmentId),
    #[error("'{operation}' is not defined in state {state:?}")]
    InvalidTransition {
        operation: &'static str,
        state: RcaState,
    },
}

/// Lifecycle notifications for the presentation layer.
#[derive(Debug, Clone)]
pub enum RcaEvent {
    StateChanged(RcaState),
    ReportReady(AnalysisResult),
}

struct ControllerState {
    state: RcaState,
    request: Option<AnalysisRequest>,
    result: Option<AnalysisResult>,
    next_request_id: u64,
}

/// Single-user, single-flight state machine over
/// `Idle -> SelectingShipment -> Analyzing -> Completed`.
///
/// Callers serialize their own interaction; internally the only suspension
/// point per request is the race between the engine call and the wait
/// budget. Failure never escapes: the worst case is a `Synthesized` report.
pub struct RcaController {
    catalog: Arc<ShipmentCatalog>,
    engine: Arc<dyn AnalysisEngine>,
    wait_budget: Duration,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<RcaEvent>,
}

impl RcaController {
    pub fn new(catalog: Arc<ShipmentCatalog>, engine: Arc<dyn AnalysisEngine>) -> Arc<Self> {
        Self::with_wait_budget(catalog, engine, ANALYSIS_WAIT_BUDGET)
    }

    pub fn with_wait_budget(
        catalog: Arc<ShipmentCatalog>,
        engine: Arc<dyn AnalysisEngine>,
        wait_budget: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            catalog,
            engine,
            wait_budget,
            inner: Mutex::new(ControllerState {
                state: RcaState::Idle,
                request: None,
                result: None,
                next_request_id: 0,
            }),
            events,
        })
    }

    pub async fn state(&self) -> RcaState {
        self.inner.lock().await.state
    }

    pub async fn current_request(&self) -> Option<AnalysisRequest> {
        self.inner.lock().await.request.clone()
    }

    pub async fn current_result(&self) -> Option<AnalysisResult> {
        self.inner.lock().await.result.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RcaEvent> {
        self.events.subscribe()
    }

    /// Shipments currently offered for selection; whatever the catalog holds,
    /// which is an empty set when the load failed at startup.
    pub fn candidates(&self) -> impl Iterator<Item = &Shipment> + '_ {
        self.catalog.list()
    }

    /// `Idle -> SelectingShipment`. No side effect beyond the state change.
    pub async fn begin(&self) -> Result<(), ControllerError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != RcaState::Idle {
                return Err(ControllerError::InvalidTransition {
                    operation: "begin",
                    state: inner.state,
                });
            }
            inner.state = RcaState::SelectingShipment;
        }
        let _ = self
            .events
            .send(RcaEvent::StateChanged(RcaState::SelectingShipment));
        Ok(())
    }

    /// `SelectingShipment -> Analyzing`. Creates a fresh [`AnalysisRequest`]
    /// and spawns exactly one outbound engine call; returns without blocking
    /// on it.
    pub async fn select(
        self: &Arc<Self>,
        shipment_id: &ShipmentId,
    ) -> Result<(), ControllerError> {
        let request = {
            let mut inner = self.inner.lock().await;
            if inner.state != RcaState::SelectingShipment {
                return Err(ControllerError::InvalidTransition {
                    operation: "select",
                    state: inner.state,
                });
            }
            let shipment = self
                .catalog
                .get(shipment_id)
                .cloned()
                .ok_or_else(|| ControllerError::InvalidSelection(shipment_id.clone()))?;

            let request = AnalysisRequest {
                shipment,
                issued_at: Utc::now(),
                request_id: inner.next_request_id,
            };
            inner.next_request_id += 1;
            inner.state = RcaState::Analyzing;
            inner.request = Some(request.clone());
            inner.result = None;
            request
        };

        let _ = self.events.send(RcaEvent::StateChanged(RcaState::Analyzing));
        info!(
            shipment_id = %request.shipment.shipment_id,
            "rca: analysis request issued"
        );

        let controller = Arc::clone(self);
        tokio::spawn(controller.run_analysis(request));
        Ok(())
    }

    /// Back to `Idle`, dropping the current request and result. Valid from
    /// every state except `Idle`; a reset during `Analyzing` leaves the
    /// network task running and discards its eventual result.
    pub async fn reset(&self) -> Result<(), ControllerError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state == RcaState::Idle {
                return Err(ControllerError::InvalidTransition {
                    operation: "reset",
                    state: RcaState::Idle,
                });
            }
            if inner.state == RcaState::Analyzing {
                info!("rca: reset during analysis; the in-flight result will be discarded");
            }
            inner.state = RcaState::Idle;
            inner.request = None;
            inner.result = None;
        }
        let _ = self.events.send(RcaEvent::StateChanged(RcaState::Idle));
        Ok(())
    }

    async fn run_analysis(self: Arc<Self>, request: AnalysisRequest) {
        let call = GenerateReportRequest::new(request.shipment.clone(), request.issued_at);
        let outcome =
            tokio::time::timeout(self.wait_budget, self.engine.generate_report(&call)).await;

        let result = match outcome {
            Ok(Ok(response)) => AnalysisResult {
                report_text: response.report_text(),
                source: ReportSource::Remote,
            },
            Ok(Err(err)) => {
                warn!(
                    shipment_id = %request.shipment.shipment_id,
                    "rca: engine call failed, synthesizing report: {err:#}"
                );
                AnalysisResult {
                    report_text: synthesize_report(&request.shipment),
                    source: ReportSource::Synthesized,
                }
            }
            Err(_) => {
                warn!(
                    shipment_id = %request.shipment.shipment_id,
                    wait_budget_ms = self.wait_budget.as_millis() as u64,
                    "rca: engine call exceeded the wait budget, synthesizing report"
                );
                AnalysisResult {
                    report_text: synthesize_report(&request.shipment),
                    source: ReportSource::Synthesized,
                }
            }
        };

        self.resolve(request.request_id, result).await;
    }

    /// `Analyzing -> Completed`, first settlement wins. A resolution for a
    /// request that was superseded or reset away is dropped silently.
    async fn resolve(&self, request_id: u64, result: AnalysisResult) {
        {
            let mut inner = self.inner.lock().await;
            let is_current = inner.state == RcaState::Analyzing
                && inner
                    .request
                    .as_ref()
                    .is_some_and(|request| request.request_id == request_id);
            if !is_current {
                info!(request_id, "rca: dropping resolution for a superseded analysis request");
                return;
            }
            inner.state = RcaState::Completed;
            inner.result = Some(result.clone());
        }
        let _ = self.events.send(RcaEvent::StateChanged(RcaState::Completed));
        let _ = self.events.send(RcaEvent::ReportReady(result));
    }
}

/// Deterministic local report used when the engine fails or times out. Built
/// only from fields the catalog already holds.
pub fn synthesize_report(shipment: &Shipment) -> String {
    let root_cause = shipment.root_cause.as_deref().unwrap_or(FALLBACK_ROOT_CAUSE);
    format!(
        "Root-cause analysis for shipment {}: arrival planned for {} slipped by {} minutes. Most likely cause: {}.",
        shipment.shipment_id,
        shipment.planned_arrival_date(),
        shipment.delay_minutes,
        root_cause
    )
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
