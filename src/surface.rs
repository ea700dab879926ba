use crate::transaction::{Receipt, Summary};
use std::sync::{Arc, Mutex, PoisonError};

/// Status tag pushed to the Processing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Processing,
    Success,
    Failed,
}

/// Pure-view contract between the orchestrator and the presentation
/// layer. Surfaces render state and relay user intent back through the
/// orchestrator's own API; they make no business decisions, and the
/// double-confirm guard lives in the orchestrator, not here.
pub trait Surface {
    fn show_confirmation(&mut self, summary: &Summary);
    fn show_status(&mut self, status: ProcessingStatus, receipt: Option<&Receipt>);
}

/// Surface that renders nothing. Default for headless use.
#[derive(Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn show_confirmation(&mut self, _summary: &Summary) {}
    fn show_status(&mut self, _status: ProcessingStatus, _receipt: Option<&Receipt>) {}
}

/// Renders confirmations and settlement progress to stderr, keeping
/// stdout free for receipts. The binary's surface.
#[derive(Default)]
pub struct StderrSurface;

impl Surface for StderrSurface {
    fn show_confirmation(&mut self, summary: &Summary) {
        match &summary.customer_name {
            Some(name) => eprintln!(
                "confirm {} for {} ({}) | total {}",
                summary.product_name, summary.target, name, summary.total
            ),
            None => eprintln!(
                "confirm {} for {} | total {}",
                summary.product_name, summary.target, summary.total
            ),
        }
    }

    fn show_status(&mut self, status: ProcessingStatus, receipt: Option<&Receipt>) {
        match status {
            ProcessingStatus::Processing => eprintln!("processing..."),
            ProcessingStatus::Success => match receipt {
                Some(receipt) => eprintln!("success: {}", receipt.ref_number),
                None => eprintln!("success"),
            },
            ProcessingStatus::Failed => eprintln!("failed"),
        }
    }
}

/// One update received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Confirmation(Summary),
    Status(ProcessingStatus),
}

/// Records every update pushed to it. Clones share the same log, so a
/// test can keep one clone and hand the other to the orchestrator.
#[derive(Default, Clone)]
pub struct RecordingSurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn statuses(&self) -> Vec<ProcessingStatus> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::Status(status) => Some(status),
                SurfaceEvent::Confirmation(_) => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn show_confirmation(&mut self, summary: &Summary) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SurfaceEvent::Confirmation(summary.clone()));
    }

    fn show_status(&mut self, status: ProcessingStatus, _receipt: Option<&Receipt>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SurfaceEvent::Status(status));
    }
}
