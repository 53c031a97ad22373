//! Inter-entity messaging for negotiation replay and auditing.
//!
//! Every communication between patients, hospitals, and the coordinator is
//! recorded as an immutable [`Message`] in an append-only [`MessageLog`].
//! The log enables:
//! - Debugging (reconstruct who offered what, and when)
//! - Auditing (verify every balance mutation has a matching message)
//! - Analysis (per-recipient and per-kind queries)
//!
//! # Message Kinds
//!
//! One kind per protocol edge:
//! - **MEDICAL_NEEDS**: patient announces a demand to the coordinator
//! - **ADMISSION_BID**: hospital answers a quote request (sent even when it
//!   goes on to reject)
//! - **RESOURCE_UNAVAILABLE**: coordinator broadcast when no hospital bid
//! - **RESOURCE_ALLOCATION**: coordinator instructs the winning hospital
//! - **ALLOCATION_RESULT**: coordinator reports the outcome to the patient
//! - **RESOURCE_ALLOCATED**: hospital confirms a committed allocation
//! - **RESOURCE_TRANSFER**: rebalancing transfer between two hospitals
//!
//! # Example
//!
//! ```rust
//! use healthcare_simulator_core_rs::models::{Message, MessageLog, Severity};
//!
//! let mut log = MessageLog::new();
//! log.append(Message::medical_needs(0, "patient_1", 42, Severity::Medium));
//!
//! assert_eq!(log.len(), 1);
//! assert_eq!(log.messages()[0].kind(), "MEDICAL_NEEDS");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::hospital::Specialty;
use crate::models::patient::Severity;

/// Well-known identity of the coordinator, used as a message endpoint.
pub const COORDINATOR_ID: &str = "coordinator";

/// Message destination: a specific entity or every entity at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// A single hospital, patient, or the coordinator (by id)
    Agent(String),
    /// Broadcast sentinel: addressed to no one in particular
    Broadcast,
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Agent(id) => write!(f, "{}", id),
            Recipient::Broadcast => write!(f, "BROADCAST"),
        }
    }
}

/// Typed message content. The wire tag for each variant is fixed and
/// returned by [`Payload::kind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Patient demand announcement
    MedicalNeeds { amount: i64, severity: Severity },

    /// Hospital's answer to a quote request, sent before any gate applies
    AdmissionBid {
        patient_id: String,
        amount: i64,
        specialty: Specialty,
    },

    /// No hospital produced a bid for this patient
    ResourceUnavailable { patient_id: String },

    /// Coordinator's allocation order to the winning hospital
    ResourceAllocation {
        patient_id: String,
        amount: i64,
        bid_score: f64,
    },

    /// Outcome report to the patient, sent whether or not the commit held
    AllocationResult { fulfilled: bool, hospital_id: String },

    /// Hospital's confirmation of a committed allocation
    ResourceAllocated { amount: i64, hospital_id: String },

    /// Rebalancing transfer between two hospitals
    ResourceTransfer { amount: i64 },
}

impl Payload {
    /// Categorical tag for this payload
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::MedicalNeeds { .. } => "MEDICAL_NEEDS",
            Payload::AdmissionBid { .. } => "ADMISSION_BID",
            Payload::ResourceUnavailable { .. } => "RESOURCE_UNAVAILABLE",
            Payload::ResourceAllocation { .. } => "RESOURCE_ALLOCATION",
            Payload::AllocationResult { .. } => "ALLOCATION_RESULT",
            Payload::ResourceAllocated { .. } => "RESOURCE_ALLOCATED",
            Payload::ResourceTransfer { .. } => "RESOURCE_TRANSFER",
        }
    }
}

/// Immutable communication record.
///
/// Written once by the sending side, never mutated, read many times
/// through the log queries. `step` is the simulation step at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    step: usize,
    sender: String,
    recipient: Recipient,
    payload: Payload,
}

impl Message {
    /// Patient → coordinator demand announcement
    pub fn medical_needs(step: usize, patient_id: &str, amount: i64, severity: Severity) -> Self {
        Self {
            step,
            sender: patient_id.to_string(),
            recipient: Recipient::Agent(COORDINATOR_ID.to_string()),
            payload: Payload::MedicalNeeds { amount, severity },
        }
    }

    /// Hospital → coordinator bid record, emitted for every quote request
    pub fn admission_bid(
        step: usize,
        hospital_id: &str,
        patient_id: &str,
        amount: i64,
        specialty: Specialty,
    ) -> Self {
        Self {
            step,
            sender: hospital_id.to_string(),
            recipient: Recipient::Agent(COORDINATOR_ID.to_string()),
            payload: Payload::AdmissionBid {
                patient_id: patient_id.to_string(),
                amount,
                specialty,
            },
        }
    }

    /// Coordinator → broadcast: no hospital could serve this patient
    pub fn resource_unavailable(step: usize, patient_id: &str) -> Self {
        Self {
            step,
            sender: COORDINATOR_ID.to_string(),
            recipient: Recipient::Broadcast,
            payload: Payload::ResourceUnavailable {
                patient_id: patient_id.to_string(),
            },
        }
    }

    /// Coordinator → winning hospital allocation order
    pub fn resource_allocation(
        step: usize,
        hospital_id: &str,
        patient_id: &str,
        amount: i64,
        bid_score: f64,
    ) -> Self {
        Self {
            step,
            sender: COORDINATOR_ID.to_string(),
            recipient: Recipient::Agent(hospital_id.to_string()),
            payload: Payload::ResourceAllocation {
                patient_id: patient_id.to_string(),
                amount,
                bid_score,
            },
        }
    }

    /// Coordinator → patient outcome report
    pub fn allocation_result(
        step: usize,
        patient_id: &str,
        fulfilled: bool,
        hospital_id: &str,
    ) -> Self {
        Self {
            step,
            sender: COORDINATOR_ID.to_string(),
            recipient: Recipient::Agent(patient_id.to_string()),
            payload: Payload::AllocationResult {
                fulfilled,
                hospital_id: hospital_id.to_string(),
            },
        }
    }

    /// Hospital → patient commit confirmation
    pub fn resource_allocated(step: usize, hospital_id: &str, patient_id: &str, amount: i64) -> Self {
        Self {
            step,
            sender: hospital_id.to_string(),
            recipient: Recipient::Agent(patient_id.to_string()),
            payload: Payload::ResourceAllocated {
                amount,
                hospital_id: hospital_id.to_string(),
            },
        }
    }

    /// Source hospital → target hospital rebalancing transfer
    pub fn resource_transfer(step: usize, source_id: &str, target_id: &str, amount: i64) -> Self {
        Self {
            step,
            sender: source_id.to_string(),
            recipient: Recipient::Agent(target_id.to_string()),
            payload: Payload::ResourceTransfer { amount },
        }
    }

    /// Simulation step at which this message was created
    pub fn step(&self) -> usize {
        self.step
    }

    /// Sender identity
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Recipient identity or the broadcast sentinel
    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    /// Typed content
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Categorical tag, e.g. `"ADMISSION_BID"`
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Append-only message log.
///
/// Ordering is arrival order (FIFO); entries are never reordered or
/// deduplicated. Queries are linear scans; the log is a diagnostic
/// artifact, not a hot path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// Create a new empty message log
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Append a message to the log
    pub fn append(&mut self, message: Message) {
        debug!(
            step = message.step(),
            sender = message.sender(),
            recipient = %message.recipient(),
            kind = message.kind(),
            "message appended"
        );
        self.messages.push(message);
    }

    /// Get the number of messages logged
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get all messages in arrival order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get messages addressed to a specific entity.
    ///
    /// Exact-recipient match; broadcasts are not included (query them
    /// with [`MessageLog::broadcasts`]).
    pub fn for_recipient(&self, id: &str) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| matches!(m.recipient(), Recipient::Agent(r) if r == id))
            .collect()
    }

    /// Get all broadcast messages
    pub fn broadcasts(&self) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.recipient() == &Recipient::Broadcast)
            .collect()
    }

    /// Get messages of a specific kind
    pub fn of_kind(&self, kind: &str) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.kind() == kind).collect()
    }

    /// Get messages created at a specific step
    pub fn at_step(&self, step: usize) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.step() == step).collect()
    }

    /// Get the most recent `n` messages (fewer if the log is shorter)
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Clear all messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
