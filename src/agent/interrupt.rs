//! Interrupt and resume payloads

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::AgentInput;
use crate::serialization::{DynValue, Dynamic};

/// Resume coordinate of a suspended workflow
///
/// Sequential and loop workflows fill the index, nested info and
/// iteration count; parallel workflows fill the per-branch map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInterruptInfo {
    /// Input the workflow was originally invoked with
    pub orig_input: Arc<AgentInput>,

    /// Index of the interrupted sub-agent
    #[serde(default)]
    pub sequential_interrupt_index: usize,

    /// What the interrupted sub-agent needs to resume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequential_interrupt_info: Option<Box<InterruptInfo>>,

    /// Completed loop iterations at the time of the interrupt
    #[serde(default)]
    pub loop_iterations: usize,

    /// Interrupted branches of a parallel workflow, by branch index
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parallel_interrupt_info: BTreeMap<usize, InterruptInfo>,
}

impl WorkflowInterruptInfo {
    /// Coordinate of an interrupted sequential or loop pass
    pub fn sequential(
        orig_input: Arc<AgentInput>,
        index: usize,
        nested: InterruptInfo,
        loop_iterations: usize,
    ) -> Self {
        Self {
            orig_input,
            sequential_interrupt_index: index,
            sequential_interrupt_info: Some(Box::new(nested)),
            loop_iterations,
            parallel_interrupt_info: BTreeMap::new(),
        }
    }

    /// Coordinate of a parallel run with some branches interrupted
    pub fn parallel(orig_input: Arc<AgentInput>, branches: BTreeMap<usize, InterruptInfo>) -> Self {
        Self {
            orig_input,
            sequential_interrupt_index: 0,
            sequential_interrupt_info: None,
            loop_iterations: 0,
            parallel_interrupt_info: branches,
        }
    }
}

/// Payload of an interrupt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterruptData {
    /// Raised by a workflow agent
    Workflow(Box<WorkflowInterruptInfo>),

    /// Raised by any other agent; only that agent interprets it
    Opaque(Dynamic),
}

impl InterruptData {
    /// Rust type name of the payload
    pub fn type_name(&self) -> &'static str {
        match self {
            InterruptData::Workflow(_) => std::any::type_name::<WorkflowInterruptInfo>(),
            InterruptData::Opaque(value) => value.type_name(),
        }
    }
}

/// Everything needed to resume an interrupted agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptInfo {
    pub data: InterruptData,
}

impl InterruptInfo {
    pub fn workflow(info: WorkflowInterruptInfo) -> Self {
        Self {
            data: InterruptData::Workflow(Box::new(info)),
        }
    }

    pub fn opaque(value: impl DynValue) -> Self {
        Self {
            data: InterruptData::Opaque(Dynamic::new(value)),
        }
    }

    pub fn as_workflow(&self) -> Option<&WorkflowInterruptInfo> {
        match &self.data {
            InterruptData::Workflow(info) => Some(info),
            InterruptData::Opaque(_) => None,
        }
    }

    /// Borrow an opaque payload as `T`
    pub fn opaque_as<T: 'static>(&self) -> Option<&T> {
        match &self.data {
            InterruptData::Opaque(value) => value.downcast_ref::<T>(),
            InterruptData::Workflow(_) => None,
        }
    }
}

/// Argument of `ResumableAgent::resume`
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeInfo {
    pub enable_streaming: bool,
    pub interrupt_info: InterruptInfo,
}

impl ResumeInfo {
    pub fn new(interrupt_info: InterruptInfo) -> Self {
        Self {
            enable_streaming: false,
            interrupt_info,
        }
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.enable_streaming = enabled;
        self
    }
}
