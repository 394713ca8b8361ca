//! Host integration: node descriptors and explicit registration.
//!
//! The node-graph host discovers nodes through a type name, a display
//! name, a category and a declared input/output schema. Instead of
//! module-level lookup tables, hosts build a [`NodeRegistry`] and
//! register descriptors into it; [`NodeRegistry::with_builtin`] returns
//! one with the edge match node already present.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::overlap;
use crate::tensor::ImageTensor;
use crate::types::{CompareConfig, PipelineError, Verdict};

/// Kind and constraints of one node socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum SocketKind {
    /// A batched image tensor.
    Image,
    /// An integer slider.
    Int {
        /// Initial value.
        default: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
        /// Slider increment.
        step: i64,
    },
    /// A float slider.
    Float {
        /// Initial value.
        default: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
        /// Slider increment.
        step: f64,
    },
    /// A text value.
    String,
}

/// A named socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    /// Socket name as the host shows and wires it.
    pub name: String,
    /// Socket kind.
    pub kind: SocketKind,
}

impl Socket {
    fn new(name: &str, kind: SocketKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
        }
    }
}

/// Everything the host needs to list and wire a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Unique, stable type name.
    pub type_name: String,
    /// Human-readable name for menus.
    pub display_name: String,
    /// Menu category.
    pub category: String,
    /// Name of the entry point the host invokes.
    pub function: String,
    /// Required inputs, in declaration order.
    pub inputs: Vec<Socket>,
    /// Outputs, in declaration order.
    pub outputs: Vec<Socket>,
}

/// Inputs the host passes to [`EdgeMatchNode::execute`].
#[derive(Debug, Clone)]
pub struct NodeInputs {
    /// First image batch.
    pub image_a: ImageTensor,
    /// Second image batch.
    pub image_b: ImageTensor,
    /// Value of the `tolerance_pixels` socket.
    pub tolerance_pixels: i64,
    /// Value of the `min_overlap_percent` socket.
    pub min_overlap_percent: f64,
}

/// Output of [`EdgeMatchNode::execute`]: the `result` socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutput {
    /// `"Yes"` or `"No"`.
    pub result: Verdict,
}

/// The edge match checker node.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeMatchNode;

impl EdgeMatchNode {
    /// Stable type name used for registration.
    pub const TYPE_NAME: &'static str = "EdgeMatchChecker";
    /// Display name shown by the host.
    pub const DISPLAY_NAME: &'static str = "Edge Match Checker";
    /// Menu category.
    pub const CATEGORY: &'static str = "utils";
    /// Entry point name.
    pub const FUNCTION: &'static str = "compare_edges";

    /// Describe the node's sockets for the host.
    #[must_use]
    pub fn descriptor() -> NodeDescriptor {
        NodeDescriptor {
            type_name: Self::TYPE_NAME.to_owned(),
            display_name: Self::DISPLAY_NAME.to_owned(),
            category: Self::CATEGORY.to_owned(),
            function: Self::FUNCTION.to_owned(),
            inputs: vec![
                Socket::new("image_a", SocketKind::Image),
                Socket::new("image_b", SocketKind::Image),
                Socket::new(
                    "tolerance_pixels",
                    SocketKind::Int {
                        default: i64::from(CompareConfig::DEFAULT_TOLERANCE_PIXELS),
                        min: 0,
                        max: i64::from(CompareConfig::MAX_TOLERANCE_PIXELS),
                        step: i64::from(CompareConfig::TOLERANCE_PIXELS_STEP),
                    },
                ),
                Socket::new(
                    "min_overlap_percent",
                    SocketKind::Float {
                        default: CompareConfig::DEFAULT_MIN_OVERLAP_PERCENT,
                        min: CompareConfig::MIN_OVERLAP_PERCENT,
                        max: CompareConfig::MAX_OVERLAP_PERCENT,
                        step: CompareConfig::OVERLAP_PERCENT_STEP,
                    },
                ),
            ],
            outputs: vec![Socket::new("result", SocketKind::String)],
        }
    }

    /// Run the comparison on host-supplied inputs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if a scalar is out of
    /// range, or [`PipelineError::InvalidInput`] if an image tensor cannot
    /// be reduced to a non-empty RGB raster.
    pub fn execute(inputs: &NodeInputs) -> Result<NodeOutput, PipelineError> {
        let tolerance_pixels = u8::try_from(inputs.tolerance_pixels).map_err(|_| {
            PipelineError::InvalidConfig(format!(
                "tolerance_pixels must be within 0..={}, got {}",
                CompareConfig::MAX_TOLERANCE_PIXELS,
                inputs.tolerance_pixels,
            ))
        })?;
        let config = CompareConfig::try_new(tolerance_pixels, inputs.min_overlap_percent)?;
        let result = overlap::evaluate(&inputs.image_a, &inputs.image_b, &config)?;
        Ok(NodeOutput { result })
    }
}

/// Registered node descriptors keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, NodeDescriptor>,
}

impl NodeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the edge match node.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.insert(EdgeMatchNode::descriptor());
        registry
    }

    /// Register a node descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateNode`] if a node with the same
    /// type name is already registered; the registry is left unchanged.
    pub fn register(&mut self, descriptor: NodeDescriptor) -> Result<(), PipelineError> {
        if self.nodes.contains_key(&descriptor.type_name) {
            return Err(PipelineError::DuplicateNode(descriptor.type_name));
        }
        self.insert(descriptor);
        Ok(())
    }

    /// Insert without the duplicate check; callers guarantee uniqueness.
    fn insert(&mut self, descriptor: NodeDescriptor) {
        tracing::debug!(type_name = %descriptor.type_name, "registered node");
        self.nodes.insert(descriptor.type_name.clone(), descriptor);
    }

    /// Look up a descriptor by type name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&NodeDescriptor> {
        self.nodes.get(type_name)
    }

    /// Display name for a type name.
    #[must_use]
    pub fn display_name(&self, type_name: &str) -> Option<&str> {
        self.get(type_name).map(|d| d.display_name.as_str())
    }

    /// All descriptors, ordered by type name.
    pub fn iter(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.values()
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
