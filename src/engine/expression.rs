//! Lazy Earth Engine object builders.
//!
//! Nothing here talks to the network. `ImageCollection` and `Image` only
//! record the operations applied to them; the resulting graph is shipped to
//! Earth Engine when a map is requested, and any error in it (an unknown
//! collection, a missing band) is reported by that call.
//!
//! # Wire format
//!
//! ```text
//! {
//!   "result": "0",
//!   "values": {
//!     "0": { "functionInvocationValue": {
//!       "functionName": "Image.select",
//!       "arguments": {
//!         "input": { "functionInvocationValue": { "functionName": "ImageCollection.mosaic", ... } },
//!         "bandSelectors": { "constantValue": ["DSM"] }
//!       }
//!     } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::visualization::VisParams;

/// Key of the single root value in a serialized expression.
const ROOT_KEY: &str = "0";

// =============================================================================
// Value Nodes
// =============================================================================

/// A node in the Earth Engine expression graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueNode {
    /// A literal JSON value.
    ConstantValue(Value),

    /// A call of a server-side algorithm.
    FunctionInvocationValue(FunctionInvocation),
}

impl ValueNode {
    fn constant(value: impl Into<Value>) -> Self {
        ValueNode::ConstantValue(value.into())
    }
}

/// A named algorithm applied to named arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub function_name: String,
    pub arguments: BTreeMap<String, ValueNode>,
}

impl FunctionInvocation {
    fn new(function_name: &str) -> Self {
        Self {
            function_name: function_name.to_string(),
            arguments: BTreeMap::new(),
        }
    }

    fn arg(mut self, name: &str, value: ValueNode) -> Self {
        self.arguments.insert(name.to_string(), value);
        self
    }

    fn into_node(self) -> ValueNode {
        ValueNode::FunctionInvocationValue(self)
    }
}

/// A complete, serializable expression rooted at a single value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub result: String,
    pub values: BTreeMap<String, ValueNode>,
}

impl Expression {
    fn from_root(node: ValueNode) -> Self {
        let mut values = BTreeMap::new();
        values.insert(ROOT_KEY.to_string(), node);
        Self {
            result: ROOT_KEY.to_string(),
            values,
        }
    }
}

// =============================================================================
// Collections and Images
// =============================================================================

/// A named image collection, e.g. `JAXA/ALOS/AW3D30/V4_1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection {
    node: ValueNode,
}

impl ImageCollection {
    /// Reference a collection asset by id.
    pub fn load(asset_id: &str) -> Self {
        let node = FunctionInvocation::new("ImageCollection.load")
            .arg("id", ValueNode::constant(asset_id))
            .into_node();
        Self { node }
    }

    /// Composite the collection into one image. Where images overlap, the
    /// last one in the collection wins.
    pub fn mosaic(self) -> Image {
        let node = FunctionInvocation::new("ImageCollection.mosaic")
            .arg("collection", self.node)
            .into_node();
        Image { node }
    }
}

/// A single (possibly multi-band) image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    node: ValueNode,
}

impl Image {
    /// Keep only the named bands.
    pub fn select<I, B>(self, bands: I) -> Image
    where
        I: IntoIterator<Item = B>,
        B: Into<String>,
    {
        let selectors: Vec<Value> = bands
            .into_iter()
            .map(|b| Value::String(b.into()))
            .collect();
        let node = FunctionInvocation::new("Image.select")
            .arg("input", self.node)
            .arg("bandSelectors", ValueNode::ConstantValue(Value::Array(selectors)))
            .into_node();
        Image { node }
    }

    /// Render the image into an RGB image using a value range and palette.
    pub fn visualize(self, vis: &VisParams) -> Image {
        let palette: Vec<Value> = vis
            .palette
            .iter()
            .map(|c| Value::String(c.clone()))
            .collect();
        let node = FunctionInvocation::new("Image.visualize")
            .arg("image", self.node)
            .arg("min", ValueNode::constant(vis.min))
            .arg("max", ValueNode::constant(vis.max))
            .arg("palette", ValueNode::ConstantValue(Value::Array(palette)))
            .into_node();
        Image { node }
    }

    /// Serialize this image into an expression graph.
    pub fn to_expression(&self) -> Expression {
        Expression::from_root(self.node.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
