//! Step and document types consumed by the execution engine.
//!
//! The serialized field names (`stepName`, `mainFuncName`, ...) are a wire
//! contract; do not rename them.

use super::IterationIds;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Resolved parameter value.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Finite number
    Number(f64),
    /// Text or dropdown choice
    Text(String),
}

impl Scalar {
    /// Text form, used when a text parameter is fed from a numeric block.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

// Integral numbers go out as JSON integers (`50`, not `50.0`).
impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Scalar::Number(n) => serializer.serialize_f64(*n),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// Parameter mapping of a step.
pub type Params = BTreeMap<String, Scalar>;

/// Auxiliary operations bundled around a main operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepHooks {
    /// Operations run before the main operation
    #[serde(default)]
    pub pre: Vec<String>,
    /// Parameters for the pre operations
    #[serde(default)]
    pub pre_params: Params,
    /// Operations run after the main operation
    #[serde(default)]
    pub post: Vec<String>,
    /// Parameters for the post operations
    #[serde(default)]
    pub post_params: Params,
}

/// One compiled instruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Source block id
    pub id: String,
    /// Display label
    pub step_name: String,
    /// Operation the engine dispatches on
    pub main_func_name: String,
    /// Parameters of the main operation
    pub main_params: Params,
    /// Operations run before the main operation
    pub pre_funcs: Vec<String>,
    /// Parameters for `pre_funcs`
    pub pre_params: Params,
    /// Operations run after the main operation
    pub post_funcs: Vec<String>,
    /// Parameters for `post_funcs`
    pub post_params: Params,
    /// Loop iteration indices, outermost first. Empty outside loops.
    #[serde(skip)]
    pub iteration: Vec<usize>,
}

impl Step {
    /// Start building a step for the given source block id.
    pub fn builder(
        id: impl Into<String>,
        step_name: impl Into<String>,
        main_func_name: impl Into<String>,
    ) -> StepBuilder {
        StepBuilder {
            step: Step {
                id: id.into(),
                step_name: step_name.into(),
                main_func_name: main_func_name.into(),
                main_params: Params::new(),
                pre_funcs: Vec::new(),
                pre_params: Params::new(),
                post_funcs: Vec::new(),
                post_params: Params::new(),
                iteration: Vec::new(),
            },
        }
    }

    /// Id as written to the document under the given policy.
    pub fn rendered_id(&self, policy: IterationIds) -> String {
        match policy {
            IterationIds::Indexed if !self.iteration.is_empty() => {
                let path: Vec<String> = self.iteration.iter().map(ToString::to_string).collect();
                format!("{}#{}", self.id, path.join("."))
            }
            _ => self.id.clone(),
        }
    }
}

/// Builder for [`Step`].
#[derive(Debug)]
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    /// Set a main parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.step.main_params.insert(name.into(), value.into());
        self
    }

    /// Apply a hook bundle on top of whatever the builder already holds.
    pub fn hooks(mut self, hooks: &StepHooks) -> Self {
        self.step.pre_funcs.extend(hooks.pre.iter().cloned());
        self.step
            .pre_params
            .extend(hooks.pre_params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.step.post_funcs.extend(hooks.post.iter().cloned());
        self.step
            .post_params
            .extend(hooks.post_params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Finish the step.
    pub fn build(self) -> Step {
        self.step
    }
}

/// The compiled program: `{ "steps": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl Document {
    /// Assemble the document from the flat step list in one pass.
    pub fn assemble(steps: Vec<Step>, policy: IterationIds) -> Self {
        let steps = steps
            .into_iter()
            .map(|mut step| {
                step.id = step.rendered_id(policy);
                step
            })
            .collect();
        Self { steps }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the document has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
