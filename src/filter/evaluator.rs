use super::error::{EvalError, FilterError};
use super::matcher::{LeafMatcher, StandardMatcher};
use super::parser::{Connective, FilterNode, Group, Leaf};
use crate::config::{EvaluatorConfig, default_config};
use crate::record::FieldRecord;
use log::debug;
use serde_json::Value;

/// Per-call evaluation state, threaded through the recursion.
#[derive(Debug, Clone, Copy, Default)]
struct EvalContext {
    /// Number of groups entered, the root group being 1
    depth: usize,
}

impl EvalContext {
    fn root() -> Self {
        Self::default()
    }

    fn enter_group(self) -> Self {
        Self {
            depth: self.depth + 1,
        }
    }

    /// Whether the current group is the outermost one; a short-circuit here
    /// decides the whole filter.
    fn is_root(self) -> bool {
        self.depth <= 1
    }
}

/// Walks a decoded filter tree against a record.
///
/// Holds no per-call state, so one evaluator can serve concurrent callers
/// whenever its matcher can.
#[derive(Debug, Clone)]
pub struct Evaluator<M = StandardMatcher> {
    matcher: M,
    config: EvaluatorConfig,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_matcher(StandardMatcher)
    }
}

impl<M: LeafMatcher> Evaluator<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self {
            matcher,
            config: default_config().clone(),
        }
    }

    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Decide whether `record` satisfies `node`.
    ///
    /// `Err` means the filter could not be evaluated; it never stands in
    /// for a `false` verdict.
    pub fn evaluate(&self, node: &FilterNode, record: &FieldRecord) -> Result<bool, EvalError> {
        self.eval_node(node, record, EvalContext::root())
    }

    /// Decode a stored tree and evaluate it in one step
    pub fn evaluate_raw(&self, raw: &Value, record: &FieldRecord) -> Result<bool, FilterError> {
        let node = FilterNode::decode_with_max_depth(raw, self.config.max_depth)?;
        Ok(self.evaluate(&node, record)?)
    }

    fn eval_node(
        &self,
        node: &FilterNode,
        record: &FieldRecord,
        ctx: EvalContext,
    ) -> Result<bool, EvalError> {
        match node {
            FilterNode::Leaf(leaf) => self.eval_leaf(leaf, record),
            FilterNode::Group(group) => self.eval_group(group, record, ctx.enter_group()),
        }
    }

    fn eval_leaf(&self, leaf: &Leaf, record: &FieldRecord) -> Result<bool, EvalError> {
        let verdict = self.matcher.matches(leaf, record, &self.config)?;
        debug!(
            "leaf {} {} {} -> {}",
            leaf.field_key, leaf.operator, leaf.comparison, verdict
        );
        Ok(verdict)
    }

    fn eval_group(
        &self,
        group: &Group,
        record: &FieldRecord,
        ctx: EvalContext,
    ) -> Result<bool, EvalError> {
        if ctx.depth > self.config.max_depth {
            return Err(EvalError::DepthExceeded {
                max: self.config.max_depth,
            });
        }

        // Vacuously true; only the root may be empty after decoding
        let mut latest_check = true;

        for (connective, node) in group.entries() {
            match connective {
                Some(Connective::And) if !latest_check => {
                    self.log_short_circuit(ctx, Connective::And, false);
                    return Ok(false);
                }
                Some(Connective::Or) if latest_check => {
                    self.log_short_circuit(ctx, Connective::Or, true);
                    return Ok(true);
                }
                _ => {}
            }
            latest_check = self.eval_node(node, record, ctx)?;
        }

        Ok(latest_check)
    }

    fn log_short_circuit(&self, ctx: EvalContext, connective: Connective, verdict: bool) {
        if ctx.is_root() {
            debug!("filter decided {} at '{}'", verdict, connective.as_str());
        } else {
            debug!(
                "group at depth {} decided {} at '{}'",
                ctx.depth,
                verdict,
                connective.as_str()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DecodeError;
    use crate::record::{FieldEntry, FieldType};
    use serde_json::json;

    fn record() -> FieldRecord {
        FieldRecord::new()
            .with("age", FieldEntry::new(FieldType::Number, 25))
            .with("city", FieldEntry::new(FieldType::Text, "Tokyo"))
    }

    fn eval(raw: Value) -> Result<bool, FilterError> {
        Evaluator::new().evaluate_raw(&raw, &record())
    }

    #[test]
    fn test_root_leaf() {
        assert_eq!(eval(json!(["age", "<", "30"])), Ok(true));
        assert_eq!(eval(json!(["age", ">", "30"])), Ok(false));
    }

    #[test]
    fn test_empty_root_group_is_true() {
        assert_eq!(eval(json!([])), Ok(true));
    }

    #[test]
    fn test_group_result_is_last_child_without_short_circuit() {
        assert_eq!(
            eval(json!([["age", "<", 30], "and", ["city", "=", "Osaka"]])),
            Ok(false)
        );
        assert_eq!(
            eval(json!([["age", ">", 30], "or", ["city", "=", "Tokyo"]])),
            Ok(true)
        );
    }

    #[test]
    fn test_left_to_right_without_precedence() {
        // (false and x) short-circuits the whole group even though an "or" follows
        assert_eq!(
            eval(json!([
                ["age", ">", 30],
                "and",
                ["city", "=", "Tokyo"],
                "or",
                ["city", "=", "Tokyo"]
            ])),
            Ok(false)
        );
    }

    #[test]
    fn test_nested_short_circuit_only_ends_nested_group() {
        assert_eq!(
            eval(json!([
                [["age", ">", 30], "and", ["city", "=", "Tokyo"]],
                "or",
                ["city", "=", "Tokyo"]
            ])),
            Ok(true)
        );
    }

    #[test]
    fn test_depth_limit() {
        // three nested groups around one leaf
        let raw = json!([[[["age", "=", 25]]]]);
        let shallow = Evaluator::new().with_config(EvaluatorConfig {
            max_depth: 2,
            ..EvaluatorConfig::default()
        });
        assert_eq!(
            shallow.evaluate_raw(&raw, &record()),
            Err(FilterError::Decode(DecodeError::TooDeep {
                path: "$[0][0]".to_string(),
                max: 2,
            }))
        );

        // a tree decoded under a looser limit is still checked while walking
        let node = FilterNode::decode(&raw).unwrap();
        assert_eq!(
            shallow.evaluate(&node, &record()),
            Err(EvalError::DepthExceeded { max: 2 })
        );

        let deep_enough = Evaluator::new().with_config(EvaluatorConfig {
            max_depth: 3,
            ..EvaluatorConfig::default()
        });
        assert_eq!(deep_enough.evaluate_raw(&raw, &record()), Ok(true));
    }

    #[test]
    fn test_decode_errors_surface_before_evaluation() {
        assert!(matches!(
            eval(json!([["age", "<", 30], "and"])),
            Err(FilterError::Decode(_))
        ));
    }
}
