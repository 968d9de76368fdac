use super::error::DecodeError;
use super::operator::{Operator, RegexClass};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::record::lookup_key;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Token joining two sibling nodes of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl FromStr for Connective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(Connective::And),
            "or" => Ok(Connective::Or),
            _ => Err(s.to_string()),
        }
    }
}

impl Connective {
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
        }
    }
}

/// A single field comparison, `[fieldKey, operator, comparisonValue]`
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    /// Possibly dotted (`Table.column`) key; lookups use the last segment
    pub field_key: String,
    pub operator: Operator,
    /// Scalar or array comparison value, as stored
    pub comparison: Value,
}

impl Leaf {
    pub fn new(field_key: impl Into<String>, operator: Operator, comparison: Value) -> Self {
        Self {
            field_key: field_key.into(),
            operator,
            comparison,
        }
    }
}

/// Nodes joined left to right by connectives.
///
/// Holds `connectives.len() == nodes.len() - 1` for any non-empty group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    nodes: Vec<FilterNode>,
    connectives: Vec<Connective>,
}

impl Group {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(first: FilterNode) -> Self {
        Self {
            nodes: vec![first],
            connectives: Vec::new(),
        }
    }

    /// Append `node`, joined to the previous one by `connective`
    pub fn then(mut self, connective: Connective, node: FilterNode) -> Self {
        if self.nodes.is_empty() {
            self.nodes.push(node);
        } else {
            self.connectives.push(connective);
            self.nodes.push(node);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Children paired with the connective preceding them (`None` for the first)
    pub fn entries(&self) -> impl Iterator<Item = (Option<Connective>, &FilterNode)> {
        self.nodes.iter().enumerate().map(move |(i, node)| {
            let connective = i.checked_sub(1).map(|prev| self.connectives[prev]);
            (connective, node)
        })
    }
}

/// A decoded filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Leaf(Leaf),
    Group(Group),
}

impl FilterNode {
    /// Decode a stored filter tree, rejecting malformed shapes.
    ///
    /// A 3-element array whose first element is not an array and whose middle
    /// element is a non-connective string is a leaf; any other array is a
    /// group. The root may be an empty group. Group nesting is limited to
    /// the default maximum depth.
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        Self::decode_with_max_depth(raw, DEFAULT_MAX_DEPTH)
    }

    /// Decode with an explicit group nesting limit, the root group being
    /// depth 1.
    pub fn decode_with_max_depth(raw: &Value, max_depth: usize) -> Result<Self, DecodeError> {
        decode_node(raw, "$", DecodeScope::root(max_depth))
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            FilterNode::Leaf(_) => 1,
            FilterNode::Group(group) => group.nodes.iter().map(FilterNode::leaf_count).sum(),
        }
    }

    /// Group nesting depth; a bare leaf has depth 0
    pub fn depth(&self) -> usize {
        match self {
            FilterNode::Leaf(_) => 0,
            FilterNode::Group(group) => {
                1 + group.nodes.iter().map(FilterNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Distinct record keys the tree reads, including `same`/`notsame`
    /// targets, resolved to their lookup segment
    pub fn field_keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, keys: &mut BTreeSet<String>) {
        match self {
            FilterNode::Leaf(leaf) => {
                keys.insert(lookup_key(&leaf.field_key).to_string());
                if matches!(leaf.operator, Operator::Same | Operator::NotSame) {
                    let targets = match &leaf.comparison {
                        Value::Array(items) => items.iter().collect(),
                        other => vec![other],
                    };
                    for target in targets {
                        if let Value::String(key) = target {
                            keys.insert(lookup_key(key).to_string());
                        }
                    }
                }
            }
            FilterNode::Group(group) => {
                for node in &group.nodes {
                    node.collect_keys(keys);
                }
            }
        }
    }

    /// Encode back to the stored array shape
    pub fn to_value(&self) -> Value {
        match self {
            FilterNode::Leaf(leaf) => Value::Array(vec![
                Value::String(leaf.field_key.clone()),
                Value::String(leaf.operator.as_str().to_string()),
                leaf.comparison.clone(),
            ]),
            FilterNode::Group(group) => {
                let mut items = Vec::with_capacity(group.nodes.len() * 2);
                for (connective, node) in group.entries() {
                    if let Some(connective) = connective {
                        items.push(Value::String(connective.as_str().to_string()));
                    }
                    items.push(node.to_value());
                }
                Value::Array(items)
            }
        }
    }
}

impl From<Leaf> for FilterNode {
    fn from(leaf: Leaf) -> Self {
        FilterNode::Leaf(leaf)
    }
}

impl From<Group> for FilterNode {
    fn from(group: Group) -> Self {
        FilterNode::Group(group)
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Leaf(leaf) => {
                write!(f, "{} {} {}", leaf.field_key, leaf.operator, leaf.comparison)
            }
            FilterNode::Group(group) => {
                f.write_str("(")?;
                for (connective, node) in group.entries() {
                    if let Some(connective) = connective {
                        write!(f, " {} ", connective.as_str())?;
                    }
                    write!(f, "{node}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        FilterNode::decode(&raw).map_err(serde::de::Error::custom)
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(items) => format!("array of {} element(s)", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

fn as_connective(value: &Value) -> Option<Connective> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn is_leaf_shape(items: &[Value]) -> bool {
    items.len() == 3
        && !items[0].is_array()
        && matches!(&items[1], Value::String(_))
        && as_connective(&items[1]).is_none()
}

/// Group nesting reached while decoding
#[derive(Debug, Clone, Copy)]
struct DecodeScope {
    depth: usize,
    max_depth: usize,
}

impl DecodeScope {
    fn root(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    fn is_root(self) -> bool {
        self.depth == 0
    }

    fn enter_group(self, path: &str) -> Result<Self, DecodeError> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(DecodeError::TooDeep {
                path: path.to_string(),
                max: self.max_depth,
            });
        }
        Ok(Self { depth, ..self })
    }
}

fn decode_node(raw: &Value, path: &str, scope: DecodeScope) -> Result<FilterNode, DecodeError> {
    let Value::Array(items) = raw else {
        return Err(DecodeError::MalformedNode {
            path: path.to_string(),
            found: describe(raw),
        });
    };

    if is_leaf_shape(items) {
        return decode_leaf(items, path).map(FilterNode::Leaf);
    }

    if items.is_empty() && !scope.is_root() {
        return Err(DecodeError::EmptyGroup {
            path: path.to_string(),
        });
    }

    let scope = scope.enter_group(path)?;
    decode_group(items, path, scope).map(FilterNode::Group)
}

fn decode_group(items: &[Value], path: &str, scope: DecodeScope) -> Result<Group, DecodeError> {
    let mut group = Group::empty();
    let mut pending: Option<Connective> = None;

    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");
        if i % 2 == 1 {
            pending = Some(as_connective(item).ok_or_else(|| DecodeError::ExpectedConnective {
                path: item_path,
                found: describe(item),
            })?);
            continue;
        }

        if let Some(connective) = as_connective(item) {
            return Err(DecodeError::MisplacedConnective {
                path: item_path,
                token: connective.as_str().to_string(),
            });
        }

        let node = decode_node(item, &item_path, scope)?;
        group = group.then(pending.take().unwrap_or(Connective::And), node);
    }

    if let Some(connective) = pending {
        return Err(DecodeError::TrailingConnective {
            path: format!("{path}[{}]", items.len() - 1),
            token: connective.as_str().to_string(),
        });
    }

    Ok(group)
}

fn decode_leaf(items: &[Value], path: &str) -> Result<Leaf, DecodeError> {
    let field_key = match &items[0] {
        Value::String(key) if !key.trim().is_empty() => key.clone(),
        other => {
            return Err(DecodeError::InvalidFieldKey {
                path: format!("{path}[0]"),
                found: describe(other),
            });
        }
    };

    // is_leaf_shape guarantees a string operator
    let token = items[1].as_str().unwrap_or_default();
    let operator: Operator = token.parse().map_err(|operator| DecodeError::UnknownOperator {
        path: format!("{path}[1]"),
        operator,
    })?;

    let comparison = items[2].clone();
    match operator {
        Operator::Regex => {
            let known = comparison
                .as_str()
                .is_some_and(|id| id.parse::<RegexClass>().is_ok());
            if !known {
                return Err(DecodeError::UnknownRegexClass {
                    path: format!("{path}[2]"),
                    id: comparison.to_string(),
                });
            }
        }
        Operator::Between => {
            if !matches!(&comparison, Value::Array(bounds) if bounds.len() == 2) {
                return Err(DecodeError::InvalidBetweenBounds {
                    path: format!("{path}[2]"),
                    found: describe(&comparison),
                });
            }
        }
        _ => {}
    }

    Ok(Leaf {
        field_key,
        operator,
        comparison,
    })
}
