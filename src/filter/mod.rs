//! Stored filter trees and their evaluation against records
//!
//! Filters are built by end users in a visual builder and persisted as JSON.
//! They decide which records are visible to a listing: the caller loads the
//! tree, assembles a [`FieldRecord`](crate::record::FieldRecord) for each
//! candidate and asks the [`Evaluator`] for a verdict.
//!
//! # Shape
//!
//! ```text
//! ["age", "<", "30"]                                   leaf: [fieldKey, operator, comparison]
//! [["age", "<", 30], "and", ["city", "=", "Tokyo"]]    group: nodes joined by "and"/"or"
//! [leaf, "and", [leaf, "or", leaf]]                    groups nest
//! ```
//!
//! Groups are read strictly left to right with no precedence: `"and"` after
//! a false child makes the group false, `"or"` after a true child makes it
//! true, otherwise the group takes the verdict of its last child.
//!
//! # Operators
//!
//! - `=` `<>` `<` `<=` `>` `>=` - loose comparison
//! - `isblank` `isnotblank` - empty text check
//! - `contains` `notcontains` `startswith` `endswith` - text / list membership
//! - `between` - `[upper, lower]` bounds, inclusive
//! - `minlength` `maxlength` - text length thresholds
//! - `same` `notsame` - compare with another field of the record
//! - `listinclude` `listnotinclude` - checked entries of a `{id, checked}` list
//! - `regex` - one of the named character-class validators

pub mod coerce;
pub mod error;
pub mod evaluator;
pub mod loose;
pub mod matcher;
pub mod operator;
pub mod parser;

pub use error::{DecodeError, EvalError, FilterError};
pub use evaluator::Evaluator;
pub use matcher::{LeafMatcher, MatchScope, StandardMatcher};
pub use operator::{Operator, RegexClass};
pub use parser::{Connective, FilterNode, Group, Leaf};
