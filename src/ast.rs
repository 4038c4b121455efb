//! Expression trees, the function registry and pipeline stages.
//!
//! Everything here is plain immutable data. Building validates shape (paths,
//! function names, arity, stage order); evaluation lives in `executor`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::model::{FieldPath, ResourcePath, Value};

/// Function families, one per builtin module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionFamily {
    Arithmetic,
    Comparison,
    Logical,
    TypeCheck,
    Array,
    String,
    Map,
    Timestamp,
    Vector,
}

/// Accepted argument counts for a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
    /// Any even count (key/value pairs).
    Pairs,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::Pairs => count % 2 == 0,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Between(min, max) => write!(f, "{} to {}", min, max),
            Arity::Pairs => write!(f, "an even number of"),
        }
    }
}

/// Every builtin function, keyed by operator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Pow,
    Log,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
    Ceil,
    Floor,
    Round,

    // Comparison
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    EqAny,
    NotEqAny,

    // Logical
    And,
    Or,
    Xor,
    Not,
    Cond,
    LogicalMaximum,
    LogicalMinimum,

    // Type checks and error handling
    Exists,
    IsAbsent,
    IsError,
    IfError,
    IsNan,
    IsNotNan,
    IsNull,
    IsNotNull,

    // Arrays
    Array,
    ArrayContains,
    ArrayContainsAny,
    ArrayContainsAll,
    ArrayLength,
    ArrayConcat,
    ArrayReverse,
    ArrayGet,

    // Strings
    Concat,
    ByteLength,
    CharLength,
    ToLower,
    ToUpper,
    Trim,
    Ltrim,
    Rtrim,
    Like,
    RegexMatch,
    RegexContains,
    StartsWith,
    EndsWith,
    StringContains,
    Substring,
    StringReverse,

    // Maps
    Map,
    MapGet,
    MapMerge,
    MapRemove,

    // Timestamps
    UnixMicrosToTimestamp,
    UnixMillisToTimestamp,
    UnixSecondsToTimestamp,
    TimestampToUnixMicros,
    TimestampToUnixMillis,
    TimestampToUnixSeconds,
    TimestampAdd,
    TimestampSub,

    // Vectors
    VectorLength,
    DotProduct,
    CosineDistance,
    EuclideanDistance,
}

/// Name -> function. The first entry for a function is its canonical name.
const REGISTRY: &[(&str, Function)] = &[
    ("add", Function::Add),
    ("subtract", Function::Subtract),
    ("multiply", Function::Multiply),
    ("divide", Function::Divide),
    ("mod", Function::Mod),
    ("modulo", Function::Mod),
    ("pow", Function::Pow),
    ("log", Function::Log),
    ("exp", Function::Exp),
    ("ln", Function::Ln),
    ("log10", Function::Log10),
    ("sqrt", Function::Sqrt),
    ("abs", Function::Abs),
    ("ceil", Function::Ceil),
    ("floor", Function::Floor),
    ("round", Function::Round),
    ("eq", Function::Eq),
    ("equal", Function::Eq),
    ("neq", Function::Neq),
    ("not_equal", Function::Neq),
    ("lt", Function::Lt),
    ("less_than", Function::Lt),
    ("lte", Function::Lte),
    ("less_than_or_equal", Function::Lte),
    ("gt", Function::Gt),
    ("greater_than", Function::Gt),
    ("gte", Function::Gte),
    ("greater_than_or_equal", Function::Gte),
    ("eq_any", Function::EqAny),
    ("equal_any", Function::EqAny),
    ("not_eq_any", Function::NotEqAny),
    ("not_equal_any", Function::NotEqAny),
    ("and", Function::And),
    ("or", Function::Or),
    ("xor", Function::Xor),
    ("not", Function::Not),
    ("cond", Function::Cond),
    ("conditional", Function::Cond),
    ("logical_maximum", Function::LogicalMaximum),
    ("logical_minimum", Function::LogicalMinimum),
    ("exists", Function::Exists),
    ("is_absent", Function::IsAbsent),
    ("is_error", Function::IsError),
    ("if_error", Function::IfError),
    ("is_nan", Function::IsNan),
    ("is_not_nan", Function::IsNotNan),
    ("is_null", Function::IsNull),
    ("is_not_null", Function::IsNotNull),
    ("array", Function::Array),
    ("array_contains", Function::ArrayContains),
    ("array_contains_any", Function::ArrayContainsAny),
    ("array_contains_all", Function::ArrayContainsAll),
    ("array_length", Function::ArrayLength),
    ("array_concat", Function::ArrayConcat),
    ("array_reverse", Function::ArrayReverse),
    ("array_get", Function::ArrayGet),
    ("array_offset", Function::ArrayGet),
    ("concat", Function::Concat),
    ("string_concat", Function::Concat),
    ("str_concat", Function::Concat),
    ("byte_length", Function::ByteLength),
    ("char_length", Function::CharLength),
    ("to_lower", Function::ToLower),
    ("to_upper", Function::ToUpper),
    ("trim", Function::Trim),
    ("ltrim", Function::Ltrim),
    ("rtrim", Function::Rtrim),
    ("like", Function::Like),
    ("regex_match", Function::RegexMatch),
    ("regex_contains", Function::RegexContains),
    ("starts_with", Function::StartsWith),
    ("ends_with", Function::EndsWith),
    ("string_contains", Function::StringContains),
    ("str_contains", Function::StringContains),
    ("substring", Function::Substring),
    ("substr", Function::Substring),
    ("string_reverse", Function::StringReverse),
    ("reverse", Function::StringReverse),
    ("map", Function::Map),
    ("map_get", Function::MapGet),
    ("map_merge", Function::MapMerge),
    ("map_remove", Function::MapRemove),
    ("unix_micros_to_timestamp", Function::UnixMicrosToTimestamp),
    ("unix_millis_to_timestamp", Function::UnixMillisToTimestamp),
    ("unix_seconds_to_timestamp", Function::UnixSecondsToTimestamp),
    ("timestamp_to_unix_micros", Function::TimestampToUnixMicros),
    ("timestamp_to_unix_millis", Function::TimestampToUnixMillis),
    ("timestamp_to_unix_seconds", Function::TimestampToUnixSeconds),
    ("timestamp_add", Function::TimestampAdd),
    ("timestamp_sub", Function::TimestampSub),
    ("vector_length", Function::VectorLength),
    ("dot_product", Function::DotProduct),
    ("cosine_distance", Function::CosineDistance),
    ("euclidean_distance", Function::EuclideanDistance),
];

/// Lowercased characters without underscores, so `arrayContains` and
/// `array_contains` yield the same sequence.
fn normalized(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
}

impl Function {
    /// Resolve a function by name (case-insensitive, underscores optional).
    pub fn from_name(name: &str) -> PipelineResult<Function> {
        REGISTRY
            .iter()
            .find(|(candidate, _)| normalized(candidate).eq(normalized(name)))
            .map(|(_, function)| *function)
            .ok_or_else(|| PipelineError::UnknownFunction(name.to_string()))
    }

    /// Canonical snake_case name.
    pub fn name(&self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, function)| function == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn family(&self) -> FunctionFamily {
        use Function::*;
        match self {
            Add | Subtract | Multiply | Divide | Mod | Pow | Log | Exp | Ln | Log10 | Sqrt
            | Abs | Ceil | Floor | Round => FunctionFamily::Arithmetic,
            Eq | Neq | Lt | Lte | Gt | Gte | EqAny | NotEqAny => FunctionFamily::Comparison,
            And | Or | Xor | Not | Cond | LogicalMaximum | LogicalMinimum => {
                FunctionFamily::Logical
            }
            Exists | IsAbsent | IsError | IfError | IsNan | IsNotNan | IsNull | IsNotNull => {
                FunctionFamily::TypeCheck
            }
            Array | ArrayContains | ArrayContainsAny | ArrayContainsAll | ArrayLength
            | ArrayConcat | ArrayReverse | ArrayGet => FunctionFamily::Array,
            Concat | ByteLength | CharLength | ToLower | ToUpper | Trim | Ltrim | Rtrim | Like
            | RegexMatch | RegexContains | StartsWith | EndsWith | StringContains | Substring
            | StringReverse => FunctionFamily::String,
            Map | MapGet | MapMerge | MapRemove => FunctionFamily::Map,
            UnixMicrosToTimestamp | UnixMillisToTimestamp | UnixSecondsToTimestamp
            | TimestampToUnixMicros | TimestampToUnixMillis | TimestampToUnixSeconds
            | TimestampAdd | TimestampSub => FunctionFamily::Timestamp,
            VectorLength | DotProduct | CosineDistance | EuclideanDistance => {
                FunctionFamily::Vector
            }
        }
    }

    pub fn arity(&self) -> Arity {
        use Function::*;
        match self {
            Exp | Ln | Log10 | Sqrt | Abs | Ceil | Floor | Round | Not | Exists | IsAbsent
            | IsError | IsNan | IsNotNan | IsNull | IsNotNull | ArrayLength | ArrayReverse
            | ByteLength | CharLength | ToLower | ToUpper | Trim | Ltrim | Rtrim
            | StringReverse | UnixMicrosToTimestamp | UnixMillisToTimestamp
            | UnixSecondsToTimestamp | TimestampToUnixMicros | TimestampToUnixMillis
            | TimestampToUnixSeconds | VectorLength => Arity::Exact(1),

            Add | Subtract | Multiply | Divide | Mod | Pow | Log | Eq | Neq | Lt | Lte | Gt
            | Gte | EqAny | NotEqAny | IfError | ArrayContains | ArrayContainsAny
            | ArrayContainsAll | ArrayGet | Like | RegexMatch | RegexContains | StartsWith
            | EndsWith | StringContains | MapGet | MapRemove | DotProduct | CosineDistance
            | EuclideanDistance => Arity::Exact(2),

            Cond | TimestampAdd | TimestampSub => Arity::Exact(3),
            Substring => Arity::Between(2, 3),
            And | Or | Xor | LogicalMaximum | LogicalMinimum | Concat | ArrayConcat => {
                Arity::AtLeast(1)
            }
            MapMerge => Arity::AtLeast(2),
            Array => Arity::AtLeast(0),
            Map => Arity::Pairs,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An immutable expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Field(FieldPath),
    Literal(Value),
    Function {
        function: Function,
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Reference a field by dotted path.
    pub fn field(path: &str) -> PipelineResult<Expression> {
        Ok(Expression::Field(FieldPath::parse(path)?))
    }

    pub fn constant(value: impl Into<Value>) -> Expression {
        Expression::Literal(value.into())
    }

    pub fn null() -> Expression {
        Expression::Literal(Value::Null)
    }

    /// Apply a function, checking its arity.
    pub fn function(function: Function, args: Vec<Expression>) -> PipelineResult<Expression> {
        let arity = function.arity();
        if !arity.accepts(args.len()) {
            return Err(PipelineError::Arity {
                function: function.name(),
                expected: arity.to_string(),
                actual: args.len(),
            });
        }
        Ok(Expression::Function { function, args })
    }

    /// Apply a function looked up by name.
    pub fn call(name: &str, args: Vec<Expression>) -> PipelineResult<Expression> {
        Expression::function(Function::from_name(name)?, args)
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Literal(value)
    }
}

impl From<FieldPath> for Expression {
    fn from(path: FieldPath) -> Self {
        Expression::Field(path)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// One sort key: an expression and its direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub expression: Expression,
    pub direction: Direction,
}

impl SortKey {
    pub fn ascending(expression: Expression) -> Self {
        Self {
            expression,
            direction: Direction::Ascending,
        }
    }

    pub fn descending(expression: Expression) -> Self {
        Self {
            expression,
            direction: Direction::Descending,
        }
    }
}

/// Where a pipeline draws its documents from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Direct children of one collection.
    Collection(ResourcePath),
    /// Every collection with this id, at any depth.
    CollectionGroup(String),
    /// Every document.
    Database,
    /// Exactly these document keys.
    Documents(Vec<ResourcePath>),
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Source(Source),
    Where(Expression),
    Sort(Vec<SortKey>),
    Offset(usize),
    Limit(usize),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Source(Source::Collection(_)) => "collection",
            Stage::Source(Source::CollectionGroup(_)) => "collection_group",
            Stage::Source(Source::Database) => "database",
            Stage::Source(Source::Documents(_)) => "documents",
            Stage::Where(_) => "where",
            Stage::Sort(_) => "sort",
            Stage::Offset(_) => "offset",
            Stage::Limit(_) => "limit",
        }
    }
}

/// An ordered, validated list of stages. The first stage is always the only
/// source stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Validate and build a pipeline from raw stages.
    pub fn new(stages: Vec<Stage>) -> PipelineResult<Self> {
        match stages.first() {
            Some(Stage::Source(_)) => {}
            Some(other) => {
                return Err(PipelineError::InvalidPipeline(format!(
                    "first stage must be a source, found {}",
                    other.name()
                )))
            }
            None => {
                return Err(PipelineError::InvalidPipeline(
                    "pipeline has no stages".to_string(),
                ))
            }
        }
        if stages[1..].iter().any(|s| matches!(s, Stage::Source(_))) {
            return Err(PipelineError::InvalidPipeline(
                "only the first stage may be a source".to_string(),
            ));
        }
        Ok(Self { stages })
    }

    pub fn from_source(source: Source) -> Self {
        Self {
            stages: vec![Stage::Source(source)],
        }
    }

    pub fn collection(path: &str) -> PipelineResult<Self> {
        Ok(Self::from_source(Source::Collection(
            ResourcePath::collection(path)?,
        )))
    }

    pub fn collection_group(collection_id: &str) -> PipelineResult<Self> {
        if collection_id.is_empty() || collection_id.contains('/') {
            return Err(PipelineError::InvalidCollectionPath(
                collection_id.to_string(),
            ));
        }
        Ok(Self::from_source(Source::CollectionGroup(
            collection_id.to_string(),
        )))
    }

    pub fn database() -> Self {
        Self::from_source(Source::Database)
    }

    pub fn documents(paths: &[&str]) -> PipelineResult<Self> {
        let keys = paths
            .iter()
            .map(|p| ResourcePath::document(p))
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(Self::from_source(Source::Documents(keys)))
    }

    /// Append a `Where` stage.
    pub fn filter(mut self, condition: Expression) -> Self {
        self.stages.push(Stage::Where(condition));
        self
    }

    /// Append a `Sort` stage.
    pub fn sort(mut self, keys: Vec<SortKey>) -> Self {
        self.stages.push(Stage::Sort(keys));
        self
    }

    /// Append an `Offset` stage.
    pub fn offset(mut self, count: usize) -> Self {
        self.stages.push(Stage::Offset(count));
        self
    }

    /// Append a `Limit` stage.
    pub fn limit(mut self, count: usize) -> Self {
        self.stages.push(Stage::Limit(count));
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn source(&self) -> &Source {
        match &self.stages[0] {
            Stage::Source(source) => source,
            // Unreachable: construction guarantees a leading source.
            _ => &Source::Database,
        }
    }
}

impl TryFrom<Vec<Stage>> for Pipeline {
    type Error = PipelineError;

    fn try_from(stages: Vec<Stage>) -> Result<Self, Self::Error> {
        Pipeline::new(stages)
    }
}

impl From<Pipeline> for Vec<Stage> {
    fn from(pipeline: Pipeline) -> Self {
        pipeline.stages
    }
}
