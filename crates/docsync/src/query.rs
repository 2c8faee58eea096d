//! Query descriptions handed to the transport.
//!
//! The core never evaluates queries. It only carries them from a
//! subscriber's query modifier to [`Transport::listen_collection`].
//!
//! [`Transport::listen_collection`]: crate::subscription::Transport::listen_collection

use docsync_path::FieldPath;

use crate::value::DocumentValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: FieldPath,
    pub op: FilterOp,
    pub value: DocumentValue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: FieldPath,
    pub direction: Direction,
}

/// Filters, ordering and limit for a collection listener.
///
/// ```
/// use docsync::query::{Direction, FilterOp, Query};
///
/// let q = Query::new()
///     .filter("audience", FilterOp::Equal, "GLOBAL")
///     .order_by("created_at", Direction::Descending)
///     .limit(20);
/// assert_eq!(q.filters().len(), 1);
/// assert_eq!(q.limit_value(), Some(20));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<OrderBy>,
    limit: Option<usize>,
}

/// Caller-supplied transformation of the base query of a subscription.
pub type QueryModifier = Box<dyn FnOnce(Query) -> Query + Send>;

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(
        mut self,
        field: impl Into<FieldPath>,
        op: FilterOp,
        value: impl Into<DocumentValue>,
    ) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<FieldPath>, direction: Direction) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// True for the query that lists the whole collection.
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty() && self.limit.is_none()
    }
}
