use crate::{error::IndexMissingError, model::EntityModel, traits::EntityKind, value::Value};
use serde::{Deserialize, Serialize};

///
/// Predicate
///
/// Filter evaluated against one record. Every predicate must be backed by an
/// index declared in the collection's `EntityModel`; see `Predicate::check`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Predicate {
    /// Half-open range `[lower, upper)` over the ordered field.
    Range {
        field: String,
        lower: Value,
        upper: Value,
    },

    /// Equality on a filterable field.
    Eq { field: String, value: Value },

    /// Exact membership in the record's keyword set.
    HasKeyword(String),

    And(Vec<Self>),
}

impl Predicate {
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn range(field: impl Into<String>, lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::Range {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    #[must_use]
    pub fn has_keyword(token: impl Into<String>) -> Self {
        Self::HasKeyword(token.into())
    }

    /// Conjoin two predicates, flattening nested `And`s.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut parts = match self {
            Self::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Self::And(more) => parts.extend(more),
            single => parts.push(single),
        }

        Self::And(parts)
    }

    /// Evaluate against one record. Absent fields never match.
    #[must_use]
    pub fn matches<E: EntityKind>(&self, entity: &E) -> bool {
        match self {
            Self::Range {
                field,
                lower,
                upper,
            } => entity
                .value(field)
                .is_some_and(|value| *lower <= value && value < *upper),
            Self::Eq { field, value } => entity.value(field).as_ref() == Some(value),
            Self::HasKeyword(token) => entity.keywords().contains(token),
            Self::And(parts) => parts.iter().all(|part| part.matches(entity)),
        }
    }

    /// Reject predicate shapes with no supporting index for `order_field`.
    pub(crate) fn check(
        &self,
        model: &EntityModel,
        order_field: &str,
    ) -> Result<(), IndexMissingError> {
        match self {
            Self::Range { field, .. } => {
                if field != order_field {
                    return Err(IndexMissingError::RangeOrder {
                        collection: model.path,
                        range_field: field.clone(),
                        order_field: order_field.to_string(),
                    });
                }
                Ok(())
            }
            Self::Eq { field, .. } => {
                if !model.is_filterable(field) {
                    return Err(IndexMissingError::Filter {
                        collection: model.path,
                        field: field.clone(),
                    });
                }
                Ok(())
            }
            Self::HasKeyword(_) => {
                if !model.has_keywords() {
                    return Err(IndexMissingError::Keywords {
                        collection: model.path,
                    });
                }
                Ok(())
            }
            Self::And(parts) => parts
                .iter()
                .try_for_each(|part| part.check(model, order_field)),
        }
    }
}
