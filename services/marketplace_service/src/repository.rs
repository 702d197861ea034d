use std::collections::HashMap;
use std::error::Error;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;
use thiserror::Error;

/// Error returned by the record repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found.")]
    NotFound,

    #[error("A record with the same key already exists.")]
    Duplicate,

    #[error("Record does not satisfy the write condition.")]
    ConditionFailed,

    #[error(transparent)]
    Serde(#[from] serde_dynamo::Error),

    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

impl RepositoryError {
    pub fn other(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }
}

/// Accumulates the `SET` clauses of an `UpdateItem` request together with their placeholders.
#[derive(Debug, Default)]
pub(crate) struct SetExpression {
    clauses: Vec<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl SetExpression {
    pub fn set(&mut self, attr: &str, value: impl Serialize) -> Result<&mut Self, RepositoryError> {
        let value = serde_dynamo::to_attribute_value(value)?;
        self.clauses.push(format!("#{attr} = :{attr}"));
        self.names.insert(format!("#{attr}"), attr.to_string());
        self.values.insert(format!(":{attr}"), value);

        Ok(self)
    }

    /// Adds a clause written by hand; its placeholders are registered with [`SetExpression::value`].
    pub fn clause(&mut self, clause: &str) -> &mut Self {
        self.clauses.push(clause.to_string());
        self
    }

    pub fn value(&mut self, placeholder: &str, value: AttributeValue) -> &mut Self {
        self.values.insert(placeholder.to_string(), value);
        self
    }

    pub fn into_parts(self) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
        let expression = format!("SET {}", self.clauses.join(", "));
        (expression, self.names, self.values)
    }
}
