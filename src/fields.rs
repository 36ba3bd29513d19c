//! Named scalar fields and their basis orders.
use crate::error::AssemblyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

/// The polynomial order of a Lagrange basis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BasisOrder {
    First,
    Second,
}

impl BasisOrder {
    pub fn degree(&self) -> usize {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

/// A named scalar unknown discretized with a Lagrange basis of the given order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    order: BasisOrder,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> BasisOrder {
        self.order
    }
}

/// An ordered collection of fields, unique by name.
///
/// Fields are identified by their index in declaration order. The declaration order determines
/// the order of the field blocks in local systems and of the DOFs at each node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new field and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::DuplicateField`] if a field with the same name exists.
    pub fn add_field(&mut self, name: impl Into<String>, order: BasisOrder) -> eyre::Result<usize> {
        let name = name.into();
        if self.fields.iter().any(|field| field.name == name) {
            return Err(AssemblyError::DuplicateField { name }.into());
        }
        self.fields.push(Field { name, order });
        Ok(self.fields.len() - 1)
    }

    /// Builder-style variant of [`add_field`](Self::add_field).
    pub fn with_field(mut self, name: impl Into<String>, order: BasisOrder) -> eyre::Result<Self> {
        self.add_field(name, order)?;
        Ok(self)
    }

    /// Resolves a field name to its index.
    pub fn index_of(&self, name: &str) -> eyre::Result<usize> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| AssemblyError::UnknownField { name: name.to_string() }.into())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The distinct basis orders used by the fields, in ascending order.
    pub fn distinct_orders(&self) -> Vec<BasisOrder> {
        let mut orders: Vec<_> = self.fields.iter().map(Field::order).collect();
        orders.sort_unstable();
        orders.dedup();
        orders
    }

    pub fn max_order(&self) -> Option<BasisOrder> {
        self.fields.iter().map(Field::order).max()
    }
}

impl Display for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fields:", self.fields.len())?;
        for (index, field) in self.fields.iter().enumerate() {
            write!(f, " [{}] \"{}\" ({:?})", index, field.name, field.order)?;
        }
        Ok(())
    }
}
