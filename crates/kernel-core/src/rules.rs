//! Declarative rule engine: predicates, statements, prerequisites,
//! consequences, and actions.
//!
//! Everything here is pure. Evaluation reads [`EntitySnapshot`]s and
//! applying an action returns new snapshots; committing them to the world is
//! the executor's job.

use contracts::{attr, AttributeValue, EntityId, EntitySnapshot, Location};
use thiserror::Error;

/// Read access to the live registry for predicates that look past the two
/// entities they are given (e.g. into an inventory).
pub trait EntityLookup {
    fn lookup(&self, id: EntityId) -> Option<EntitySnapshot>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("comparison `{label}` needs a target entity")]
    MissingTarget { label: &'static str },

    #[error("comparison `{label}` reads `{attribute}`, which {entity} does not have")]
    MissingAttribute {
        label: &'static str,
        entity: EntityId,
        attribute: String,
    },

    #[error("comparison `{label}` cannot compare {left} with {right}")]
    TypeMismatch {
        label: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("attribute `{0}` is derived and cannot be written")]
    ReadOnlyAttribute(String),

    #[error("attribute `{attribute}` cannot hold a {found} value")]
    InvalidRelationalValue {
        attribute: String,
        found: &'static str,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("prerequisites not met for `{action}`: {}", reasons.join("; "))]
    PrerequisitesNotMet { action: String, reasons: Vec<String> },

    #[error(transparent)]
    Rule(#[from] RuleError),
}

pub type CompareFn = fn(&'static str, &AttributeValue, &AttributeValue) -> Result<bool, RuleError>;
pub type CheckFn = fn(&dyn EntityLookup, &EntitySnapshot, Option<&EntitySnapshot>) -> bool;
pub type ComputeFn = fn(&EntitySnapshot, &EntitySnapshot) -> AttributeValue;

// ---------------------------------------------------------------------------
// Predicates and statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Predicate {
    /// The subject's attribute equals `value`. A missing attribute is a
    /// mismatch, not an error.
    AttributeEquals {
        attribute: String,
        value: AttributeValue,
    },
    /// `compare(subject.source_attribute, target.target_attribute)`.
    CrossCompare {
        label: &'static str,
        source_attribute: String,
        target_attribute: String,
        compare: CompareFn,
    },
    /// Opaque check; `doc` is reported verbatim when it fails.
    Custom { doc: &'static str, check: CheckFn },
}

impl Predicate {
    fn phase(&self) -> u8 {
        match self {
            Self::AttributeEquals { .. } => 0,
            Self::CrossCompare { .. } => 1,
            Self::Custom { .. } => 2,
        }
    }

    pub fn evaluate(
        &self,
        lookup: &dyn EntityLookup,
        subject: &EntitySnapshot,
        target: Option<&EntitySnapshot>,
    ) -> Result<bool, RuleError> {
        match self {
            Self::AttributeEquals { attribute, value } => {
                Ok(subject.attribute(attribute).as_ref() == Some(value))
            }
            Self::CrossCompare {
                label,
                source_attribute,
                target_attribute,
                compare,
            } => {
                let label = *label;
                let target = target.ok_or(RuleError::MissingTarget { label })?;
                let left = read_for_compare(label, subject, source_attribute)?;
                let right = read_for_compare(label, target, target_attribute)?;
                compare(label, &left, &right)
            }
            Self::Custom { check, .. } => Ok(check(lookup, subject, target)),
        }
    }

    /// One human-readable line explaining why this predicate failed.
    fn describe_failure(
        &self,
        scope: &str,
        statement: &str,
        subject: &EntitySnapshot,
        target: Option<&EntitySnapshot>,
    ) -> String {
        match self {
            Self::AttributeEquals { attribute, value } => {
                let found = subject
                    .attribute(attribute)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "missing".to_string());
                format!(
                    "{scope} `{statement}`: expected {attribute} = {value} on {}, found {found}",
                    subject.name
                )
            }
            Self::CrossCompare {
                label,
                source_attribute,
                target_attribute,
                ..
            } => {
                let left = display_attribute(Some(subject), source_attribute);
                let right = display_attribute(target, target_attribute);
                format!(
                    "{scope} `{statement}`: comparison `{label}` failed ({source_attribute} = {left}, {target_attribute} = {right})"
                )
            }
            Self::Custom { doc, .. } => format!("{scope} `{statement}`: {doc}"),
        }
    }
}

fn read_for_compare(
    label: &'static str,
    snapshot: &EntitySnapshot,
    attribute: &str,
) -> Result<AttributeValue, RuleError> {
    snapshot
        .attribute(attribute)
        .ok_or_else(|| RuleError::MissingAttribute {
            label,
            entity: snapshot.id,
            attribute: attribute.to_string(),
        })
}

fn display_attribute(snapshot: Option<&EntitySnapshot>, attribute: &str) -> String {
    snapshot
        .and_then(|s| s.attribute(attribute))
        .map(|v| v.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

/// A named conjunction of predicates.
#[derive(Debug, Clone)]
pub struct Statement {
    name: String,
    predicates: Vec<Predicate>,
}

impl Statement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicates: Vec::new(),
        }
    }

    pub fn with_condition(mut self, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        self.predicates.push(Predicate::AttributeEquals {
            attribute: attribute.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn with_comparison(
        mut self,
        label: &'static str,
        source_attribute: &str,
        target_attribute: &str,
        compare: CompareFn,
    ) -> Self {
        self.predicates.push(Predicate::CrossCompare {
            label,
            source_attribute: source_attribute.to_string(),
            target_attribute: target_attribute.to_string(),
            compare,
        });
        self
    }

    pub fn with_check(mut self, doc: &'static str, check: CheckFn) -> Self {
        self.predicates.push(Predicate::Custom { doc, check });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Conditions first, then comparisons, then opaque checks; each phase in
    /// insertion order.
    fn ordered(&self) -> impl Iterator<Item = &Predicate> {
        (0..3).flat_map(move |phase| self.predicates.iter().filter(move |p| p.phase() == phase))
    }

    /// True when every predicate holds. Stops at the first failure; errors
    /// only on malformed comparator input.
    pub fn holds(
        &self,
        lookup: &dyn EntityLookup,
        subject: &EntitySnapshot,
        target: Option<&EntitySnapshot>,
    ) -> Result<bool, RuleError> {
        for predicate in self.ordered() {
            if !predicate.evaluate(lookup, subject, target)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Every failing predicate, one line each. Does not short-circuit.
    pub fn explain(
        &self,
        scope: &str,
        lookup: &dyn EntityLookup,
        subject: &EntitySnapshot,
        target: Option<&EntitySnapshot>,
    ) -> Result<Vec<String>, RuleError> {
        let mut reasons = Vec::new();
        for predicate in self.ordered() {
            if !predicate.evaluate(lookup, subject, target)? {
                reasons.push(predicate.describe_failure(scope, &self.name, subject, target));
            }
        }
        Ok(reasons)
    }
}

// ---------------------------------------------------------------------------
// Prerequisites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Prerequisites {
    pub source: Vec<Statement>,
    pub target: Vec<Statement>,
    pub source_target: Vec<Statement>,
}

impl Prerequisites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_source(mut self, statement: Statement) -> Self {
        self.source.push(statement);
        self
    }

    pub fn on_target(mut self, statement: Statement) -> Self {
        self.target.push(statement);
        self
    }

    pub fn on_pair(mut self, statement: Statement) -> Self {
        self.source_target.push(statement);
        self
    }

    pub fn holds(
        &self,
        lookup: &dyn EntityLookup,
        source: &EntitySnapshot,
        target: &EntitySnapshot,
    ) -> Result<bool, RuleError> {
        for statement in &self.source {
            if !statement.holds(lookup, source, None)? {
                return Ok(false);
            }
        }
        for statement in &self.target {
            if !statement.holds(lookup, target, None)? {
                return Ok(false);
            }
        }
        for statement in &self.source_target {
            if !statement.holds(lookup, source, Some(target))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn explain(
        &self,
        lookup: &dyn EntityLookup,
        source: &EntitySnapshot,
        target: &EntitySnapshot,
    ) -> Result<Vec<String>, RuleError> {
        let mut reasons = Vec::new();
        for statement in &self.source {
            reasons.extend(statement.explain("source", lookup, source, None)?);
        }
        for statement in &self.target {
            reasons.extend(statement.explain("target", lookup, target, None)?);
        }
        for statement in &self.source_target {
            reasons.extend(statement.explain("source-target", lookup, source, Some(target))?);
        }
        Ok(reasons)
    }
}

// ---------------------------------------------------------------------------
// Consequences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Effect {
    Set(AttributeValue),
    /// Computed from the pre-action `(source, target)` snapshots.
    Compute(ComputeFn),
}

#[derive(Debug, Clone)]
pub struct AttributeEffect {
    pub attribute: String,
    pub effect: Effect,
}

#[derive(Debug, Clone, Default)]
pub struct Consequences {
    pub source: Vec<AttributeEffect>,
    pub target: Vec<AttributeEffect>,
}

impl Consequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source(mut self, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        self.source.push(AttributeEffect {
            attribute: attribute.to_string(),
            effect: Effect::Set(value.into()),
        });
        self
    }

    pub fn compute_source(mut self, attribute: &str, compute: ComputeFn) -> Self {
        self.source.push(AttributeEffect {
            attribute: attribute.to_string(),
            effect: Effect::Compute(compute),
        });
        self
    }

    pub fn set_target(mut self, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        self.target.push(AttributeEffect {
            attribute: attribute.to_string(),
            effect: Effect::Set(value.into()),
        });
        self
    }

    pub fn compute_target(mut self, attribute: &str, compute: ComputeFn) -> Self {
        self.target.push(AttributeEffect {
            attribute: attribute.to_string(),
            effect: Effect::Compute(compute),
        });
        self
    }

    /// Produces updated copies of `source` and `target`. All computed values
    /// read the original snapshots. When source and target are the same
    /// entity both effect lists land on one copy, returned twice.
    pub fn apply(
        &self,
        lookup: &dyn EntityLookup,
        source: &EntitySnapshot,
        target: &EntitySnapshot,
    ) -> Result<(EntitySnapshot, EntitySnapshot), RuleError> {
        let resolve = |effects: &[AttributeEffect]| -> Vec<(String, AttributeValue)> {
            effects
                .iter()
                .map(|effect| {
                    let value = match &effect.effect {
                        Effect::Set(value) => value.clone(),
                        Effect::Compute(compute) => compute(source, target),
                    };
                    (effect.attribute.clone(), value)
                })
                .collect()
        };
        let source_writes = resolve(&self.source);
        let target_writes = resolve(&self.target);

        let mut new_source = source.clone();
        for (name, value) in source_writes {
            write_attribute(lookup, &mut new_source, &name, value)?;
        }
        if source.id == target.id {
            for (name, value) in target_writes {
                write_attribute(lookup, &mut new_source, &name, value)?;
            }
            return Ok((new_source.clone(), new_source));
        }
        let mut new_target = target.clone();
        for (name, value) in target_writes {
            write_attribute(lookup, &mut new_target, &name, value)?;
        }
        Ok((new_source, new_target))
    }
}

/// Writes one attribute onto a snapshot, routing the relational names through
/// the location so node placement and storage stay exclusive.
pub fn write_attribute(
    lookup: &dyn EntityLookup,
    snapshot: &mut EntitySnapshot,
    name: &str,
    value: AttributeValue,
) -> Result<(), RuleError> {
    match (name, value) {
        (attr::NODE, AttributeValue::Node(Some(position)))
        | (attr::NODE, AttributeValue::Position(position)) => {
            snapshot.location = Location::Node { position };
            snapshot.position = Some(position);
        }
        (attr::NODE, AttributeValue::Node(None)) => {
            if snapshot.location.node().is_some() {
                snapshot.location = Location::Nowhere;
                snapshot.position = None;
            }
        }
        (attr::STORED_IN, AttributeValue::Entity(Some(container))) => {
            snapshot.location = Location::StoredIn { container };
            snapshot.position = lookup.lookup(container).and_then(|c| c.position);
        }
        (attr::STORED_IN, AttributeValue::Entity(None)) => {
            if snapshot.location.container().is_some() {
                snapshot.location = Location::Nowhere;
                snapshot.position = None;
            }
        }
        (attr::INVENTORY, AttributeValue::Entities(items)) => {
            snapshot.inventory = items;
        }
        (relational, value) if attr::is_relational(relational) => {
            return Err(RuleError::InvalidRelationalValue {
                attribute: relational.to_string(),
                found: value.kind_name(),
            });
        }
        (derived, _) if attr::is_derived(derived) => {
            return Err(RuleError::ReadOnlyAttribute(derived.to_string()));
        }
        (plain, value) => {
            snapshot.attributes.insert(plain.to_string(), value);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A named guard and effect, reusable across any `(source, target)` pair.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    description: String,
    prerequisites: Prerequisites,
    consequences: Consequences,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        prerequisites: Prerequisites,
        consequences: Consequences,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            prerequisites,
            consequences,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn prerequisites(&self) -> &Prerequisites {
        &self.prerequisites
    }

    pub fn consequences(&self) -> &Consequences {
        &self.consequences
    }

    pub fn is_applicable(
        &self,
        lookup: &dyn EntityLookup,
        source: &EntitySnapshot,
        target: &EntitySnapshot,
    ) -> Result<bool, RuleError> {
        self.prerequisites.holds(lookup, source, target)
    }

    /// Returns the updated `(source, target)` without touching the inputs.
    /// Fails with [`ActionError::PrerequisitesNotMet`] when called on a pair
    /// the action does not apply to.
    pub fn apply(
        &self,
        lookup: &dyn EntityLookup,
        source: &EntitySnapshot,
        target: &EntitySnapshot,
    ) -> Result<(EntitySnapshot, EntitySnapshot), ActionError> {
        if !self.is_applicable(lookup, source, target)? {
            return Err(ActionError::PrerequisitesNotMet {
                action: self.name.clone(),
                reasons: self.prerequisites.explain(lookup, source, target)?,
            });
        }
        Ok(self.consequences.apply(lookup, source, target)?)
    }
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

fn positions(
    label: &'static str,
    left: &AttributeValue,
    right: &AttributeValue,
) -> Result<(contracts::Position, contracts::Position), RuleError> {
    match (left.as_position(), right.as_position()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(RuleError::TypeMismatch {
            label,
            left: left.kind_name(),
            right: right.kind_name(),
        }),
    }
}

/// Same cell or one king-move apart.
pub fn within_reach(
    label: &'static str,
    left: &AttributeValue,
    right: &AttributeValue,
) -> Result<bool, RuleError> {
    let (l, r) = positions(label, left, right)?;
    Ok(l.chebyshev(r) <= 1)
}

pub fn same_position(
    label: &'static str,
    left: &AttributeValue,
    right: &AttributeValue,
) -> Result<bool, RuleError> {
    let (l, r) = positions(label, left, right)?;
    Ok(l == r)
}

/// Equality between values of the same kind.
pub fn equals(
    label: &'static str,
    left: &AttributeValue,
    right: &AttributeValue,
) -> Result<bool, RuleError> {
    if left.kind_name() != right.kind_name() {
        return Err(RuleError::TypeMismatch {
            label,
            left: left.kind_name(),
            right: right.kind_name(),
        });
    }
    Ok(left == right)
}
