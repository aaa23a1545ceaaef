//! # Custom Validation Rules
//!
//! A [`ValidationRule`] layers a custom check on top of the built-in field
//! checks. A rule is either global, seeing the whole [`ErrorCollector`], or
//! field-scoped, seeing a [`FieldErrors`] view that can only append under its
//! own field.
//!
//! ## Execution Policy
//!
//! | Scope  | Default        | Gate for `OnlyIfClean`         |
//! |--------|----------------|--------------------------------|
//! | global | `Always`       | the whole collector is empty   |
//! | field  | `OnlyIfClean`  | the field's bucket is empty    |
//!
//! The gate is evaluated against the collector as it stands when the rule's
//! turn comes, after all field checks and all earlier rules.

use std::fmt;
use std::sync::Arc;

use crate::collector::{ErrorCollector, FieldErrors};
use crate::instance::ModelInstance;

/// Check run with the whole collector.
pub type GlobalCheck = dyn Fn(&ModelInstance, &mut ErrorCollector) + Send + Sync;

/// Check run with a single field's error view.
pub type FieldCheck = dyn Fn(&ModelInstance, &mut FieldErrors<'_>) + Send + Sync;

/// Whether a rule runs given the current error state of its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPolicy {
    /// Run unconditionally.
    Always,
    /// Run only if the rule's scope has no errors yet.
    OnlyIfClean,
}

/// What a rule validates.
#[derive(Clone)]
pub enum RuleScope {
    /// The whole model.
    Global(Arc<GlobalCheck>),
    /// One named field.
    Field {
        /// Field the rule is bound to.
        name: String,
        /// The check itself.
        check: Arc<FieldCheck>,
    },
}

/// A custom validation with an execution policy.
#[derive(Clone)]
pub struct ValidationRule {
    scope: RuleScope,
    policy: ExecutionPolicy,
}

impl ValidationRule {
    /// A rule over the whole model. Runs `Always` unless overridden.
    pub fn global<F>(check: F) -> Self
    where
        F: Fn(&ModelInstance, &mut ErrorCollector) + Send + Sync + 'static,
    {
        Self {
            scope: RuleScope::Global(Arc::new(check)),
            policy: ExecutionPolicy::Always,
        }
    }

    /// A rule bound to `field`. Runs `OnlyIfClean` unless overridden.
    pub fn field<F>(field: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ModelInstance, &mut FieldErrors<'_>) + Send + Sync + 'static,
    {
        Self {
            scope: RuleScope::Field {
                name: field.into(),
                check: Arc::new(check),
            },
            policy: ExecutionPolicy::OnlyIfClean,
        }
    }

    /// Override the execution policy.
    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for `with_policy(ExecutionPolicy::Always)`.
    pub fn always(self) -> Self {
        self.with_policy(ExecutionPolicy::Always)
    }

    /// Shorthand for `with_policy(ExecutionPolicy::OnlyIfClean)`.
    pub fn only_if_clean(self) -> Self {
        self.with_policy(ExecutionPolicy::OnlyIfClean)
    }

    pub fn scope(&self) -> &RuleScope {
        &self.scope
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    /// The field a scoped rule is bound to; `None` for global rules.
    pub fn field_name(&self) -> Option<&str> {
        match &self.scope {
            RuleScope::Global(_) => None,
            RuleScope::Field { name, .. } => Some(name),
        }
    }

    /// Run the rule against `model` if its policy permits.
    ///
    /// Returns whether the check was executed.
    pub fn execute(&self, model: &ModelInstance, errors: &mut ErrorCollector) -> bool {
        match &self.scope {
            RuleScope::Global(check) => {
                if self.policy == ExecutionPolicy::OnlyIfClean && !errors.is_empty() {
                    return false;
                }
                check(model, errors);
            }
            RuleScope::Field { name, check } => {
                let mut scoped = errors.scoped(name);
                if self.policy == ExecutionPolicy::OnlyIfClean && !scoped.is_empty() {
                    return false;
                }
                check(model, &mut scoped);
            }
        }
        true
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("field", &self.field_name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
