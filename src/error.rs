//! Error types
//!
//! Two layers fail independently: calls into the engine return
//! [`EngineError`], the binding protocol returns [`BindError`]. Partial
//! success of an installation is not an error at all; it is reported through
//! [`InstallStatus::Degraded`].

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// Failure of a call into the script engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Value does not refer to a live object
    #[error("invalid object: {0:?}")]
    InvalidObject(Value),
    /// Callee is not callable
    #[error("value is not a function: {0:?}")]
    NotAFunction(Value),
    /// Callee cannot be used with `new`
    #[error("value is not a constructor: {0:?}")]
    NotAConstructor(Value),
    /// Assignment to an accessor property without a setter
    #[error("cannot set property '{0}' which has only a getter")]
    ReadOnlyProperty(String),
    /// `setPrototypeOf` would create a cycle
    #[error("cyclic prototype chain")]
    PrototypeCycle,
    /// Persistent reference id is unknown or was deleted
    #[error("invalid reference: {0}")]
    InvalidReference(u32),
    /// Object already carries native data
    #[error("object is already wrapped")]
    AlreadyWrapped,
    /// No free heap slots left
    #[error("heap exhausted ({capacity} objects)")]
    HeapExhausted { capacity: usize },
    /// Engine has been torn down
    #[error("engine has been torn down")]
    TornDown,
    /// Type error raised by the engine or a native callback
    #[error("TypeError: {0}")]
    TypeError(String),
    /// Exception thrown by a native callback
    #[error("uncaught exception: {0}")]
    Exception(String),
}

/// Failure of the class binding protocol
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("invalid class or member name '{0}'")]
    InvalidName(String),
    #[error("property '{0}' needs a getter or a setter")]
    EmptyAccessor(String),
    #[error("class '{0}' already has a finalizer")]
    FinalizerAlreadySet(String),
    #[error("class '{0}' is installed, its members are frozen")]
    MembersFrozen(String),
    #[error("class '{0}' is already installed")]
    AlreadyInstalled(String),
    #[error("class '{0}' is not installed")]
    NotInstalled(String),
    #[error("class '{0}' has been destroyed")]
    Destroyed(String),
    #[error("class '{0}' has no constructor reference")]
    NoConstructor(String),
    #[error("parent prototype of class '{0}' is not a live object")]
    ParentNotInstalled(String),
    #[error("class registry has been shut down")]
    RegistryShutDown,
    #[error("class '{class}' installed with {} issue(s)", .issues.len())]
    Incomplete {
        class: String,
        issues: Vec<InstallIssue>,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type EngineResult<T> = Result<T, EngineError>;
pub type BindResult<T> = Result<T, BindError>;

/// Installation step that may fail without aborting the install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    /// Rewiring the prototype chain to the parent prototype
    Inherit,
    /// Creating the persistent constructor reference
    ConstructorReference,
    /// Publishing the class on the parent namespace
    Publish,
    /// Fetching and rooting the class prototype
    Prototype,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStep::Inherit => "inherit",
            InstallStep::ConstructorReference => "constructor reference",
            InstallStep::Publish => "publish",
            InstallStep::Prototype => "prototype",
        };
        f.write_str(name)
    }
}

/// A non-fatal failure recorded during installation
#[derive(Debug, Clone, PartialEq)]
pub struct InstallIssue {
    pub step: InstallStep,
    pub error: EngineError,
}

impl fmt::Display for InstallIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.error)
    }
}

/// Outcome of a successful installation
#[derive(Debug, Clone, PartialEq)]
pub enum InstallStatus {
    /// Every step succeeded
    Complete,
    /// The class is live but some steps failed
    Degraded(Vec<InstallIssue>),
}

impl InstallStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, InstallStatus::Complete)
    }

    /// Issues recorded during installation (empty when complete)
    pub fn issues(&self) -> &[InstallIssue] {
        match self {
            InstallStatus::Complete => &[],
            InstallStatus::Degraded(issues) => issues,
        }
    }

    /// Check whether a given step failed
    pub fn failed(&self, step: InstallStep) -> bool {
        self.issues().iter().any(|issue| issue.step == step)
    }
}
