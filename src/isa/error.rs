use std::fmt;

/// Represents any failure that can occur while compiling encoding tables or resolving
/// system-register names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsaError {
    /// A coding string disagrees with its declared width, uses characters outside `0/1/x`, or an
    /// encoding diagram does not tile its word exactly.
    MalformedPattern(String),
    /// No system-register encoding matches the derived `(op0, op1, CRn, CRm, op2)` tuple.
    UnresolvedRegister {
        op0: u64,
        op1: u64,
        crn: u64,
        crm: u64,
        op2: u64,
    },
    Machine(String),
}

impl fmt::Display for IsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsaError::MalformedPattern(msg) => write!(f, "malformed pattern: {msg}"),
            IsaError::UnresolvedRegister {
                op0,
                op1,
                crn,
                crm,
                op2,
            } => write!(
                f,
                "no system register matches op0={op0} op1={op1} CRn={crn} CRm={crm} op2={op2}"
            ),
            IsaError::Machine(msg) => write!(f, "machine construction error: {msg}"),
        }
    }
}

impl std::error::Error for IsaError {}
