//! Interactive confirmation for irreversible operations

/// Operator's answer to "are you sure?"
///
/// Hard deletes take one of these; `Declined` turns the call into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
}

impl Confirmation {
    pub fn is_accepted(self) -> bool {
        self == Confirmation::Accepted
    }
}

impl From<bool> for Confirmation {
    fn from(accepted: bool) -> Self {
        if accepted {
            Confirmation::Accepted
        } else {
            Confirmation::Declined
        }
    }
}
