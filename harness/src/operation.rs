use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    Query,
}

impl OperationKind {
    /// Order in which a worker attempts the enabled kinds each iteration.
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Create,
        OperationKind::Read,
        OperationKind::Update,
        OperationKind::Delete,
        OperationKind::Query,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Label under which failures of this kind are counted.
    pub fn code(self) -> &'static str {
        match self {
            OperationKind::Create => "c",
            OperationKind::Read => "r",
            OperationKind::Update => "u",
            OperationKind::Delete => "d",
            OperationKind::Query => "q",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Create => "Create",
            OperationKind::Read => "Read",
            OperationKind::Update => "Update",
            OperationKind::Delete => "Delete",
            OperationKind::Query => "Query",
        }
    }

    /// Create is the only kind that works on an empty keyspace.
    pub fn needs_existing_key(self) -> bool {
        !matches!(self, OperationKind::Create)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
