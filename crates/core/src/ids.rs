use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Row id of a known vendor.
    ProviderId
);
id_type!(
    /// Row id of a known client.
    ClientId
);
id_type!(CategoryId);
id_type!(ExpenseId);
id_type!(IncomeId);
id_type!(
    /// Row id of an import batch in the job ledger.
    ImportJobId
);
