//! Upstream provider integrations.

pub mod sources {
    pub use crate::sources::*;
}

pub mod validator {
    pub use crate::validator::*;
}

pub mod enrichment {
    pub use crate::enrichment::*;
}
