// Pipeline stages and shared errors/models
pub mod pipeline {
    pub use crate::pipeline::*;
}

pub mod aggregator {
    pub use crate::aggregator::*;
}

pub mod dedup {
    pub use crate::dedup::*;
}

pub mod filter {
    pub use crate::filter::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
