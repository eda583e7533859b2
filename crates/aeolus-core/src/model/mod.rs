//! Organ model: immutable topology plus the runtime state it addresses.

mod definition;
mod state;
mod tuning;

pub use definition::{
    DivisionDefinition, OrganDefinition, RankList, StopDefinition, MAX_DIVISIONS,
    MAX_RANKS_PER_STOP, MAX_STOPS_PER_DIVISION,
};
pub use state::{OrganModel, StopId, StopPhase};
pub use tuning::{Temperament, TuningCatalog, A4_FREQ, A4_NOTE};
