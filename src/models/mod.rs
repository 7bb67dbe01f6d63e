pub mod black_scholes;
pub mod chain;
pub mod d1d2;
pub mod normal;
pub mod span;

pub use black_scholes::{OptionPosition, OptionType};
pub use chain::{ChainPlan, OptionChain, OptionChainCalculator};
pub use span::ValueSpan;
