//! 펀더멘털 파이프라인의 도메인 모델.

mod fundamentals;
mod quote;
mod source;
mod trend;

pub use fundamentals::*;
pub use quote::*;
pub use source::*;
pub use trend::*;
