//! 파이프라인 전반에서 사용되는 공통 타입.

mod ticker;
mod unit;
mod value;

pub use ticker::*;
pub use unit::*;
pub use value::*;
