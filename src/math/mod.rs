pub mod array;
pub mod expr;
pub mod interp;
pub mod lambda;

pub use array::NdArray;
pub use expr::CompiledExpr;
pub use interp::{GridInterpolator, InterpMethod};
pub use lambda::Lambda;
