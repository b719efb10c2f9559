// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod engine;
mod error;
mod operands;
mod operation;
mod probe;
mod result;
mod router;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use engine::*;
pub use error::*;
pub use operands::*;
pub use operation::*;
pub use probe::*;
pub use result::*;
pub use router::*;
