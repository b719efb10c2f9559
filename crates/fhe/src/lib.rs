// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod circuit;
mod engine;
pub mod params;
mod runtime;

pub use circuit::*;
pub use engine::*;
pub use runtime::*;
