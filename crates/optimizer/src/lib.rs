// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod allocation;
mod channel;
mod constraints;
mod optimizer;

pub use allocation::*;
pub use channel::*;
pub use constraints::*;
pub use optimizer::*;
