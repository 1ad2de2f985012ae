// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod actor;
mod coordinator;
mod error;
mod sink;
mod store;

pub use actor::*;
pub use coordinator::*;
pub use error::*;
pub use sink::*;
pub use store::*;
