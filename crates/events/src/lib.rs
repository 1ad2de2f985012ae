// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod clock;
mod event_id;
mod eventbus;
mod ids;
pub mod prelude;
mod traits;
mod veil_event;

pub use clock::*;
pub use event_id::*;
pub use eventbus::*;
pub use ids::*;
pub use traits::*;
pub use veil_event::*;
