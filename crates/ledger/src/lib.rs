// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod campaign;
mod ledger;
mod plaintext;

pub use campaign::*;
pub use ledger::*;
pub use plaintext::*;
