// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

#[cfg(feature = "kdl")]
mod kdl_helpers;
#[cfg(feature = "kdl")]
pub use kdl_helpers::*;
mod errors;
pub use errors::*;

mod partition_role;
pub use partition_role::*;

mod units;
pub use units::*;
pub mod filesystem;
pub use filesystem::*;
mod partition_type;
pub use partition_type::*;
mod wipe_mode;
pub use wipe_mode::*;
