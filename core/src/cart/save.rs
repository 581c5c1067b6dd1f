// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use serde::{Deserialize, Serialize};

/// Battery-backed cartridge RAM, as persisted between sessions.
#[derive(Serialize, Deserialize)]
pub struct CartSave {
    pub ram: Box<[u8]>,
}
