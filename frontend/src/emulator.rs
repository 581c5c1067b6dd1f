// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::PathBuf,
};

use anyhow::Context;
use dmg_core::{
    cart::Cart,
    system::{AudioConfig, GameBoy},
};
use log::{debug, info};

use crate::{audio::AudioStats, options::Options, screen::Screen};

pub struct Dmg {
    system: Box<GameBoy>,
    save_path: Option<PathBuf>,
    input: (u8, u8),
}

impl Dmg {
    pub fn new(options: &Options) -> anyhow::Result<Self> {
        let rom_file_name = &options.rom_file_name;
        let rom = fs::read(rom_file_name)
            .with_context(|| format!("Failed to read ROM {}", rom_file_name.display()))?;
        let mut cart = Cart::from_rom(rom.into_boxed_slice())?;

        let save_path = (cart.battery_backed() && !options.no_save)
            .then(|| rom_file_name.with_extension("sav"));
        if let Some(path) = save_path.as_ref().filter(|path| path.exists()) {
            let file = File::open(path)
                .with_context(|| format!("Failed to open save {}", path.display()))?;
            let save = bincode::deserialize_from(BufReader::new(file))
                .with_context(|| format!("Corrupt save {}", path.display()))?;
            cart.load_from_save(save)?;
            debug!("Loaded cartridge RAM from {}", path.display());
        }
        info!("Running \"{}\"", cart.title());

        let audio = AudioConfig {
            sample_rate: options.sample_rate,
            buffer_frames: options.buffer_frames,
        };
        Ok(Self {
            system: Box::new(GameBoy::new(cart, audio)),
            save_path,
            input: options.input_masks(),
        })
    }

    pub fn run_frame(&mut self, screen: &mut Screen, audio: &mut AudioStats) -> anyhow::Result<()> {
        let (directions, actions) = self.input;
        self.system.set_input(directions, actions);
        self.system.run_frame(screen, audio)?;
        Ok(())
    }

    /// Persists battery-backed RAM next to the ROM.
    pub fn save(&self) -> anyhow::Result<()> {
        let (Some(path), Some(save)) = (&self.save_path, self.system.cart().save()) else {
            return Ok(());
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create save {}", path.display()))?;
        bincode::serialize_into(BufWriter::new(file), &save)?;
        debug!("Wrote cartridge RAM to {}", path.display());
        Ok(())
    }
}
