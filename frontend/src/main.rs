// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

#![allow(clippy::new_without_default)]

mod audio;
mod emulator;
mod options;
mod screen;

use std::time::Duration;

use clap::Parser;
use dmg_core::system::TCycles;
use log::info;

use audio::AudioStats;
use emulator::Dmg;
use options::Options;
use screen::Screen;

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    env_logger::init();

    let mut dmg = Dmg::new(&options)?;
    let mut screen = Screen::new();
    let mut audio = AudioStats::default();

    let mut result = Ok(());
    let mut frames = 0;
    while frames < options.frames {
        result = dmg.run_frame(&mut screen, &mut audio);
        if result.is_err() {
            break;
        }
        frames += 1;
    }

    // Keep the save even when the game crashed
    dmg.save()?;
    if let Some(path) = &options.screenshot {
        screen.write_png(path)?;
    }

    let emulated = Duration::from(TCycles(frames * TCycles::PER_FRAME));
    info!(
        "Ran {frames} frames ({:.2}s emulated), {} audio buffers ({} samples), peak amplitude {:.3}",
        emulated.as_secs_f64(),
        audio.buffers,
        audio.samples,
        audio.peak
    );
    result
}
