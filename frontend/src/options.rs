// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dmg_core::joypad::Button;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputButton {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl From<InputButton> for Button {
    fn from(button: InputButton) -> Self {
        match button {
            InputButton::Right => Button::Right,
            InputButton::Left => Button::Left,
            InputButton::Up => Button::Up,
            InputButton::Down => Button::Down,
            InputButton::A => Button::A,
            InputButton::B => Button::B,
            InputButton::Select => Button::Select,
            InputButton::Start => Button::Start,
        }
    }
}

/// Runs a DMG ROM without a window for a fixed number of frames.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    pub rom_file_name: PathBuf,

    /// Number of frames to emulate
    #[arg(long, default_value_t = 600)]
    pub frames: usize,

    /// Audio sample rate in Hz
    #[arg(long, default_value_t = 48000)]
    pub sample_rate: u32,

    /// Stereo frames per audio buffer
    #[arg(long, default_value_t = 1024)]
    pub buffer_frames: usize,

    /// Write the last frame to this PNG file
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Buttons held down for the whole run
    #[arg(long, value_enum, value_delimiter = ',')]
    pub input: Vec<InputButton>,

    /// Neither load nor store battery-backed RAM
    #[arg(long)]
    pub no_save: bool,
}

impl Options {
    /// Direction and action masks for [`dmg_core::system::GameBoy::set_input`].
    pub fn input_masks(&self) -> (u8, u8) {
        self.input.iter().map(|&b| Button::from(b)).fold((0, 0), |(dirs, acts), button| {
            if button.is_direction() {
                (dirs | button.mask_bit(), acts)
            } else {
                (dirs, acts | button.mask_bit())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::parse_from(["dmg-boy", "game.gb"]);
        assert_eq!(options.rom_file_name, PathBuf::from("game.gb"));
        assert_eq!(options.frames, 600);
        assert_eq!(options.sample_rate, 48000);
        assert_eq!(options.buffer_frames, 1024);
        assert!(options.screenshot.is_none());
        assert!(!options.no_save);
        assert_eq!(options.input_masks(), (0, 0));
    }

    #[test]
    fn scripted_input() {
        let options =
            Options::parse_from(["dmg-boy", "game.gb", "--input", "right,a,down,start"]);
        assert_eq!(options.input_masks(), (0b1001, 0b1001));
    }
}
