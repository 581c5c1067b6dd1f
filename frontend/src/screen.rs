// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::Context;
use dmg_core::system::{LcdSink, Scanline, SinkError, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Gray level of each palette index, lightest first.
const SHADES: [u8; 4] = [0xff, 0xaa, 0x55, 0x00];

/// Collects scanlines into the most recent complete frame.
pub struct Screen {
    frame: Box<[Scanline; SCREEN_HEIGHT]>,
}

impl Screen {
    pub fn new() -> Self {
        Self { frame: Box::new([[0; SCREEN_WIDTH]; SCREEN_HEIGHT]) }
    }

    fn gray_pixels(&self) -> Vec<u8> {
        self.frame.iter().flatten().map(|&shade| SHADES[shade as usize & 0x3]).collect()
    }

    pub fn write_png(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create screenshot {}", path.display()))?;
        let mut encoder =
            png::Encoder::new(BufWriter::new(file), SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.gray_pixels())?;
        writer.finish()?;
        Ok(())
    }
}

impl LcdSink for Screen {
    fn draw_line(&mut self, line: usize, pixels: &Scanline) -> Result<(), SinkError> {
        let row = self
            .frame
            .get_mut(line)
            .ok_or_else(|| format!("Scanline {line} is off screen"))?;
        *row = *pixels;
        Ok(())
    }
}
