// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use bilge::prelude::*;

use crate::system::SCREEN_WIDTH;

use super::{Ppu, Scanline};

const OBJS: usize = 40;
const OBJS_PER_LINE: usize = 10;

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
struct ObjAttrs {
    __: u4,
    palette: bool,
    x_flip: bool,
    y_flip: bool,
    bg_over_obj: bool,
}

#[derive(Debug, Clone, Copy)]
struct Obj {
    y: u8,
    x: u8,
    tile: u8,
    attrs: ObjAttrs,
    index: usize,
}

impl Obj {
    fn from_oam(oam: &[u8], index: usize) -> Self {
        let bytes = &oam[index * 4..index * 4 + 4];
        Self { y: bytes[0], x: bytes[1], tile: bytes[2], attrs: bytes[3].into(), index }
    }
}

/// Palette index of pixel `bit` (0 is the rightmost) of a 2bpp tile row.
fn color_index(low: u8, high: u8, bit: u8) -> u8 {
    let low = (low >> bit) & 0x1;
    let high = (high >> bit) & 0x1;
    (high << 1) | low
}

fn apply_palette(palette: u8, index: u8) -> u8 {
    (palette >> (index * 2)) & 0x3
}

impl Ppu {
    fn obj_height(&self) -> usize {
        if self.lcdc.obj_tall() {
            16
        } else {
            8
        }
    }

    /// VRAM offset of a BG/window tile.
    fn bg_tile_addr(&self, tile: u8) -> usize {
        if self.lcdc.tile_data_unsigned() {
            tile as usize * 16
        } else {
            (0x1000 + tile as i8 as isize * 16) as usize
        }
    }

    fn bg_pixel(&self, map_base: usize, x: u8, y: u8) -> u8 {
        let map_addr = map_base + 32 * (y as usize / 8) + x as usize / 8;
        let tile_addr = self.bg_tile_addr(self.vram[map_addr]) + (y as usize & 0x7) * 2;
        color_index(self.vram[tile_addr], self.vram[tile_addr + 1], 7 - (x & 0x7))
    }

    pub(super) fn window_visible(&self) -> bool {
        self.lcdc.bg_enable()
            && self.lcdc.window_enable()
            && self.wy <= self.ly
            && (self.wx as usize) < SCREEN_WIDTH + 7
    }

    /// Raw BG and window palette indices for the current line.
    fn render_bg(&self) -> Scanline {
        let mut line = [0; SCREEN_WIDTH];
        if !self.lcdc.bg_enable() {
            return line;
        }

        let bg_map = if self.lcdc.bg_map_high() { 0x1c00 } else { 0x1800 };
        let y = self.ly.wrapping_add(self.scy);
        for (lx, pixel) in line.iter_mut().enumerate() {
            let x = (lx as u8).wrapping_add(self.scx);
            *pixel = self.bg_pixel(bg_map, x, y);
        }

        if self.window_visible() {
            let window_map = if self.lcdc.window_map_high() { 0x1c00 } else { 0x1800 };
            let start = (self.wx as usize).saturating_sub(7);
            for (lx, pixel) in line.iter_mut().enumerate().skip(start) {
                let x = (lx + 7 - self.wx as usize) as u8;
                *pixel = self.bg_pixel(window_map, x, self.wly);
            }
        }

        line
    }

    /// The first objects in OAM order overlapping the current line, by drawing priority.
    fn line_objs(&self) -> Vec<Obj> {
        let height = self.obj_height();
        let target = self.ly as usize + 16;
        let mut objs: Vec<Obj> = (0..OBJS)
            .map(|i| Obj::from_oam(&self.oam, i))
            .filter(|obj| (obj.y as usize) <= target && target < obj.y as usize + height)
            .take(OBJS_PER_LINE)
            .collect();
        // Smaller X wins, then smaller OAM index
        objs.sort_by_key(|obj| (obj.x, obj.index));
        objs
    }

    /// Palette index and attributes of the highest priority opaque object pixel at `lx`.
    fn obj_pixel(&self, objs: &[Obj], lx: usize) -> Option<(u8, ObjAttrs)> {
        let height = self.obj_height();
        let target_x = lx + 8;
        objs.iter()
            .filter(|obj| (obj.x as usize) <= target_x && target_x < obj.x as usize + 8)
            .find_map(|obj| {
                let mut row = self.ly as usize + 16 - obj.y as usize;
                if obj.attrs.y_flip() {
                    row = height - 1 - row;
                }
                let tile = if height == 16 { obj.tile & 0xfe } else { obj.tile };
                let addr = tile as usize * 16 + row * 2;

                let mut bit = (target_x - obj.x as usize) as u8;
                if !obj.attrs.x_flip() {
                    bit = 7 - bit;
                }
                let color = color_index(self.vram[addr], self.vram[addr + 1], bit);
                (color != 0).then_some((color, obj.attrs))
            })
    }

    pub(super) fn render_line(&self) -> Scanline {
        let bg = self.render_bg();
        let mut line = if self.lcdc.bg_enable() {
            bg.map(|index| apply_palette(self.bgp, index))
        } else {
            [0; SCREEN_WIDTH]
        };

        if !self.lcdc.obj_enable() {
            return line;
        }

        let objs = self.line_objs();
        if objs.is_empty() {
            return line;
        }

        for (lx, pixel) in line.iter_mut().enumerate() {
            let Some((color, attrs)) = self.obj_pixel(&objs, lx) else {
                continue;
            };
            if attrs.bg_over_obj() && bg[lx] != 0 {
                continue;
            }
            let palette = if attrs.palette() { self.obp1 } else { self.obp0 };
            *pixel = apply_palette(palette, color);
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use std::iter::repeat;

    use crate::{ppu::tests::Context, ppu::VRAM_SIZE, reg};

    /// Tile 0 is index 3, tile 1 is index 0, laid out as a checkerboard.
    fn checkerboard_vram_init(vram: &mut [u8; VRAM_SIZE]) {
        vram[0..16].copy_from_slice(&[0xff; 16]);
        vram[16..32].copy_from_slice(&[0x00; 16]);
        for (y, x) in (0..32).flat_map(|y| repeat(y).zip(0..32)) {
            let addr = 0x1800 + 32 * y + x;
            vram[addr] = if x & 0x1 == y & 0x1 { 0x00 } else { 0x01 };
        }
    }

    fn checkerboard(ctx: &mut Context) {
        ctx.ppu.write(reg::BGP, 0xe4);
    }

    #[test]
    fn test_scroll_x() {
        let mut ctx = Context::new(checkerboard_vram_init);
        checkerboard(&mut ctx);
        for scx in (0..=255).step_by(3) {
            ctx.ppu.write(reg::SCX, scx);
            ctx.draw_frame();
            ctx.assert_frame(|x, y| {
                let tile_x = x.wrapping_add(scx) / 8;
                let tile_y = y / 8;
                if tile_x & 0x1 == tile_y & 0x1 {
                    3
                } else {
                    0
                }
            });
        }
    }

    #[test]
    fn test_scroll_y() {
        let mut ctx = Context::new(checkerboard_vram_init);
        checkerboard(&mut ctx);
        for scy in (0..=255).step_by(5) {
            ctx.ppu.write(reg::SCY, scy);
            ctx.draw_frame();
            ctx.assert_frame(|x, y| {
                let tile_x = x / 8;
                let tile_y = y.wrapping_add(scy) / 8;
                if tile_x & 0x1 == tile_y & 0x1 {
                    3
                } else {
                    0
                }
            });
        }
    }

    #[test]
    fn bg_palette_and_disable() {
        let mut ctx = Context::new(checkerboard_vram_init);
        // Index 3 maps to shade 1, index 0 to shade 2
        ctx.ppu.write(reg::BGP, 0x42);
        ctx.draw_frame();
        ctx.assert_frame(|x, y| if (x / 8) & 0x1 == (y / 8) & 0x1 { 1 } else { 2 });

        // BG off shows color 0 regardless of BGP
        ctx.ppu.write(reg::LCDC, 0x90);
        ctx.draw_frame();
        ctx.assert_frame(|_, _| 0);
    }

    #[test]
    fn signed_tile_data() {
        let mut ctx = Context::new(|vram| {
            // Tile 0 at 0x9000 is index 2, tile 0 at 0x8000 is index 1
            vram[0x1000..0x1010].copy_from_slice(&[0x00, 0xff].repeat(8));
            vram[0x0000..0x0010].copy_from_slice(&[0xff, 0x00].repeat(8));
            // Tile -1 at 0x8ff0 is index 3
            vram[0x0ff0..0x1000].copy_from_slice(&[0xff; 16]);
            for row in 0..32 {
                vram[0x1801 + 32 * row] = 0xff;
            }
        });
        ctx.ppu.write(reg::BGP, 0xe4);
        ctx.ppu.write(reg::LCDC, 0x81);
        ctx.draw_frame();
        ctx.assert_frame(|x, _| if (8..16).contains(&x) { 3 } else { 2 });

        ctx.ppu.write(reg::LCDC, 0x91);
        ctx.draw_frame();
        // Tiles 0x80 and up are shared by both addressing modes
        ctx.assert_frame(|x, _| if (8..16).contains(&x) { 3 } else { 1 });
    }

    #[test]
    fn window_overlays_background() {
        let mut ctx = Context::new(|vram| {
            vram[0x0010..0x0020].copy_from_slice(&[0xff; 16]);
            // Window map at 0x9c00 uses tile 1
            vram[0x1c00..0x2000].fill(0x01);
        });
        ctx.ppu.write(reg::BGP, 0xe4);
        ctx.ppu.write(reg::WY, 100);
        ctx.ppu.write(reg::WX, 7 + 40);
        ctx.ppu.write(reg::LCDC, 0xf1);
        ctx.draw_frame();
        ctx.assert_frame(|x, y| if y >= 100 && x >= 40 { 3 } else { 0 });
        assert_eq!(ctx.ppu.wly, 0, "window line counter resets each frame");
    }

    #[test]
    fn window_line_counter() {
        let mut ctx = Context::new(|vram| {
            // Tile 1 row 0 is index 3, the rest index 0
            vram[0x0010..0x0012].copy_from_slice(&[0xff, 0xff]);
            vram[0x1c00..0x2000].fill(0x01);
        });
        ctx.ppu.write(reg::BGP, 0xe4);
        ctx.ppu.write(reg::WY, 10);
        ctx.ppu.write(reg::WX, 7);
        ctx.ppu.write(reg::LCDC, 0xf1);
        ctx.draw_frame();
        // Every 8th window row starts a new tile whose first row is opaque
        ctx.assert_frame(|_, y| if y >= 10 && (y - 10) % 8 == 0 { 3 } else { 0 });
    }

    #[test]
    fn hidden_window_keeps_counter() {
        let mut ctx = Context::new(|_| ());
        ctx.ppu.write(reg::WY, 0);
        ctx.ppu.write(reg::WX, 167);
        ctx.ppu.write(reg::LCDC, 0xf1);
        ctx.run(crate::system::TCycles::PER_LINE * 20);
        assert_eq!(ctx.ppu.wly, 0);
        ctx.ppu.write(reg::WX, 166);
        ctx.run(crate::system::TCycles::PER_LINE * 20);
        assert_eq!(ctx.ppu.wly, 20);
    }

    fn sprite_vram_init(vram: &mut [u8; VRAM_SIZE]) {
        // Tile 2: left half index 1, right half index 2
        vram[0x20..0x30].copy_from_slice(&[0xf0, 0x0f].repeat(8));
        // Tile 3: solid index 3
        vram[0x30..0x40].copy_from_slice(&[0xff; 16]);
    }

    fn place(ctx: &mut Context, index: usize, obj: [u8; 4]) {
        ctx.ppu.oam_mut()[index * 4..index * 4 + 4].copy_from_slice(&obj);
    }

    #[test]
    fn sprite_flip_and_palette() {
        let mut ctx = Context::new(sprite_vram_init);
        ctx.ppu.write(reg::BGP, 0xe4);
        ctx.ppu.write(reg::OBP0, 0xe4);
        ctx.ppu.write(reg::OBP1, 0x1b);
        ctx.ppu.write(reg::LCDC, 0x93);
        place(&mut ctx, 0, [16, 8, 2, 0x00]);
        place(&mut ctx, 1, [16, 24, 2, 0x20]);
        place(&mut ctx, 2, [32, 8, 3, 0x10]);
        ctx.draw_frame();
        ctx.assert_frame(|x, y| match (x, y) {
            (0..=3, 0..=7) => 1,
            (4..=7, 0..=7) => 2,
            // X-flipped
            (16..=19, 0..=7) => 2,
            (20..=23, 0..=7) => 1,
            // OBP1 inverts
            (0..=7, 16..=23) => 0,
            _ => 0,
        });
    }

    #[test]
    fn lower_x_wins_then_lower_index() {
        let mut ctx = Context::new(sprite_vram_init);
        ctx.ppu.write(reg::OBP0, 0xe4);
        ctx.ppu.write(reg::OBP1, 0x00);
        ctx.ppu.write(reg::LCDC, 0x93);
        // Later in OAM but further left
        place(&mut ctx, 0, [16, 12, 3, 0x10]);
        place(&mut ctx, 1, [16, 8, 3, 0x00]);
        // Same X as entry 1, later index loses
        place(&mut ctx, 2, [16, 8, 3, 0x10]);
        ctx.draw_frame();
        ctx.assert_frame(|x, y| match (x, y) {
            (0..=7, 0..=7) => 3,
            _ => 0,
        });
    }

    #[test]
    fn transparent_pixels_fall_through() {
        let mut ctx = Context::new(sprite_vram_init);
        ctx.ppu.write(reg::OBP0, 0xe4);
        ctx.ppu.write(reg::LCDC, 0x93);
        // Tile 4 is transparent on the left half
        for row in 0..8 {
            ctx.ppu.write_vram(0x8040 + row * 2, 0x0f);
            ctx.ppu.write_vram(0x8041 + row * 2, 0x0f);
        }
        place(&mut ctx, 0, [16, 8, 4, 0x00]);
        place(&mut ctx, 1, [16, 9, 2, 0x00]);
        ctx.draw_frame();
        ctx.assert_frame(|x, y| match (x, y) {
            (1..=3, 0..=7) => 1,
            (4..=7, 0..=7) => 3,
            (8, 0..=7) => 2,
            _ => 0,
        });
    }

    #[test]
    fn bg_over_obj_priority() {
        let mut ctx = Context::new(|vram| {
            sprite_vram_init(vram);
            // BG tile 1 is index 1 on the left half, index 0 on the right half
            vram[0x10..0x20].copy_from_slice(&[0xf0, 0x00].repeat(8));
            vram[0x1800] = 0x01;
        });
        ctx.ppu.write(reg::BGP, 0xe4);
        ctx.ppu.write(reg::OBP0, 0xe4);
        ctx.ppu.write(reg::LCDC, 0x93);
        place(&mut ctx, 0, [16, 8, 3, 0x80]);
        ctx.draw_frame();
        ctx.assert_frame(|x, y| match (x, y) {
            (0..=3, 0..=7) => 1,
            (4..=7, 0..=7) => 3,
            _ => 0,
        });
    }

    #[test]
    fn tall_sprites() {
        let mut ctx = Context::new(sprite_vram_init);
        ctx.ppu.write(reg::OBP0, 0xe4);
        ctx.ppu.write(reg::LCDC, 0x97);
        // Tile 3 selects the pair 2/3
        place(&mut ctx, 0, [16, 8, 3, 0x00]);
        place(&mut ctx, 1, [16, 40, 3, 0x40]);
        ctx.draw_frame();
        ctx.assert_frame(|x, y| match (x, y) {
            (0..=3, 0..=7) => 1,
            (4..=7, 0..=7) => 2,
            (0..=7, 8..=15) => 3,
            // Y-flipped
            (32..=39, 0..=7) => 3,
            (32..=35, 8..=15) => 1,
            (36..=39, 8..=15) => 2,
            _ => 0,
        });
    }

    #[test]
    fn ten_sprites_per_line() {
        let mut ctx = Context::new(sprite_vram_init);
        ctx.ppu.write(reg::OBP0, 0xe4);
        ctx.ppu.write(reg::LCDC, 0x93);
        for i in 0..12 {
            place(&mut ctx, i, [16, 8 + 8 * i as u8, 3, 0x00]);
        }
        ctx.draw_frame();
        ctx.assert_frame(|x, y| if y < 8 && x < 80 { 3 } else { 0 });
    }
}
