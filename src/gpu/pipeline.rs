use bitflags::bitflags;

use super::fifo::PixelFifo;
use super::gpu::{Gpu, SCREEN_W};
use super::lcd::Lcdc;
use super::sprites::{ObjAttrs, OamEntry};

const MAX_FETCHED_SPRITES: usize = 3;
// A new tile row is only queued once the FIFO can take all eight pixels.
const FIFO_THRESHOLD: usize = 8;

bitflags! {
    /// Tile attributes from VRAM bank 1 on colour hardware.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BgAttrs: u8 {
        const BANK = 1 << 3;
        const X_FLIP = 1 << 5;
        const Y_FLIP = 1 << 6;
        const PRIORITY = 1 << 7;
    }
}

impl BgAttrs {
    fn palette(&self) -> usize {
        (self.bits() & 0x07) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Tile,
    Data0,
    Data1,
    Idle,
    Push,
}

/// Fetcher state for the scanline being drawn.
#[derive(Debug)]
pub struct Pipeline {
    state: FetchState,
    line_x: u8,
    pub(super) pushed_x: u8,
    fetch_x: u8,
    fifo_x: u8,
    bgw_tile: u8,
    bgw_attrs: BgAttrs,
    bgw_row: u8,
    bgw_lo: u8,
    bgw_hi: u8,
    sprites: [OamEntry; MAX_FETCHED_SPRITES],
    sprite_count: usize,
    sprite_data: [u8; MAX_FETCHED_SPRITES * 2],
    pub(super) fifo: PixelFifo,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline {
            state: FetchState::Tile,
            line_x: 0,
            pushed_x: 0,
            fetch_x: 0,
            fifo_x: 0,
            bgw_tile: 0,
            bgw_attrs: BgAttrs::empty(),
            bgw_row: 0,
            bgw_lo: 0,
            bgw_hi: 0,
            sprites: [OamEntry::default(); MAX_FETCHED_SPRITES],
            sprite_count: 0,
            sprite_data: [0; MAX_FETCHED_SPRITES * 2],
            fifo: PixelFifo::new(),
        }
    }

    /// Prepares for a new scanline.
    pub fn reset(&mut self) {
        self.state = FetchState::Tile;
        self.line_x = 0;
        self.pushed_x = 0;
        self.fetch_x = 0;
        self.fifo_x = 0;
        self.sprite_count = 0;
        self.fifo.clear();
    }

    pub fn state(&self) -> FetchState {
        self.state
    }
}

impl Gpu {
    /// One dot of pixel transfer: the fetcher advances every other dot and
    /// a pixel may leave the FIFO every dot.
    pub(super) fn process_pipeline(&mut self) {
        if self.line_ticks & 1 == 0 {
            self.fetch();
        }
        self.push_pixel();
    }

    fn fetch(&mut self) {
        match self.pipeline.state {
            FetchState::Tile => {
                self.pipeline.sprite_count = 0;
                if self.lcd.control.contains(Lcdc::BGW_ENABLE) || self.cgb {
                    self.load_bg_tile();
                    self.load_window_tile();
                }
                if self.lcd.control.contains(Lcdc::OBJ_ENABLE) && !self.sprites.is_empty() {
                    self.load_sprite_tiles();
                }
                self.pipeline.fetch_x = self.pipeline.fetch_x.wrapping_add(8);
                self.pipeline.state = FetchState::Data0;
            }
            FetchState::Data0 => {
                self.pipeline.bgw_lo = self.read_tile_row(0);
                self.load_sprite_data(0);
                self.pipeline.state = FetchState::Data1;
            }
            FetchState::Data1 => {
                self.pipeline.bgw_hi = self.read_tile_row(1);
                self.load_sprite_data(1);
                self.pipeline.state = FetchState::Idle;
            }
            FetchState::Idle => self.pipeline.state = FetchState::Push,
            FetchState::Push => {
                if self.fifo_add() {
                    self.pipeline.state = FetchState::Tile;
                }
            }
        }
    }

    fn load_bg_tile(&mut self) {
        let map_y = self.lcd.ly.wrapping_add(self.lcd.scy);
        let map_x = self.pipeline.fetch_x.wrapping_add(self.lcd.scx);
        let addr = self.lcd.bg_map() + (map_x / 8) as u16 + (map_y / 8) as u16 * 32;

        self.load_map_entry(addr);
        self.pipeline.bgw_row = (map_y % 8) * 2;
    }

    fn load_window_tile(&mut self) {
        if !self.window_visible() {
            return;
        }
        let wx = self.lcd.wx as u16;
        let x = self.pipeline.fetch_x as u16 + 7;
        if x < wx {
            return;
        }
        let addr = self.lcd.win_map() + (x - wx) / 8 + (self.window_line / 8) as u16 * 32;

        self.load_map_entry(addr);
        self.pipeline.bgw_row = (self.window_line % 8) * 2;
        self.window_drawn = true;
    }

    fn load_map_entry(&mut self, addr: u16) {
        self.pipeline.bgw_tile = self.vram_at(addr, 0);
        self.pipeline.bgw_attrs = if self.cgb {
            BgAttrs::from_bits_retain(self.vram_at(addr, 1))
        } else {
            BgAttrs::empty()
        };
    }

    fn read_tile_row(&self, offset: u16) -> u8 {
        let attrs = self.pipeline.bgw_attrs;
        let row = if attrs.contains(BgAttrs::Y_FLIP) {
            14 - self.pipeline.bgw_row
        } else {
            self.pipeline.bgw_row
        };
        let bank = if attrs.contains(BgAttrs::BANK) { 1 } else { 0 };
        let addr = self.lcd.tile_addr(self.pipeline.bgw_tile) + row as u16 + offset;
        self.vram_at(addr, bank)
    }

    fn load_sprite_tiles(&mut self) {
        let fetch_x = self.pipeline.fetch_x as i32;
        let fine_x = (self.lcd.scx % 8) as i32;

        for entry in self.sprites.iter() {
            let sp_x = entry.x as i32 - 8 + fine_x;
            let covers = |x: i32| x >= fetch_x && x < fetch_x + 8;
            if covers(sp_x) || covers(sp_x + 8) {
                self.pipeline.sprites[self.pipeline.sprite_count] = *entry;
                self.pipeline.sprite_count += 1;
                if self.pipeline.sprite_count == MAX_FETCHED_SPRITES {
                    break;
                }
            }
        }
    }

    fn load_sprite_data(&mut self, offset: u16) {
        let height = self.lcd.obj_height();
        let line = self.lcd.ly as u16 + 16;

        for i in 0..self.pipeline.sprite_count {
            let entry = self.pipeline.sprites[i];
            let mut row = (line.wrapping_sub(entry.y as u16) as u8).wrapping_mul(2);
            if entry.attrs.contains(ObjAttrs::Y_FLIP) {
                row = (height * 2 - 2).wrapping_sub(row);
            }
            let tile = if height == 16 { entry.tile & !1 } else { entry.tile };
            let bank = if self.cgb && entry.attrs.contains(ObjAttrs::BANK) { 1 } else { 0 };
            let addr = 0x8000 + tile as u16 * 16 + row as u16 + offset;
            self.pipeline.sprite_data[i * 2 + offset as usize] = self.vram_at(addr, bank);
        }
    }

    /// Queues the fetched row. Returns false while the FIFO is too full.
    fn fifo_add(&mut self) -> bool {
        if self.pipeline.fifo.len() > FIFO_THRESHOLD {
            return false;
        }

        let attrs = self.pipeline.bgw_attrs;
        let bgw_enabled = self.lcd.control.contains(Lcdc::BGW_ENABLE);

        for i in 0..8 {
            let bit = if attrs.contains(BgAttrs::X_FLIP) { i } else { 7 - i };
            let lo = (self.pipeline.bgw_lo >> bit) & 1;
            let hi = ((self.pipeline.bgw_hi >> bit) & 1) << 1;
            let mut index = lo | hi;

            let mut colour = if self.cgb {
                self.lcd.bg_cgb.colour(attrs.palette(), index)
            } else {
                if !bgw_enabled {
                    index = 0;
                }
                self.lcd.bg_colours[index as usize]
            };

            if self.lcd.control.contains(Lcdc::OBJ_ENABLE) {
                colour = self.sprite_pixel(colour, index, attrs.contains(BgAttrs::PRIORITY));
            }

            self.pipeline.fifo.push(colour);
            self.pipeline.fifo_x = self.pipeline.fifo_x.wrapping_add(1);
        }
        true
    }

    /// Resolves the sprite pixel at `fifo_x` against the background. The
    /// first opaque sprite pixel in priority order decides the result.
    fn sprite_pixel(&self, bg_colour: u32, bg_index: u8, bg_priority: bool) -> u32 {
        let fifo_x = self.pipeline.fifo_x as i32;
        let fine_x = (self.lcd.scx % 8) as i32;

        for i in 0..self.pipeline.sprite_count {
            let entry = &self.pipeline.sprites[i];
            let offset = fifo_x - (entry.x as i32 - 8 + fine_x);
            if !(0..8).contains(&offset) {
                continue;
            }

            let bit = if entry.attrs.contains(ObjAttrs::X_FLIP) { offset } else { 7 - offset };
            let lo = (self.pipeline.sprite_data[i * 2] >> bit) & 1;
            let hi = ((self.pipeline.sprite_data[i * 2 + 1] >> bit) & 1) << 1;
            let index = lo | hi;
            if index == 0 {
                continue;
            }

            let bg_wins = if self.cgb {
                // LCDC bit 0 clear puts every sprite on top.
                self.lcd.control.contains(Lcdc::BGW_ENABLE) && bg_index != 0 &&
                (entry.attrs.contains(ObjAttrs::BG_PRIORITY) || bg_priority)
            } else {
                entry.attrs.contains(ObjAttrs::BG_PRIORITY) && bg_index != 0
            };
            if bg_wins {
                return bg_colour;
            }

            return if self.cgb {
                self.lcd.obj_cgb.colour(entry.attrs.cgb_palette(), index)
            } else {
                let palette = entry.attrs.contains(ObjAttrs::DMG_PALETTE) as usize;
                self.lcd.obj_colours[palette][index as usize]
            };
        }
        bg_colour
    }

    fn push_pixel(&mut self) {
        if self.pipeline.fifo.len() <= FIFO_THRESHOLD {
            return;
        }
        let pixel = match self.pipeline.fifo.pop() {
            Some(pixel) => pixel,
            None => return,
        };

        if self.pipeline.line_x >= self.lcd.scx % 8 {
            let offset = self.lcd.ly as usize * SCREEN_W + self.pipeline.pushed_x as usize;
            self.buffer[offset] = pixel;
            self.pipeline.pushed_x += 1;
        }
        self.pipeline.line_x += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interconnect::MemoryMapped;
    use crate::interrupt::InterruptController;
    use crate::gpu::lcd::{LCDC, WX, WY, BGP};
    use crate::gpu::{LINES_PER_FRAME, LINE_TICKS};

    fn solid_tile(gpu: &mut Gpu, base: u16) {
        for offset in 0..16 {
            gpu.writeb(base + offset, 0xFF);
        }
    }

    #[test]
    fn fetcher_cycles_through_states() {
        let mut gpu = Gpu::new(false);
        gpu.pipeline.reset();
        let expected = [FetchState::Data0, FetchState::Data1, FetchState::Idle, FetchState::Push,
                        FetchState::Tile];
        for state in expected.iter() {
            gpu.fetch();
            assert_eq!(gpu.pipeline.state(), *state);
        }
        assert_eq!(gpu.pipeline.fifo.len(), 8);
    }

    #[test]
    fn push_waits_for_room() {
        let mut gpu = Gpu::new(false);
        gpu.pipeline.reset();
        for _ in 0..9 {
            gpu.pipeline.fifo.push(0);
        }
        gpu.pipeline.state = FetchState::Push;
        gpu.fetch();
        assert_eq!(gpu.pipeline.state(), FetchState::Push);
        assert_eq!(gpu.pipeline.fifo.len(), 9);
    }

    #[test]
    fn window_covers_right_side() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        gpu.writeb(BGP, 0xE4);
        // Window map at 0x9C00 points at tile 1, which is solid colour 3.
        solid_tile(&mut gpu, 0x8010);
        for i in 0..32 {
            gpu.writeb(0x9C00 + i, 0x01);
        }
        gpu.writeb(LCDC, 0x91 | Lcdc::WIN_ENABLE.bits() | Lcdc::WIN_MAP_HIGH.bits());
        gpu.writeb(WY, 0);
        gpu.writeb(WX, 7 + 80);

        for _ in 0..LINE_TICKS {
            gpu.tick(&mut ic);
        }
        let line = &gpu.back_buffer()[..SCREEN_W];
        assert_eq!(line[79], 0xFFFFFFFF);
        assert_eq!(line[80], 0xFF000000);
        assert_eq!(line[159], 0xFF000000);
        assert_eq!(gpu.window_line, 1);
    }

    /// Window map at 0x9C00 full of solid tiles, window placed at the left
    /// edge of line 0 but left disabled.
    fn window_setup(gpu: &mut Gpu) {
        gpu.writeb(BGP, 0xE4);
        solid_tile(gpu, 0x8010);
        for i in 0..0x400 {
            gpu.writeb(0x9C00 + i, 0x01);
        }
        gpu.writeb(LCDC, 0x91 | Lcdc::WIN_MAP_HIGH.bits());
        gpu.writeb(WY, 0);
        gpu.writeb(WX, 7);
    }

    fn run_line(gpu: &mut Gpu, ic: &mut InterruptController) {
        for _ in 0..LINE_TICKS {
            gpu.tick(ic);
        }
    }

    #[test]
    fn window_enabled_after_wy_line_stays_hidden() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        window_setup(&mut gpu);

        run_line(&mut gpu, &mut ic);
        gpu.writeb(LCDC, 0x91 | Lcdc::WIN_ENABLE.bits() | Lcdc::WIN_MAP_HIGH.bits());
        run_line(&mut gpu, &mut ic);

        assert!(!gpu.window_triggered);
        assert_eq!(gpu.window_line, 0);
        let line1 = &gpu.back_buffer()[SCREEN_W..2 * SCREEN_W];
        assert!(line1.iter().all(|&p| p == 0xFFFFFFFF));
    }

    #[test]
    fn window_trigger_clears_after_vblank() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        window_setup(&mut gpu);
        gpu.writeb(LCDC, 0x91 | Lcdc::WIN_ENABLE.bits() | Lcdc::WIN_MAP_HIGH.bits());

        for _ in 0..LINES_PER_FRAME {
            run_line(&mut gpu, &mut ic);
        }
        assert_eq!(gpu.ly(), 0);
        assert!(!gpu.window_triggered);
        assert_eq!(gpu.window_line, 0);
        assert_eq!(gpu.back_buffer()[0], 0xFF000000);

        // WY now lies below line 0, so the next frame starts without the window.
        gpu.writeb(WY, 50);
        run_line(&mut gpu, &mut ic);
        assert!(!gpu.window_triggered);
        assert!(gpu.back_buffer()[..SCREEN_W].iter().all(|&p| p == 0xFFFFFFFF));
    }

    #[test]
    fn dmg_bg_disabled_draws_colour_zero() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        gpu.writeb(BGP, 0xE7);
        solid_tile(&mut gpu, 0x8000);
        gpu.writeb(LCDC, 0x90);

        for _ in 0..LINE_TICKS {
            gpu.tick(&mut ic);
        }
        assert!(gpu.back_buffer()[..SCREEN_W].iter().all(|&p| p == 0xFF000000));
    }
}
