use std::fmt;

use tracing::debug;

use crate::interconnect::MemoryMapped;
use crate::interrupt::{Interrupt, InterruptController};
use super::lcd::{Lcd, Lcdc, Mode, LCDC, LYC, OPRI, WX};
use super::lcd::{BCPS, OCPD};
use super::pipeline::Pipeline;
use super::sprites::ScanlineSprites;

pub const SCREEN_W: usize = 160;
pub const SCREEN_H: usize = 144;
pub const VBK: u16 = 0xFF4F;
pub const LINE_TICKS: u32 = 456;
pub const LINES_PER_FRAME: u8 = 154;

const VRAM_SZ: usize = 0x2000;
const OAM_SZ: usize = 0xA0;
const OAM_SCAN_TICKS: u32 = 80;
// Leftover registers at 0xFF72..0xFF75 with no function beyond storage.
const UNDOC_BASE: u16 = 0xFF72;
const UNDOC_END: u16 = 0xFF75;

pub struct Gpu {
    pub(super) lcd: Lcd,
    pub(super) vram: Vec<u8>, // 0x8000 -> 0x9FFF, two banks on CGB
    vram_bank: usize,
    oam: [u8; OAM_SZ], // 0xFE00 -> 0xFE9F
    pub(super) cgb: bool,
    pub(super) line_ticks: u32,
    pub(super) window_line: u8,
    pub(super) window_triggered: bool,
    pub(super) window_drawn: bool,
    pub(super) sprites: ScanlineSprites,
    pub(super) pipeline: Pipeline,
    pub(super) buffer: Vec<u32>,
    undoc: [u8; 4],
    frame: u64,
}

impl fmt::Debug for Gpu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f,
                 "gpu: mode: {:?} ly: {} ticks: {} lcdc: 0x{:02x} frame: {}",
                 self.lcd.mode,
                 self.lcd.ly,
                 self.line_ticks,
                 self.lcd.control.bits(),
                 self.frame)
    }
}

impl Gpu {
    pub fn new(cgb: bool) -> Gpu {
        let mut gpu = Gpu {
            lcd: Lcd::new(cgb),
            vram: vec![0; VRAM_SZ * 2],
            vram_bank: 0,
            oam: [0; OAM_SZ],
            cgb: cgb,
            line_ticks: 0,
            window_line: 0,
            window_triggered: false,
            window_drawn: false,
            sprites: ScanlineSprites::new(),
            pipeline: Pipeline::new(),
            buffer: vec![0xFFFFFFFF; SCREEN_W * SCREEN_H],
            undoc: [0; 4],
            frame: 0,
        };
        gpu.lcd.compare_ly();
        gpu.undoc[3] = 0x8F;
        gpu
    }

    pub fn mode(&self) -> Mode {
        self.lcd.mode
    }

    pub fn ly(&self) -> u8 {
        self.lcd.ly
    }

    pub fn line_ticks(&self) -> u32 {
        self.line_ticks
    }

    /// Frames completed since power on.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn back_buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcd.control.contains(Lcdc::LCD_ENABLE)
    }

    /// Reads VRAM through the currently selected bank.
    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram_at(addr, self.vram_bank)
    }

    pub fn write_vram(&mut self, addr: u16, val: u8) {
        let offset = self.vram_bank * VRAM_SZ + (addr as usize & (VRAM_SZ - 1));
        self.vram[offset] = val;
    }

    pub(super) fn vram_at(&self, addr: u16, bank: usize) -> u8 {
        self.vram[bank * VRAM_SZ + (addr as usize & (VRAM_SZ - 1))]
    }

    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam[(addr - 0xFE00) as usize]
    }

    pub fn write_oam(&mut self, addr: u16, val: u8) {
        self.oam[(addr - 0xFE00) as usize] = val;
    }

    /// Raw OAM store used by DMA.
    pub fn dma_write_oam(&mut self, offset: u16, val: u8) {
        if offset as usize >= OAM_SZ {
            panic!("OAM DMA offset 0x{:02x} out of range", offset);
        }
        self.oam[offset as usize] = val;
    }

    /// Advances the PPU by one dot. Returns the mode just entered, if any.
    pub fn tick(&mut self, ic: &mut InterruptController) -> Option<Mode> {
        if !self.lcd_enabled() {
            return None;
        }

        self.line_ticks += 1;

        match self.lcd.mode {
            Mode::OamScan => self.mode_oam(ic),
            Mode::Transfer => self.mode_transfer(ic),
            Mode::HBlank => self.mode_hblank(ic),
            Mode::VBlank => self.mode_vblank(ic),
        }
    }

    fn mode_oam(&mut self, ic: &mut InterruptController) -> Option<Mode> {
        if self.line_ticks == 1 {
            let height = self.lcd.obj_height();
            self.sprites.scan(&self.oam, self.lcd.ly, height, !self.cgb);
            self.window_drawn = false;
            if !self.window_triggered && self.lcd.control.contains(Lcdc::WIN_ENABLE) &&
               self.lcd.ly == self.lcd.wy {
                self.window_triggered = true;
            }
        }

        if self.line_ticks >= OAM_SCAN_TICKS {
            self.pipeline.reset();
            return self.enter(Mode::Transfer, ic);
        }
        None
    }

    fn mode_transfer(&mut self, ic: &mut InterruptController) -> Option<Mode> {
        self.process_pipeline();

        if self.pipeline.pushed_x as usize >= SCREEN_W {
            self.pipeline.fifo.clear();
            return self.enter(Mode::HBlank, ic);
        }
        None
    }

    fn mode_hblank(&mut self, ic: &mut InterruptController) -> Option<Mode> {
        if self.line_ticks < LINE_TICKS {
            return None;
        }
        self.line_ticks = 0;
        self.next_line(ic);

        if self.lcd.ly as usize >= SCREEN_H {
            ic.request_interrupt(Interrupt::VBlank);
            self.frame += 1;
            self.enter(Mode::VBlank, ic)
        } else {
            self.enter(Mode::OamScan, ic)
        }
    }

    fn mode_vblank(&mut self, ic: &mut InterruptController) -> Option<Mode> {
        if self.line_ticks < LINE_TICKS {
            return None;
        }
        self.line_ticks = 0;
        self.next_line(ic);

        if self.lcd.ly >= LINES_PER_FRAME {
            self.window_line = 0;
            self.window_triggered = false;
            self.set_ly(0, ic);
            return self.enter(Mode::OamScan, ic);
        }
        None
    }

    fn enter(&mut self, mode: Mode, ic: &mut InterruptController) -> Option<Mode> {
        self.lcd.mode = mode;
        if self.lcd.stat.intersects(mode.stat_source()) {
            ic.request_interrupt(Interrupt::LCDCStat);
        }
        Some(mode)
    }

    fn next_line(&mut self, ic: &mut InterruptController) {
        if self.window_drawn {
            self.window_line = self.window_line.wrapping_add(1);
        }
        let ly = self.lcd.ly + 1;
        self.set_ly(ly, ic);
    }

    fn set_ly(&mut self, ly: u8, ic: &mut InterruptController) {
        self.lcd.ly = ly;
        if self.lcd.compare_ly() {
            ic.request_interrupt(Interrupt::LCDCStat);
        }
    }

    pub(super) fn window_visible(&self) -> bool {
        self.lcd.control.contains(Lcdc::WIN_ENABLE) && self.window_triggered &&
        self.lcd.wx <= 166 && (self.lcd.wy as usize) < SCREEN_H
    }

    fn write_lcdc(&mut self, val: u8) {
        let was_on = self.lcd_enabled();
        self.lcd.write(LCDC, val);

        match (was_on, self.lcd_enabled()) {
            (true, false) => {
                debug!("LCD off at ly {}", self.lcd.ly);
                self.lcd.ly = 0;
                self.lcd.mode = Mode::HBlank;
                self.line_ticks = 0;
                self.window_line = 0;
                self.window_triggered = false;
                self.pipeline.reset();
                self.lcd.compare_ly();
            }
            (false, true) => {
                debug!("LCD on");
                self.lcd.mode = Mode::OamScan;
                self.line_ticks = 0;
            }
            _ => {}
        }
    }
}

impl MemoryMapped for Gpu {
    fn readb(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0x9FFF => self.read_vram(addr),
            0xFE00..=0xFE9F => self.read_oam(addr),
            LCDC..=WX | BCPS..=OPRI => self.lcd.read(addr),
            VBK => self.vram_bank as u8 | 0xFE,
            UNDOC_BASE..=UNDOC_END => {
                let val = self.undoc[(addr - UNDOC_BASE) as usize];
                if addr == UNDOC_END { val | 0x8F } else { val }
            }
            _ => panic!("GPU can't read 0x{:04x}", addr),
        }
    }

    fn writeb(&mut self, addr: u16, val: u8) {
        match addr {
            0x8000..=0x9FFF => self.write_vram(addr, val),
            0xFE00..=0xFE9F => self.write_oam(addr, val),
            LCDC => self.write_lcdc(val),
            LYC => {
                self.lcd.write(addr, val);
                self.lcd.compare_ly();
            }
            LCDC..=WX | BCPS..=OCPD | OPRI => self.lcd.write(addr, val),
            VBK => {
                if self.cgb {
                    self.vram_bank = (val & 0x01) as usize;
                }
            }
            UNDOC_BASE..=UNDOC_END => self.undoc[(addr - UNDOC_BASE) as usize] = val,
            _ => panic!("GPU can't write to 0x{:04x}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::lcd::{Stat, STAT, LY, BGP, SCX, OBP0};

    fn run(gpu: &mut Gpu, ic: &mut InterruptController, ticks: u32) {
        for _ in 0..ticks {
            gpu.tick(ic);
        }
    }

    #[test]
    fn line_takes_456_ticks() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();

        run(&mut gpu, &mut ic, OAM_SCAN_TICKS);
        assert_eq!(gpu.mode(), Mode::Transfer);
        run(&mut gpu, &mut ic, LINE_TICKS - OAM_SCAN_TICKS - 1);
        assert_eq!(gpu.mode(), Mode::HBlank);
        assert_eq!(gpu.ly(), 0);
        run(&mut gpu, &mut ic, 1);
        assert_eq!(gpu.mode(), Mode::OamScan);
        assert_eq!(gpu.ly(), 1);
        assert_eq!(gpu.line_ticks(), 0);
    }

    #[test]
    fn frame_takes_154_lines() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();

        run(&mut gpu, &mut ic, LINE_TICKS * SCREEN_H as u32);
        assert_eq!(gpu.mode(), Mode::VBlank);
        assert_eq!(gpu.ly(), SCREEN_H as u8);
        assert_eq!(gpu.frame(), 1);
        assert_eq!(ic.iflag & Interrupt::VBlank as u8, Interrupt::VBlank as u8);

        run(&mut gpu, &mut ic, LINE_TICKS * (LINES_PER_FRAME as u32 - SCREEN_H as u32));
        assert_eq!(gpu.mode(), Mode::OamScan);
        assert_eq!(gpu.ly(), 0);
        assert_eq!(gpu.line_ticks(), 0);
    }

    #[test]
    fn stat_sources_fire_on_mode_entry() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        gpu.writeb(STAT, Stat::HBLANK_INT.bits());

        while gpu.mode() != Mode::HBlank {
            gpu.tick(&mut ic);
        }
        assert_eq!(ic.iflag, Interrupt::LCDCStat as u8);

        ic.iflag = 0;
        gpu.writeb(STAT, Stat::OAM_INT.bits());
        while gpu.mode() != Mode::OamScan {
            gpu.tick(&mut ic);
        }
        assert_eq!(ic.iflag, Interrupt::LCDCStat as u8);
    }

    #[test]
    fn lyc_coincidence() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        gpu.writeb(STAT, Stat::LYC_INT.bits());
        gpu.writeb(LYC, 2);
        assert_eq!(gpu.readb(STAT) & Stat::COINCIDENCE.bits(), 0);

        run(&mut gpu, &mut ic, LINE_TICKS * 2);
        assert_eq!(gpu.readb(LY), 2);
        assert_ne!(gpu.readb(STAT) & Stat::COINCIDENCE.bits(), 0);
        assert_eq!(ic.iflag, Interrupt::LCDCStat as u8);

        run(&mut gpu, &mut ic, LINE_TICKS);
        assert_eq!(gpu.readb(STAT) & Stat::COINCIDENCE.bits(), 0);
    }

    #[test]
    fn lcd_off_holds_ly() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        run(&mut gpu, &mut ic, LINE_TICKS * 3 + 10);
        gpu.writeb(LCDC, 0x11);
        assert_eq!(gpu.readb(LY), 0);
        assert_eq!(gpu.mode(), Mode::HBlank);
        run(&mut gpu, &mut ic, LINE_TICKS * 2);
        assert_eq!(gpu.readb(LY), 0);
        assert_eq!(ic.iflag, 0);

        gpu.writeb(LCDC, 0x91);
        assert_eq!(gpu.mode(), Mode::OamScan);
        run(&mut gpu, &mut ic, LINE_TICKS);
        assert_eq!(gpu.readb(LY), 1);
    }

    #[test]
    fn renders_background_tile() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        gpu.writeb(BGP, 0xE4);
        // Tile 1: every row is colour 3 on the left half, colour 1 on the right.
        for row in 0..8 {
            gpu.writeb(0x8010 + row * 2, 0xFF);
            gpu.writeb(0x8011 + row * 2, 0xF0);
        }
        gpu.writeb(0x9800, 0x01);

        run(&mut gpu, &mut ic, LINE_TICKS);
        let line = &gpu.back_buffer()[..SCREEN_W];
        assert_eq!(&line[0..4], &[0xFF000000; 4]);
        assert_eq!(&line[4..8], &[0xFFAAAAAA; 4]);
        assert_eq!(&line[8..16], &[0xFFFFFFFF; 8]);
    }

    #[test]
    fn fine_scroll_shifts_pixels() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        gpu.writeb(BGP, 0xE4);
        for row in 0..8 {
            gpu.writeb(0x8010 + row * 2, 0xFF);
            gpu.writeb(0x8011 + row * 2, 0xFF);
        }
        gpu.writeb(0x9800, 0x01);
        gpu.writeb(SCX, 3);

        run(&mut gpu, &mut ic, LINE_TICKS);
        let line = &gpu.back_buffer()[..SCREEN_W];
        assert_eq!(&line[0..5], &[0xFF000000; 5]);
        assert_eq!(line[5], 0xFFFFFFFF);
    }

    #[test]
    fn sprite_drawn_over_background() {
        let mut gpu = Gpu::new(false);
        let mut ic = InterruptController::new();
        gpu.writeb(LCDC, 0x93);
        gpu.writeb(OBP0, 0xE4);
        for row in 0..8 {
            gpu.writeb(0x8020 + row * 2, 0xFF);
            gpu.writeb(0x8021 + row * 2, 0xFF);
        }
        gpu.writeb(0xFE00, 16);
        gpu.writeb(0xFE01, 8 + 20);
        gpu.writeb(0xFE02, 2);

        run(&mut gpu, &mut ic, LINE_TICKS);
        let line = &gpu.back_buffer()[..SCREEN_W];
        assert_eq!(line[19], 0xFFFFFFFF);
        assert_eq!(&line[20..28], &[0xFF000000; 8]);
        assert_eq!(line[28], 0xFFFFFFFF);
    }

    #[test]
    fn vram_banks_only_on_cgb() {
        let mut dmg = Gpu::new(false);
        dmg.writeb(VBK, 1);
        assert_eq!(dmg.readb(VBK), 0xFE);

        let mut cgb = Gpu::new(true);
        cgb.writeb(0x8000, 0x11);
        cgb.writeb(VBK, 1);
        assert_eq!(cgb.readb(VBK), 0xFF);
        assert_eq!(cgb.readb(0x8000), 0x00);
        cgb.writeb(0x8000, 0x22);
        cgb.writeb(VBK, 0);
        assert_eq!(cgb.readb(0x8000), 0x11);
        assert_eq!(cgb.vram_at(0x8000, 1), 0x22);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn dma_write_past_oam_is_fatal() {
        let mut gpu = Gpu::new(false);
        gpu.dma_write_oam(0xA0, 0);
    }

    #[test]
    fn stat_write_keeps_mode_bits() {
        let mut gpu = Gpu::new(false);
        gpu.writeb(STAT, 0xFF);
        let stat = gpu.readb(STAT);
        assert_eq!(stat & 0x78, 0x78);
        assert_eq!(stat & 0x03, Mode::OamScan as u8);
    }
}
