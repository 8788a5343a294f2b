mod fifo;
mod gpu;
mod lcd;
mod pipeline;
mod sprites;

pub use self::gpu::{Gpu, LINES_PER_FRAME, LINE_TICKS, SCREEN_H, SCREEN_W, VBK};
pub use self::lcd::{Lcdc, Mode, Stat, DMA, LCDC, LY, LYC, STAT};
pub use self::pipeline::FetchState;
