mod dma;
mod hdma;

pub use self::dma::{Dma, DmaTransfer, DMA, OAM_DMA_LEN};
pub use self::hdma::{Hdma, HdmaStart, HdmaTransfer, HDMA1, HDMA5, HDMA_BLOCK};
