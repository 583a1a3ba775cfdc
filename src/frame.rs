/// 已解码帧 (拉流 → 显示)
/// A single decoded image, RGBA8, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 会话内的帧序号, 从 0 开始
    pub seq: u64,
}

impl Frame {
    pub fn new(rgba_data: Vec<u8>, width: u32, height: u32, seq: u64) -> Self {
        debug_assert_eq!(rgba_data.len(), width as usize * height as usize * 4);
        Self {
            rgba_data,
            width,
            height,
            seq,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.rgba_data.len()
    }
}
