//! ITU-R BT.601 colour conversion, video range
//!
//! Y lands in [16, 235] and Cb/Cr in [16, 240]. Both directions use the same
//! range; mixing video-range on one side with full-range on the other is the
//! classic green-cast foot-gun and is pinned down by the round-trip test.

/// RGB to YCbCr, BT.601 video range.
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 16.0 + (65.738 * r + 129.057 * g + 25.064 * b) / 256.0;
    let cb = 128.0 + (-37.945 * r - 74.494 * g + 112.439 * b) / 256.0;
    let cr = 128.0 + (112.439 * r - 94.154 * g - 18.285 * b) / 256.0;
    (
        y.round().clamp(16.0, 235.0) as u8,
        cb.round().clamp(16.0, 240.0) as u8,
        cr.round().clamp(16.0, 240.0) as u8,
    )
}

/// YCbCr to RGB, BT.601 video range, clamped to [0, 255].
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let yt = 298.082 * (y as f32 - 16.0);
    let cb = cb as f32 - 128.0;
    let cr = cr as f32 - 128.0;
    let r = 0.003906 * (yt + 408.583 * cr);
    let g = 0.003906 * (yt - 100.291 * cb - 208.120 * cr);
    let b = 0.003906 * (yt + 516.411 * cb);
    (
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    )
}
