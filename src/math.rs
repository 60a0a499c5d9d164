//! Small arithmetic helpers shared by the container and set-builder modules.

/// Rounds `value` up to the next multiple of 8.
///
/// Grounded in `main.cpp`'s padding step:
/// `if(img->width % 8) img->width += 8 - (img->width % 8);`
pub fn round_up_to_multiple_of_8(value: u32) -> u32 {
    (value + 7) / 8 * 8
}

/// Halves a resolution with round-up, used to size the Cb/Cr planes in
/// planar mode (4:2:0 chroma subsampling). Grounded in `PlanarWorkSet.hpp`'s
/// `CrCbAdjustResolution`.
pub fn chroma_subsampled(value: u32) -> u32 {
    (value + 1) >> 1
}
