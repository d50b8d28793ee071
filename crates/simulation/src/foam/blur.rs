use super::intensity::IntensityGrid;

/// Separable 3-tap box blur, applied `passes` times.
///
/// Each pass averages over the in-bounds neighbours only, so edges do not darken
/// and a uniform grid stays uniform. Values stay within the input range.
pub fn box_blur(grid: &mut IntensityGrid, passes: u32) {
    if passes == 0 {
        return;
    }
    let (w, h) = (grid.width(), grid.height());
    let mut scratch = vec![0.0_f32; w * h];

    for _ in 0..passes {
        // Horizontal: grid -> scratch.
        {
            let src = grid.values();
            for y in 0..h {
                let row = &src[y * w..(y + 1) * w];
                for x in 0..w {
                    let lo = x.saturating_sub(1);
                    let hi = (x + 1).min(w - 1);
                    let sum: f32 = row[lo..=hi].iter().sum();
                    scratch[y * w + x] = sum / (hi - lo + 1) as f32;
                }
            }
        }
        // Vertical: scratch -> grid.
        let dst = grid.values_mut();
        for y in 0..h {
            let lo = y.saturating_sub(1);
            let hi = (y + 1).min(h - 1);
            let count = (hi - lo + 1) as f32;
            for x in 0..w {
                let mut sum = 0.0;
                for yy in lo..=hi {
                    sum += scratch[yy * w + x];
                }
                dst[y * w + x] = sum / count;
            }
        }
    }
}
