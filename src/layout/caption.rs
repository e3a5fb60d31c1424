/// Fixed leading between consecutive lines of one script block, in px.
pub const LINE_LEADING: f64 = 12.0;

/// Vertical placement of one bilingual caption.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionLayout {
    /// Top of the first primary-script line.
    pub primary_y: f64,
    /// Top of the first secondary-script line.
    pub secondary_y: f64,
    /// Height of both blocks plus the gap.
    pub total_height: f64,
}

/// Height of a block of `lines` lines at `font_size`. Empty blocks have zero height.
pub fn block_height(lines: usize, font_size: f64) -> f64 {
    if lines == 0 {
        return 0.0;
    }
    lines as f64 * (font_size + LINE_LEADING) - LINE_LEADING
}

/// Place the primary block at `position_y_percent` of the container and the secondary block
/// directly below it, separated by `gap_px`.
///
/// The secondary block always starts at or below the end of the primary block for non-negative
/// inputs.
pub fn compute_layout(
    container_height: f64,
    position_y_percent: f64,
    primary_font_size: f64,
    primary_line_count: usize,
    secondary_font_size: f64,
    secondary_line_count: usize,
    gap_px: f64,
) -> CaptionLayout {
    let primary_h = block_height(primary_line_count, primary_font_size).max(0.0);
    let secondary_h = block_height(secondary_line_count, secondary_font_size).max(0.0);
    let gap = gap_px.max(0.0);

    let primary_y = (container_height * position_y_percent / 100.0).round();
    CaptionLayout {
        primary_y,
        secondary_y: primary_y + primary_h + gap,
        total_height: primary_h + gap + secondary_h,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/caption.rs"]
mod tests;
