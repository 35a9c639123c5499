use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, vec2};

use crate::bubbles::profile::LayoutProfile;
use crate::bubbles::risk::{RiskBand, band_position, color_for};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));
}

/// Dashed guide line and label at each band's resting height.
pub(super) fn draw_band_guides(painter: &Painter, rect: Rect, profile: &LayoutProfile) {
    let effective_height = profile.effective_height(rect.height());
    let dash = 6.0;
    let gap = 5.0;

    for band in RiskBand::ALL {
        let (low, _) = band.bounds();
        let y = rect.top() + band_position(low, effective_height, profile);
        let tint = blend_color(
            color_for(low, false).border,
            Color32::from_gray(90),
            0.55,
        );
        let stroke = Stroke::new(1.0, tint.gamma_multiply(0.45));

        let mut x = rect.left();
        while x < rect.right() {
            let end = (x + dash).min(rect.right());
            painter.line_segment([Pos2::new(x, y), Pos2::new(end, y)], stroke);
            x += dash + gap;
        }

        painter.text(
            Pos2::new(rect.left(), y) + vec2(8.0, -4.0),
            Align2::LEFT_BOTTOM,
            band.label(),
            FontId::proportional(11.0),
            tint,
        );
    }
}
