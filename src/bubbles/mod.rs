pub mod engine;
pub mod interaction;
pub mod prepare;
pub mod profile;
pub mod risk;
pub mod tracker;

use eframe::egui::{Vec2, vec2};

/// Size of the plotting surface in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }
}

fn clamp_axis(value: f32, radius: f32, extent: f32) -> f32 {
    if !value.is_finite() || extent <= radius * 2.0 {
        return extent * 0.5;
    }
    value.clamp(radius, extent - radius)
}

/// Keeps a circle of `radius` fully inside the container.
pub fn clamp_to_container(position: Vec2, radius: f32, container: ContainerSize) -> Vec2 {
    vec2(
        clamp_axis(position.x, radius, container.width),
        clamp_axis(position.y, radius, container.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_containers_are_detected() {
        assert!(ContainerSize::new(800.0, 600.0).is_usable());
        assert!(!ContainerSize::new(0.0, 600.0).is_usable());
        assert!(!ContainerSize::new(800.0, 0.0).is_usable());
        assert!(!ContainerSize::new(f32::NAN, 600.0).is_usable());
    }

    #[test]
    fn clamping_keeps_circles_inside() {
        let container = ContainerSize::new(400.0, 300.0);
        assert_eq!(
            clamp_to_container(vec2(-50.0, 900.0), 20.0, container),
            vec2(20.0, 280.0)
        );
        assert_eq!(
            clamp_to_container(vec2(200.0, 150.0), 20.0, container),
            vec2(200.0, 150.0)
        );
        assert_eq!(
            clamp_to_container(vec2(f32::NAN, 10.0), 200.0, container),
            vec2(200.0, 150.0)
        );
    }
}
